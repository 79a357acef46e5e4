use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogSink, RestCatalog};
use crate::config::GovernConfig;
use crate::detector::RegexDetector;
use crate::error::Result;
use crate::extract::TextExtractor;
use crate::pipeline::{DocumentOutcome, Pipeline, RunReport};
use crate::storage::JsonlVectorStore;

/// Execute the `run` command: process the whole data directory.
///
/// Ctrl-C stops new documents from starting; documents already in
/// flight finish normally.
pub async fn execute(config: &GovernConfig, report_path: Option<&Path>) -> Result<RunReport> {
    let catalog = Arc::new(RestCatalog::new(&config.catalog)?);
    match catalog.health().await {
        Ok(true) => {}
        Ok(false) | Err(_) => tracing::warn!(
            gms_url = %catalog.base_url(),
            "Catalog health check failed, emission errors are likely"
        ),
    }

    let pipeline = Pipeline::new(
        config,
        Arc::new(RegexDetector::new()?),
        Arc::new(TextExtractor::new()),
        Arc::new(JsonlVectorStore::new(&config.storage.path)),
        catalog,
    );

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing in-flight documents");
                cancel.cancel();
            }
        })
    };

    let report = pipeline
        .run_dir(&config.data_dir, &config.normalized_extensions(), cancel)
        .await;
    watcher.abort();
    let report = report?;

    print_report(&report);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json).await?;
        println!("\nReport written to {}", path.display());
    }

    Ok(report)
}

fn print_report(report: &RunReport) {
    if report.documents.is_empty() {
        println!("No documents found.");
        return;
    }

    println!("{:<40} {:<8} {:<20} ENTITIES", "DOCUMENT", "ROUTE", "OUTCOME");
    for doc in &report.documents {
        let route = doc
            .destination
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let outcome = match &doc.outcome {
            DocumentOutcome::Done => "done".to_string(),
            DocumentOutcome::Skipped { reason } => format!("skipped ({})", reason),
            DocumentOutcome::Failed { stage, .. } => format!("failed ({:?})", stage),
            DocumentOutcome::PartiallyGoverned { failed_steps } => {
                format!("partial ({} step(s))", failed_steps.len())
            }
        };
        let entities: Vec<&str> = doc.entity_types.iter().map(|e| e.as_str()).collect();
        println!(
            "{:<40} {:<8} {:<20} {}",
            doc.rel_path,
            route,
            outcome,
            entities.join(", ")
        );
    }

    let s = &report.summary;
    println!(
        "\n{} document(s): {} done, {} skipped, {} failed, {} partially governed ({} secure, {} public)",
        s.total, s.done, s.skipped, s.failed, s.partially_governed, s.routed_secure, s.routed_public
    );
}
