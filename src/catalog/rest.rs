//! DataHub GMS REST catalog
//!
//! Each mutation becomes one `ingestProposal` call carrying a JSON-Patch
//! document, so the server merges into existing aspects instead of
//! replacing them.

use super::{CatalogMutation, CatalogSink};
use crate::config::CatalogConfig;
use crate::error::{GovernError, Result};
use crate::retry::{retry_after, with_retry, AttemptOutcome, RetryConfig};
use async_trait::async_trait;
use std::time::Duration;

const RESTLI_PROTOCOL_HEADER: &str = "X-RestLi-Protocol-Version";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Catalog sink backed by the DataHub GMS REST API
pub struct RestCatalog {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    retry: RetryConfig,
}

impl RestCatalog {
    /// Build a client for the configured GMS endpoint
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.gms_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            retry: config.retry.clone(),
        })
    }

    /// GMS base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ingest_url(&self) -> String {
        format!("{}/aspects?action=ingestProposal", self.base_url)
    }

    /// Request body for one mutation
    pub fn proposal(mutation: &CatalogMutation) -> Result<serde_json::Value> {
        let patch = serde_json::to_string(&mutation.patch_ops())?;
        Ok(serde_json::json!({
            "proposal": {
                "entityType": "dataset",
                "entityUrn": mutation.entity_urn(),
                "changeType": "PATCH",
                "aspectName": mutation.aspect_name(),
                "aspect": {
                    "contentType": PATCH_CONTENT_TYPE,
                    "value": patch,
                },
            }
        }))
    }

    async fn attempt(&self, body: &serde_json::Value, urn: &str) -> AttemptOutcome<()> {
        let mut request = self
            .client
            .post(self.ingest_url())
            .header(RESTLI_PROTOCOL_HEADER, RESTLI_PROTOCOL_VERSION)
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return AttemptOutcome::Retryable {
                    error: e.into(),
                    retry_after: None,
                }
            }
            Err(e) => return AttemptOutcome::Fatal(e.into()),
        };

        let status = response.status();
        if status.is_success() {
            return AttemptOutcome::Success(());
        }

        let retry_after = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        let error = GovernError::Catalog {
            urn: urn.to_string(),
            status: status.as_u16(),
            body,
        };

        if self.retry.is_retryable_status(status) {
            AttemptOutcome::Retryable { error, retry_after }
        } else {
            AttemptOutcome::Fatal(error)
        }
    }
}

#[async_trait]
impl CatalogSink for RestCatalog {
    async fn apply(&self, mutation: &CatalogMutation) -> Result<()> {
        let body = Self::proposal(mutation)?;
        let body = &body;
        let urn = mutation.entity_urn();

        with_retry(&self.retry, move |_| self.attempt(body, urn)).await?;

        tracing::debug!(
            urn = %urn,
            aspect = mutation.aspect_name(),
            "Catalog mutation accepted"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "datahub-rest"
    }

    async fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}
