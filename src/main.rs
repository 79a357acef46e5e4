use clap::Parser;
use tracing_subscriber::EnvFilter;

use a3s_govern::cli::{Cli, Commands};
use a3s_govern::GovernConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = GovernConfig::load(cli.config.as_deref())?.with_env_overrides(std::env::vars());

    match cli.command {
        Commands::Run {
            data_dir,
            concurrency,
            report,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(n) = concurrency {
                config.concurrency = n;
            }
            config.validate()?;
            a3s_govern::cli::run::execute(&config, report.as_deref()).await?;
        }
        Commands::Scan { file } => {
            config.validate()?;
            a3s_govern::cli::scan::execute(&config, &file).await?;
        }
    }

    Ok(())
}
