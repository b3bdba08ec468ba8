use anyhow::Result;
use clap::Parser;
use directive_studio::authoring::AuthoringService;
use directive_studio::cli::{self, Cli};
use directive_studio::config::DirectivesConfig;
use directive_studio::paths::{self, DirectivePaths};
use directive_studio::structured_logger::StructuredLogger;
use std::sync::Arc;
use uuid::Uuid;

/// Diagnostics go to stderr; `RUST_LOG` wins over the configured level.
fn init_tracing(fallback_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_config = paths::default_config_path().ok();
    let config = DirectivesConfig::resolve(cli.config.as_deref(), default_config.as_deref())?;
    init_tracing(&config.log_level);

    let root = match cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        Some(root) => root,
        None => paths::home_root()?,
    };
    let paths = DirectivePaths::new(root);
    tracing::debug!("Using storage root {}", paths.root().display());

    let mut service = AuthoringService::open(&paths, &config)?;
    let session_id = Uuid::new_v4().to_string();
    match StructuredLogger::new(&session_id, &paths.logs_dir()) {
        Ok(logger) => service = service.with_logger(Arc::new(logger)),
        Err(e) => tracing::warn!("Structured logging disabled: {}", e),
    }

    cli::run(cli.command, &service, cli.json).await
}
