use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vocal_consensus::{api::start_server, Config, VocalAnalyzer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    info!("Vocal Consensus - API Server");
    info!("Port: {}", config.port);
    info!(
        model = %config.oracle.model,
        timeout_secs = config.oracle.timeout.as_secs(),
        max_upload_bytes = config.max_upload_bytes,
        "Oracle configured"
    );

    let analyzer = Arc::new(VocalAnalyzer::from_config(&config)?);

    info!("Analyzer initialized");
    info!("Starting API server...");

    start_server(analyzer, config.port, config.max_upload_bytes).await?;

    Ok(())
}
