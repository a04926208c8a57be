use anyhow::Result;
use pid_analyzer::{config, server};
use tracing::info;

/// Validates a log filter, either a bare level or `target=level` directives
fn validate_log_level(level: &str) -> Result<()> {
    tracing_subscriber::EnvFilter::try_new(level).map_err(|e| {
        anyhow::anyhow!(
            "Invalid log level: '{}' ({}). Use a level such as info or directives such as pid_analyzer=debug",
            level,
            e
        )
    })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration (and the API key) must be in place before anything is served
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG overrides the configured level
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting P&ID analyzer with log level: {}", log_level);
    info!(
        "Using model {} via {}",
        config.llm.model, config.llm.provider
    );

    server::run(config).await?;

    Ok(())
}
