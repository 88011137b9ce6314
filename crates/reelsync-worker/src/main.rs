//! ReelSync binary: one OneDrive to YouTube transfer run.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelsync_worker::{Action, ActionLog, Pipeline, PipelineConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting reelsync");

    let config = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            ActionLog::from_env().record(Action::Error, &format!("Error: {}", e));
            std::process::exit(1);
        }
    };

    let pipeline = match Pipeline::new(config) {
        Ok(p) => p,
        Err(e) => {
            ActionLog::from_env().record(Action::Error, &format!("Error: {}", e));
            std::process::exit(1);
        }
    };

    // The pipeline has already recorded the failure in the action log.
    if let Err(e) = pipeline.run().await {
        error!(fatal = e.is_fatal(), "Run aborted");
        std::process::exit(1);
    }

    info!("reelsync finished");
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reelsync=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()?;
    }

    Ok(())
}
