//! Activity Feed Main Entry Point
//!
//! Replays a JSON-lines file of activity events (or stdin) against an
//! in-memory activity service and prints one result line per event.

use activity_feed::config::DEFAULT_LOG_FILTER;
use activity_feed::{Dependencies, FeedConfig, LogFormat, ReplayError};
use dotenv::dotenv;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging. Logs go to stderr; stdout carries results.
fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr)
                        .pretty(),
                )
                .init();
        }
    }

    info!(
        service_name = "activity-feed",
        service_version = env!("CARGO_PKG_VERSION"),
        ?format,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), ReplayError> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = FeedConfig::from_env()?;
    init_tracing(config.log_format);

    info!(events_path = ?config.events_path, "Starting activity feed replay");

    let deps = Dependencies::new(&config);
    let mut stdout = tokio::io::stdout();

    let result = match &config.events_path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                error!(path = %path.display(), error = %e, "Failed to open events file");
                e
            })?;
            deps.replayer.run(BufReader::new(file), &mut stdout).await
        }
        None => {
            deps.replayer
                .run(BufReader::new(tokio::io::stdin()), &mut stdout)
                .await
        }
    };

    let stats = deps.store.stats().await;
    match result {
        Ok(summary) => {
            info!(
                applied = summary.applied,
                rejected = summary.rejected,
                reads = summary.reads,
                entities = stats.entity_count,
                stream_items = stats.stream_item_count,
                follows = stats.follow_count,
                "Activity feed replay completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Activity feed replay failed");
            Err(e)
        }
    }
}
