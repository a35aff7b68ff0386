//! Ticket pool simulation console.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use ticket_pool_runtime::metrics::MetricsServer;
use ticket_pool_runtime::{JsonFileSink, RandomBatches, SimulationController};
use ticketing::config::DEFAULT_LOG_FILTER;
use ticketing::{AppConfig, ConfigStore, Prompter, configure, run_menu};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(run());

    // A pending stdin read holds a blocking thread until the next line.
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = AppConfig::from_env();
    info!(
        config = %app.config_path.display(),
        transactions = %app.transactions_path.display(),
        "Starting ticketing simulation"
    );

    let mut metrics = app.metrics_addr.map(MetricsServer::new);
    if let Some(server) = metrics.as_mut() {
        if let Err(error) = server.start() {
            warn!(error = %error, "Metrics disabled");
        }
    }

    let mut prompter = Prompter::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let store = ConfigStore::new(&app.config_path);
    let config = configure(&mut prompter, &store)
        .await
        .context("configuration aborted")?;

    let mut controller = SimulationController::new(
        config,
        Arc::new(JsonFileSink::new(&app.transactions_path)),
        Arc::new(RandomBatches),
    )
    .context("invalid simulation configuration")?;

    run_menu(&mut prompter, &mut controller, shutdown_signal()).await?;

    info!("Goodbye");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
}
