use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber;

use tollbooth::admission::{AdmissionGate, BucketPolicy, ClientRegistry, Sweeper};
use tollbooth::config::TollboothConfig;
use tollbooth::http::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "tollbooth")]
#[command(about = "Per-client request admission service for HTTP APIs")]
struct Args {
    /// Path to a YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Tollbooth Request Admission Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration
    let config = match args.config {
        Some(path) => TollboothConfig::from_file(&path)?,
        None => TollboothConfig::default(),
    };
    info!(
        listen_addr = %config.server.listen_addr,
        refill_rate = config.admission.refill_rate,
        burst_capacity = config.admission.burst_capacity,
        "Configuration loaded"
    );

    // Build the registry and admission gate
    let registry = Arc::new(ClientRegistry::new());
    let policy = BucketPolicy {
        refill_rate: config.admission.refill_rate,
        burst_capacity: config.admission.burst_capacity as f64,
    };
    let gate = Arc::new(AdmissionGate::new(Arc::clone(&registry), policy));
    info!("Admission gate initialized");

    // One shutdown signal fans out to the server and the sweeper.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // Start the background eviction sweep
    let sweeper = Sweeper::new(
        Arc::clone(&registry),
        Duration::from_secs(config.admission.idle_timeout_secs),
        Duration::from_secs(config.admission.sweep_interval_secs),
    );
    let mut sweeper_shutdown = shutdown_rx.clone();
    let sweeper_handle = tokio::spawn(sweeper.run_with_shutdown(async move {
        let _ = sweeper_shutdown.changed().await;
    }));

    // Run the HTTP server until shutdown
    let server = HttpServer::new(config.server.listen_addr, gate);
    let mut server_shutdown = shutdown_rx;
    server
        .serve_with_shutdown(async move {
            let _ = server_shutdown.changed().await;
        })
        .await?;

    sweeper_handle.await?;
    info!("Tollbooth Request Admission Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
