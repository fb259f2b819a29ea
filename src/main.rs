use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use myeldom_bridge::{
    api::{self, AppState},
    config::Config,
    eldom::EldomClient,
    projection::ProjectionBoard,
    shutdown,
    telemetry::{
        ReconnectSupervisor, RetryPolicy, SnapshotObserver, TelemetryStore, WsTelemetrySource,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env; env vars may also be set externally
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    let client = EldomClient::new(&config)?;

    // No session, no bridge: nothing is spawned until login succeeds.
    client
        .login(&config.credentials)
        .await
        .context("MyEldom login failed")?;

    // Projected sensors follow every snapshot the store accepts
    let board = ProjectionBoard::new(config.device_ids.iter().cloned());
    let observer: Arc<dyn SnapshotObserver> = Arc::new(board.clone());
    let store = TelemetryStore::with_observers(vec![observer]);

    // One self-healing telemetry subscription per boiler
    let (trigger, stop) = shutdown::channel();
    let policy = RetryPolicy::fixed(config.reconnect_delay());
    let supervisors: Vec<_> = config
        .device_ids
        .iter()
        .map(|device_id| {
            let supervisor = ReconnectSupervisor::new(
                WsTelemetrySource::new(client.clone()),
                device_id.clone(),
                store.clone(),
                policy,
            );
            tokio::spawn(supervisor.run(stop.clone()))
        })
        .collect();

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, devices = config.device_ids.len(), "HTTP server listening");

    let state = AppState {
        client,
        store,
        board,
    };
    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    trigger.trigger();
    for handle in supervisors {
        if let Err(e) = handle.await {
            error!(error = %e, "Telemetry supervisor task failed");
        }
    }
    info!("Bridge stopped");

    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable; only Ctrl+C stops the bridge");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, stopping bridge"),
        _ = terminate => info!("SIGTERM received, stopping bridge"),
    }
}
