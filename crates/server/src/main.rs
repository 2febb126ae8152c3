mod bootstrap;
mod health;
mod routes;

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Result;
use foafrag_core::config::{AppConfig, LoadOptions};
use routes::AppState;

fn init_logging(config: &AppConfig) {
    use foafrag_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let health_state = health::HealthState::new(&app.config, app.store.clone());
    let api_state = AppState {
        pipeline: app.pipeline.clone(),
        store: app.store.clone(),
        sparql: app.sparql.clone(),
    };
    let router = routes::router(api_state).merge(health::router(health_state));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        store_kind = ?app.config.store.kind,
        "foafrag-server started"
    );

    let drain_limit = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    let server_task = tokio::spawn(server.into_future());

    let _ = tokio::signal::ctrl_c().await;
    tracing::info!(event_name = "system.server.stopping", "foafrag-server stopping");
    let _ = shutdown_tx.send(());

    drain_server(server_task, drain_limit).await
}

/// Wait for the serving task to finish, but no longer than the configured
/// drain window. Connections still open after the window are dropped.
async fn drain_server(
    mut server_task: tokio::task::JoinHandle<std::io::Result<()>>,
    drain_limit: Duration,
) -> Result<()> {
    match tokio::time::timeout(drain_limit, &mut server_task).await {
        Ok(joined) => joined??,
        Err(_) => {
            tracing::warn!(
                event_name = "system.server.drain_timed_out",
                drain_secs = drain_limit.as_secs(),
                "connections did not drain in time, aborting"
            );
            server_task.abort();
        }
    }

    Ok(())
}
