mod bootstrap;
mod health;
mod orders;

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use kunan_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

fn init_logging(config: &AppConfig) {
    use kunan_core::config::LogFormat::*;
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

fn app_router(app: &bootstrap::Application) -> Router {
    let orders_state = orders::OrdersState::new(app.agent_runtime.clone(), app.orders.clone());
    let health_state =
        health::HealthState::new(app.config.integration_status(), app.config.storage.backend);

    orders::router(orders_state)
        .merge(health::router(health_state))
        .layer(TraceLayer::new_for_http())
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config);
    let address = app.config.server_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "kunan-server listening"
    );

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, app_router(&app)).with_graceful_shutdown(async move {
        wait_for_shutdown().await;
        let _ = stop_tx.send(true);
    });

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let drain_deadline = async move {
        if stop_rx.changed().await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server.into_future() => result.context("http server terminated unexpectedly")?,
        () = drain_deadline => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish before the shutdown deadline"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "kunan-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
