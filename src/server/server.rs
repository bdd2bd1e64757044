use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::credential::Credential;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::credentials::CredentialsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub credentials_state: CredentialsState,
}

impl AppState {
    pub fn new(metrics: &Metrics, credential: Credential) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            credentials_state: CredentialsState::new(credential),
        }
    }
}

/// Router with the credentials route and, when enabled, the metrics route.
pub async fn build_router(settings_config: &SettingsConfig, credential: Credential) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, credential);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.credentials_state.router(&settings_config.server.credentials_path))
        .with_state(state)
}

/// Start one Axum server for the resolved credentials and metrics.
pub async fn start(settings_config: &SettingsConfig, credential: Credential) -> Result<()> {
    let app = build_router(settings_config, credential).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("unable to bind {}", bind_addr))?;
    info!(address = %bind_addr, "serving credentials");

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;
    metrics.up.set(0);
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        // no signal handler, run until killed
        Err(_) => std::future::pending::<()>().await,
    }
}
