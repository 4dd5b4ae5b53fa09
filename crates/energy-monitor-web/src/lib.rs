// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Energy Monitor.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

pub mod api;
pub mod error;

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use energy_monitor_core::constants::{
    ENDPOINT_ENTITIES, ENDPOINT_HISTORY, ENDPOINT_STATE, ENDPOINT_VALIDATE,
};
use energy_monitor_core::{ApiSettings, HistoryRecorder, StateRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::ApiError;

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn StateRegistry>,
    /// `None` when no recorder is configured; history requests then fail with 503
    pub recorder: Option<Arc<dyn HistoryRecorder>>,
    pub settings: Arc<ApiSettings>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry.name())
            .field("recorder", &self.recorder.as_ref().map(|r| r.name()))
            .field("settings", &self.settings)
            .finish()
    }
}

/// Build the router with all endpoints
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route(ENDPOINT_ENTITIES, get(api::entities_handler))
        .route(ENDPOINT_STATE, get(api::state_handler))
        .route(ENDPOINT_HISTORY, get(api::history_handler))
        .route(ENDPOINT_VALIDATE, get(api::validate_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Allow HA Ingress
        .with_state(app_state)
}

/// Start the web server
///
/// # Errors
/// Returns error if server fails to bind or serve
pub async fn start_web_server(app_state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Starting web server on {}", listener.local_addr()?);
    info!("📊 Entities: http://{}{}", addr, ENDPOINT_ENTITIES);

    axum::serve(listener, app).await
}

/// Health check endpoint
async fn health_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    if app_state.registry.is_healthy().await {
        (StatusCode::OK, "OK")
    } else {
        warn!("Health check: {} is not answering", app_state.registry.name());
        (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED")
    }
}
