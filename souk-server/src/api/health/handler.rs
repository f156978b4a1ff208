//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{ok, AppResponse};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
}

/// GET /api/health
pub async fn health(State(state): State<ServerState>) -> Json<AppResponse<HealthStatus>> {
    ok(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
    })
}
