//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::loader::SourceReport;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    /// Sources that fell back to their placeholder.
    pub degraded: usize,
    pub sources: Vec<SourceReport>,
}

/// Liveness probe: the process is up.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe with the per-source load report.
///
/// The dashboard serves placeholders for missing files, so a degraded source
/// does not make the service unready.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let sources = state.data.report.clone();
    let degraded = sources.iter().filter(|r| r.is_placeholder()).count();
    if degraded > 0 {
        tracing::debug!(degraded, "Serving with placeholder data");
    }

    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        degraded,
        sources,
    })
}
