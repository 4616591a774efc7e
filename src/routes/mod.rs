//! Route definitions for the dashboard API.

pub mod dashboard;
pub mod health;

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderValue, Method, Uri},
    routing::get,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::errors::AppError;
use crate::AppState;

/// Query-string controls of a section. Unknown enum values are a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct Selection<T>(pub T);

/// Build the full application router with middleware layers.
pub fn router(state: AppState) -> Router {
    let cors = match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET]),
        Err(e) => {
            tracing::warn!(error = %e, url = %state.config.frontend_url, "Invalid FRONTEND_URL, CORS disabled");
            CorsLayer::new()
        }
    };

    let api_routes = Router::new()
        .route("/controls", get(dashboard::controls))
        .route("/kpis", get(dashboard::kpis))
        .route("/cpn", get(dashboard::cpn))
        .route("/categoria", get(dashboard::category))
        .route("/semaforo", get(dashboard::semaforo))
        .route("/violencia", get(dashboard::violence))
        .route("/violencia/mapa", get(dashboard::violence_map))
        .route("/gestantes", get(dashboard::pregnant_women))
        .route("/sifilis", get(dashboard::syphilis));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api_routes)
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}
