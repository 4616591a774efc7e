pub mod config;
pub mod errors;
pub mod loader;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use loader::Dataset;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub data: Arc<Dataset>,
    pub config: config::AppConfig,
}
