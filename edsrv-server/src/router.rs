//! Request routing for the edit-server endpoints

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use edsrv_core::Editor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Status path
pub const STATUS_PATH: &str = "/status";
/// Root path, where edit requests are sent
pub const ROOT_PATH: &str = "/";

/// Largest request body accepted for editing (4 MiB)
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<dyn Editor>,
}

/// Build the router for the application endpoints
pub fn router(editor: Arc<dyn Editor>) -> Router {
    Router::new()
        .route(STATUS_PATH, get(handlers::status))
        .route(ROOT_PATH, post(handlers::edit))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { editor })
}
