//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, purge_handler, set_handler, ttl_handler,
    AppState,
};
use crate::transport::Transport;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router<T: Transport>(state: AppState<T>) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler::<T>))
        .route("/get/:key", get(get_handler::<T>))
        .route("/del/:key", delete(delete_handler::<T>))
        .route("/purge", post(purge_handler::<T>))
        .route("/ttl/:key", get(ttl_handler::<T>))
        .route("/health", get(health_handler::<T>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
