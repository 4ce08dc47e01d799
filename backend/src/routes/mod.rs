//! Route definitions for the POS Retail Suite backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - store reference data
        .nest("/stores", store_routes())
        // Protected routes - count sessions
        .nest("/counts", count_routes())
        // Protected routes - catalog search
        .nest("/variants", variant_routes())
}

/// Store reference routes (protected)
fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stores))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Count session routes (protected)
fn count_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/:session_id", get(handlers::get_session))
        .route("/:session_id/scan", post(handlers::scan))
        .route("/:session_id/lines", put(handlers::set_quantity))
        .route("/:session_id/finalize", post(handlers::finalize_session))
        .route("/:session_id/ledger", get(handlers::session_ledger))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Catalog variant routes (protected)
fn variant_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::search_variants))
        .route_layer(middleware::from_fn(auth_middleware))
}
