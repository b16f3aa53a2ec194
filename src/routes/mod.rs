use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id_middleware, trace_span};

pub mod context;
pub mod recommendations;
pub mod search;
pub mod state;

pub use state::{AppState, PipelineSettings};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(trace_span))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search))
        .route("/query", get(search::snapshot).put(search::input))
        .route("/query/dismiss", post(search::dismiss))
        .route("/query/show", post(search::show))
        .route(
            "/context",
            get(context::list).post(context::add).delete(context::clear),
        )
        .route("/context/:sku", delete(context::remove))
        .route("/recommendations", get(recommendations::current))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
