use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub mod compounds;
pub mod health;
pub mod visualization;

#[cfg(test)]
mod fixture;

/// Root router with every endpoint, CORS and request tracing.
pub fn router(state: AppState) -> Router {
    // The dashboard is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/compounds", get(compounds::list_compounds))
        .route("/api/compounds/:chembl_id", get(compounds::get_compound))
        .route("/api/visualization-data", get(visualization::get_visualization_data))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
