use axum::{
    extract::State,
    http::Method,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod state;
pub mod storage;
pub mod variants;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(variants::routes())
        .merge(storage::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness plus a (cached) check that the default bucket is reachable
async fn health(State(state): State<AppState>) -> Json<Value> {
    let storage = match state.buckets.exists(&state.default_bucket).await {
        Ok(exists) => json!({ "bucket": state.default_bucket, "exists": exists }),
        Err(e) => {
            tracing::warn!("Storage check failed: {}", e);
            json!({ "bucket": state.default_bucket, "error": e.to_string() })
        }
    };

    Json(json!({
        "status": "ok",
        "storage": storage,
    }))
}
