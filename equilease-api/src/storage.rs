use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct BucketStatus {
    pub name: String,
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct BucketCacheResponse {
    pub cached: Vec<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/storage/buckets/{name}", get(bucket_status))
        .route("/v1/storage/cache", get(cached_buckets))
        .route("/v1/storage/cache/reset", post(reset_cache))
}

/// GET /v1/storage/buckets/:name
pub async fn bucket_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BucketStatus>, AppError> {
    let exists = state.buckets.exists(&name).await?;
    Ok(Json(BucketStatus { name, exists }))
}

/// GET /v1/storage/cache
pub async fn cached_buckets(State(state): State<AppState>) -> Json<BucketCacheResponse> {
    Json(BucketCacheResponse {
        cached: state.buckets.cached().await,
    })
}

/// POST /v1/storage/cache/reset
pub async fn reset_cache(State(state): State<AppState>) -> Json<BucketCacheResponse> {
    state.buckets.reset().await;
    Json(BucketCacheResponse { cached: Vec::new() })
}
