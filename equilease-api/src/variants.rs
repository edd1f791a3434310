use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Json, Router,
};
use futures_util::Stream;
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use uuid::Uuid;

use equilease_catalog::{
    AttributeSet, BasePrices, CatalogProduct, Combination, PricedCombination,
    VariantPrices,
};
use equilease_variants::GenerationReport;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CombinationsResponse {
    pub count: usize,
    pub combinations: Vec<Combination>,
}

impl From<Vec<Combination>> for CombinationsResponse {
    fn from(combinations: Vec<Combination>) -> Self {
        Self {
            count: combinations.len(),
            combinations,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub attributes: Combination,
    pub price: f64,
    pub purchase_price: f64,
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
}

/// Base prices come from free-text form fields: numbers and numeric strings
/// are both accepted, anything else fails validation as "not a number".
#[derive(Debug, Deserialize)]
pub struct GenerateVariantsRequest {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub purchase_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
}

impl From<GenerateVariantsRequest> for BasePrices {
    fn from(req: GenerateVariantsRequest) -> Self {
        BasePrices {
            price: req.price,
            purchase_price: req.purchase_price,
            monthly_price: req.monthly_price,
            stock: req.stock,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateVariantsResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: GenerationReport,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub product_id: Option<Uuid>,
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s.trim().replace(',', ".").parse().unwrap_or(f64::NAN)),
        Some(_) => Some(f64::NAN),
    })
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/combinations/enumerate", post(enumerate_combinations))
        .route("/v1/products/{product_id}/attributes", put(set_attributes))
        .route("/v1/products/{product_id}/combinations", get(product_combinations))
        .route("/v1/products/{product_id}/variants", get(list_variants).post(create_variant))
        .route("/v1/products/{product_id}/variants/generate", post(generate_variants))
        .route("/v1/variants/events", get(variant_events))
}

/// POST /v1/combinations/enumerate
/// Cartesian product of an ad-hoc attribute set
pub async fn enumerate_combinations(
    State(state): State<AppState>,
    Json(attributes): Json<AttributeSet>,
) -> Result<Json<CombinationsResponse>, AppError> {
    let combinations = state.variants.enumerate(&attributes)?;
    Ok(Json(combinations.into()))
}

/// PUT /v1/products/:product_id/attributes
pub async fn set_attributes(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(attributes): Json<AttributeSet>,
) -> Result<Json<CatalogProduct>, AppError> {
    let product = state.variants.set_attributes(product_id, attributes).await?;
    Ok(Json(product))
}

/// GET /v1/products/:product_id/combinations
pub async fn product_combinations(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CombinationsResponse>, AppError> {
    let combinations = state.variants.combinations(product_id).await?;
    Ok(Json(combinations.into()))
}

/// GET /v1/products/:product_id/variants
pub async fn list_variants(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<PricedCombination>>, AppError> {
    let variants = state.variants.list(product_id).await?;
    Ok(Json(variants))
}

/// POST /v1/products/:product_id/variants
/// Manual entry of a single priced combination
pub async fn create_variant(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<PricedCombination>), AppError> {
    let prices = VariantPrices {
        price: req.price,
        purchase_price: req.purchase_price,
        monthly_price: req.monthly_price,
        stock: req.stock,
    };

    let variant = state
        .variants
        .create_single(product_id, req.attributes, prices)
        .await?;

    Ok((StatusCode::CREATED, Json(variant)))
}

/// POST /v1/products/:product_id/variants/generate
/// Create every missing combination with perturbed base prices
pub async fn generate_variants(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<GenerateVariantsRequest>,
) -> Result<Json<GenerateVariantsResponse>, AppError> {
    let base = BasePrices::from(req);
    let report = state.variants.generate(product_id, &base).await?;

    Ok(Json(GenerateVariantsResponse {
        message: report.summary(),
        report,
    }))
}

/// GET /v1/variants/events
/// Server-sent progress of bulk generation runs, optionally for one product
pub async fn variant_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let rx = state
        .events
        .subscribe()
        .ok_or_else(|| AppError::NotFoundError("Progress events are disabled".to_string()))?;

    let product_filter = query.product_id;
    let stream = BroadcastStream::new(rx).filter_map(move |message| {
        // lagged receivers just miss events
        let event = message.ok()?;
        if let Some(product_id) = product_filter {
            if event.product_id() != product_id {
                return None;
            }
        }
        Event::default()
            .event(event.name())
            .json_data(&event)
            .ok()
            .map(Ok::<_, Infallible>)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
