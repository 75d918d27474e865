use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use pawprints_catalog::{MaterialSpec, SizeCheck};
use pawprints_core::PollOutcome;
use pawprints_shared::{PriceQuote, VendorQuoteSet};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/materials", get(list_materials))
        .route("/v1/sizes/validate", post(validate_size))
        .route("/v1/prices", post(quote_price))
        .route("/v1/prices/keyring", get(keyring_price))
}

#[derive(Debug, Deserialize)]
pub struct SizeRequest {
    pub material_id: String,
    pub height_mm: f64,
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub material_id: String,
    pub height_mm: f64,
    pub finish: String,
    /// Generation job whose vendor quotes should replace the estimate
    pub job_id: Option<String>,
    /// Hold the response until the vendor answers or the poll policy gives up
    #[serde(default)]
    pub wait_for_vendor: bool,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub quote: PriceQuote,
    /// e.g. `$52.33 AUD (est.)`
    pub label: String,
    pub size: SizeCheck,
}

/// GET /v1/materials
pub async fn list_materials(State(state): State<AppState>) -> Json<Vec<MaterialSpec>> {
    Json(state.engine.catalog().iter().cloned().collect())
}

/// POST /v1/sizes/validate
pub async fn validate_size(
    State(state): State<AppState>,
    Json(payload): Json<SizeRequest>,
) -> Json<SizeCheck> {
    Json(state.engine.validate_size(&payload.material_id, payload.height_mm))
}

/// Quotes already on the board for a job, or, when `wait` is set, whatever
/// the poller collects before it gives up
pub(crate) async fn vendor_quotes(
    state: &AppState,
    job_id: Option<&str>,
    wait: bool,
) -> Option<VendorQuoteSet> {
    let job_id = job_id?;
    if let Some(quotes) = state.quotes.quote_set(job_id).await {
        return Some(quotes);
    }
    if !wait {
        return None;
    }

    // A dropped request drops the poll with it
    let (_cancel, cancel_rx) = watch::channel(false);
    match state.poller.poll(job_id, cancel_rx).await {
        PollOutcome::Ready(quotes) => Some(quotes),
        PollOutcome::Exhausted | PollOutcome::Cancelled => None,
    }
}

/// POST /v1/prices
/// Estimate, or vendor-backed price when the job has been quoted
pub async fn quote_price(
    State(state): State<AppState>,
    Json(payload): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, AppError> {
    let quotes = vendor_quotes(&state, payload.job_id.as_deref(), payload.wait_for_vendor).await;

    let quote = state
        .engine
        .price_with_vendor_quotes(&payload.material_id, payload.height_mm, &payload.finish, quotes.as_ref())
        .ok_or_else(|| AppError::NotFoundError(format!("Unknown material: {}", payload.material_id)))?;

    tracing::debug!(
        "Priced {} at {}mm ({:?}): {}",
        payload.material_id,
        payload.height_mm,
        quote.source,
        quote.display_total()
    );

    Ok(Json(PriceResponse {
        label: quote.display_label(),
        size: state.engine.validate_size(&payload.material_id, payload.height_mm),
        quote,
    }))
}

/// GET /v1/prices/keyring
pub async fn keyring_price(State(state): State<AppState>) -> Json<PriceResponse> {
    let fixed = state.engine.fixed_product();
    let quote = state.engine.calculate_fixed_price();
    Json(PriceResponse {
        label: quote.display_label(),
        size: state.engine.validate_size(&fixed.material_id, fixed.height_mm),
        quote,
    })
}
