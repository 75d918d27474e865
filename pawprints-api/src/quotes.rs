use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pawprints_shared::VendorQuoteResponse;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/webhooks/vendor-quotes/{job_id}", post(receive_vendor_quote))
        .route("/v1/vendor-quotes/{job_id}", get(get_vendor_quote))
}

/// POST /v1/webhooks/vendor-quotes/{job_id}
/// Receive the vendor's per-material costs once the model is uploaded
pub async fn receive_vendor_quote(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(payload): Json<VendorQuoteResponse>,
) -> StatusCode {
    tracing::info!("Received vendor quote webhook for job {}", job_id);
    state.quotes.publish(&job_id, payload).await;
    StatusCode::ACCEPTED
}

/// GET /v1/vendor-quotes/{job_id}
pub async fn get_vendor_quote(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<VendorQuoteResponse> {
    Json(state.quotes.get(&job_id).await)
}
