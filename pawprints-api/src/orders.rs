use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pawprints_core::{Checkout, ProductLine, Selection};
use pawprints_order::OrderRecord;
use serde::Deserialize;

use crate::error::AppError;
use crate::pricing::vendor_quotes;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/{order_id}", get(get_order))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product: ProductLine,
    pub material_id: Option<String>,
    pub height_mm: Option<f64>,
    pub finish: Option<String>,
    pub color: Option<String>,
    pub job_id: Option<String>,
}

impl CreateOrderRequest {
    /// Keyrings ignore any material, size or finish sent by the client
    fn into_selection(self, state: &AppState) -> Result<Selection, AppError> {
        match self.product {
            ProductLine::Keyring => {
                let fixed = state.engine.fixed_product();
                let finish = state
                    .engine
                    .material(&fixed.material_id)
                    .and_then(|m| m.default_finish())
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                Ok(Selection {
                    product: ProductLine::Keyring,
                    material_id: fixed.material_id.clone(),
                    height_mm: fixed.height_mm,
                    finish,
                    color: self.color,
                })
            }
            ProductLine::Statue => {
                let material_id = self
                    .material_id
                    .ok_or_else(|| AppError::ValidationError("material_id is required".to_string()))?;
                let height_mm = self
                    .height_mm
                    .ok_or_else(|| AppError::ValidationError("height_mm is required".to_string()))?;
                let finish = self
                    .finish
                    .ok_or_else(|| AppError::ValidationError("finish is required".to_string()))?;

                let check = state.engine.validate_size(&material_id, height_mm);
                if !check.valid {
                    return Err(AppError::ValidationError(check.message.unwrap_or_default()));
                }

                Ok(Selection {
                    product: ProductLine::Statue,
                    material_id,
                    height_mm,
                    finish,
                    color: self.color,
                })
            }
        }
    }
}

/// POST /v1/orders
/// Simulated checkout: prices the selection and records it as processing
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderRecord>), AppError> {
    let quotes = vendor_quotes(&state, payload.job_id.as_deref(), false).await;
    let selection = payload.into_selection(&state)?;

    let checkout = Checkout::new(&state.engine, selection, quotes.as_ref()).map_err(AppError::core)?;
    let order = state
        .orders
        .write()
        .await
        .place_order(&checkout)
        .map_err(AppError::order)?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/orders
/// Order history, newest first
pub async fn list_orders(State(state): State<AppState>) -> Json<Vec<OrderRecord>> {
    Json(state.orders.read().await.list_orders())
}

/// GET /v1/orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderRecord>, AppError> {
    state
        .orders
        .read()
        .await
        .get_order(&order_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", order_id)))
}
