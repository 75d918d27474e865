use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pawprints_core::CoreError;
use pawprints_order::OrderError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
}

impl AppError {
    pub fn core(err: CoreError) -> Self {
        match err {
            CoreError::UnknownMaterial(_) => AppError::NotFoundError(err.to_string()),
            CoreError::SelectionLocked(_) | CoreError::PriceNotReady(_) => {
                AppError::ConflictError(err.to_string())
            }
        }
    }

    pub fn order(err: OrderError) -> Self {
        match err {
            OrderError::InvalidPrice(_) => AppError::ValidationError(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg)
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
