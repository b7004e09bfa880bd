use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use piestand_infra::{PurchaseError, RecommendError, ViewError};

pub fn purchase_error_to_response(err: PurchaseError) -> axum::response::Response {
    match err {
        PurchaseError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "pie not found"),
        PurchaseError::Validation(messages) => validation_errors(messages),
        e @ PurchaseError::Gluttony => json_error(StatusCode::TOO_MANY_REQUESTS, "gluttony", e.to_string()),
        e @ PurchaseError::PriceMismatch { .. } => {
            json_error(StatusCode::PAYMENT_REQUIRED, "price_mismatch", e.to_string())
        }
        PurchaseError::Gone(msg) => json_error(StatusCode::GONE, "gone", msg),
        PurchaseError::Store(e) => {
            tracing::error!(error = %e, "store error during purchase");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        e @ PurchaseError::PurchaseFailed => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "purchase_failed", e.to_string())
        }
    }
}

pub fn recommend_error_to_response(err: RecommendError) -> axum::response::Response {
    match err {
        e @ RecommendError::NoRecommendation => {
            json_error(StatusCode::NOT_FOUND, "no_recommendation", e.to_string())
        }
        RecommendError::Store(e) => {
            tracing::error!(error = %e, "store error during recommendation");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn view_error_to_response(err: ViewError) -> axum::response::Response {
    match err {
        ViewError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "pie not found"),
        ViewError::Store(e) => {
            tracing::error!(error = %e, "store error while reading inventory");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn validation_errors(messages: Vec<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "errors": messages,
        })),
    )
        .into_response()
}

/// A blocking task panicked or was cancelled.
pub fn join_error_to_response(err: tokio::task::JoinError) -> axum::response::Response {
    tracing::error!(error = %err, "blocking task failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
