use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use polars::prelude::PolarsError;
use serde_json::json;

use crate::api_models::investment::ParamError;
use crate::services::price_history::ProviderError;

#[derive(Debug)]
pub enum AppError {
    NotFound,
    /// 400，响应体 {"error": msg}
    BadRequest(String),
    /// 500，响应体 {"error": msg}
    Internal(String),
    /// 500，无响应体
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response(),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": msg}))).into_response()
            }
            AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl From<ParamError> for AppError {
    fn from(err: ParamError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        tracing::error!("Price history provider failed: {}", err);
        AppError::InternalServerError
    }
}

impl From<PolarsError> for AppError {
    fn from(err: PolarsError) -> Self {
        tracing::error!("Price frame processing failed: {}", err);
        AppError::InternalServerError
    }
}
