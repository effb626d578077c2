//! HTTP error mapping for neuroscan-server
//!
//! Converts pipeline and store failures into the wire error shape: a
//! flat object with an `error` string, plus `missing_fields` for the
//! missing-patient-fields case.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::analysis::AnalysisError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure inside the analysis pipeline
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Malformed multipart request body
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    /// Database failure outside the pipeline (history endpoints)
    #[error("Database error: {0}")]
    Database(#[from] neuroscan_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Analysis(err) => analysis_response(err),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApiError::Database(err) => {
                error!("history store failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn analysis_response(err: &AnalysisError) -> (StatusCode, serde_json::Value) {
    match err {
        AnalysisError::MissingFields(fields) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Missing required fields",
                "missing_fields": fields,
            }),
        ),
        client if client.is_client_error() => (
            StatusCode::BAD_REQUEST,
            json!({ "error": client.to_string() }),
        ),
        AnalysisError::Classifier(e) => {
            error!("classifier failure: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Classification service unavailable" }),
            )
        }
        other => {
            error!("analysis failure: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            )
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
