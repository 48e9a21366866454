// Copyright 2025 Factgraph Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HTTP API surface.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use factgraph_core::FactError;

use crate::docgen::DocGenerator;
use crate::facts::FactPipeline;
use crate::store::{ApiCallLog, DocumentStore};

pub mod api_calls;
pub mod docgen;
pub mod documents;
pub mod facts;
pub mod health;

/// API error mapped to an HTTP response.
///
/// Internal failure detail is logged server-side only; clients get a fixed
/// message so upstream errors never leak prompts or provider responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while processing your request.".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<FactError> for ApiError {
    fn from(err: FactError) -> Self {
        match err {
            FactError::InvalidInput(msg) => ApiError::BadRequest(msg),
            FactError::IncompleteReview { .. }
            | FactError::UnknownFactId(_)
            | FactError::SessionFinalized => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<FactPipeline>,
    pub docgen: Arc<DocGenerator>,
    pub documents: Arc<DocumentStore>,
    pub api_calls: Arc<ApiCallLog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("anthropic key leaked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            "An error occurred while processing your request."
        );
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response = ApiError::BadRequest("missing field".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "missing field");
    }

    #[test]
    fn test_fact_error_mapping() {
        assert!(matches!(
            ApiError::from(FactError::InvalidInput("x".to_string())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(FactError::IncompleteReview { undecided: 2 }),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(FactError::Upstream("x".to_string())),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(FactError::MalformedReconciliation("x".to_string())),
            ApiError::Internal(_)
        ));
    }
}
