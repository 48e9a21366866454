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

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use factgraph_core::{ReconciliationResult, ReviewedFacts};

use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ProcessFactsRequest {
    // Kept as a raw value so a non-string input is a 400, not an extractor
    // rejection.
    pub input: Option<serde_json::Value>,
}

impl ProcessFactsRequest {
    fn input_text(&self) -> Result<&str, ApiError> {
        self.input.as_ref().and_then(|v| v.as_str()).ok_or_else(|| {
            ApiError::BadRequest("Invalid input. Expected a non-empty string.".to_string())
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessFactsResponse {
    pub result: ReconciliationResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeFactsRequest {
    pub reviewed_facts: Option<ReviewedFacts>,
}

#[derive(Debug, Serialize)]
pub struct FactsResponse {
    pub facts: String,
}

/// GET /api/facts
/// Current canonical fact blob.
pub async fn get_facts(State(state): State<AppState>) -> Result<Json<FactsResponse>, ApiError> {
    let facts = state.pipeline.current_facts()?;
    Ok(Json(FactsResponse { facts }))
}

/// POST /api/facts
/// Run extraction and reconciliation on raw input; nothing is stored until
/// the result is reviewed and finalized.
pub async fn process_facts(
    State(state): State<AppState>,
    Json(request): Json<ProcessFactsRequest>,
) -> Result<Json<ProcessFactsResponse>, ApiError> {
    let input = request.input_text()?;
    let result = state.pipeline.process(input).await?;
    Ok(Json(ProcessFactsResponse { result }))
}

/// POST /api/facts/finalize
/// Merge the reviewed decisions, organize, save, and return the new blob.
pub async fn finalize_facts(
    State(state): State<AppState>,
    Json(request): Json<FinalizeFactsRequest>,
) -> Result<Json<FactsResponse>, ApiError> {
    let reviewed = request.reviewed_facts.ok_or_else(|| {
        ApiError::BadRequest("Missing reviewedFacts in request body.".to_string())
    })?;

    let facts = state.pipeline.finalize(&reviewed).await?;
    Ok(Json(FactsResponse { facts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_text_accepts_string() {
        let request = ProcessFactsRequest {
            input: Some(json!("Water is wet")),
        };
        assert_eq!(request.input_text().unwrap(), "Water is wet");
    }

    #[test]
    fn test_input_text_rejects_missing_input() {
        let request = ProcessFactsRequest { input: None };
        assert!(matches!(
            request.input_text(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_input_text_rejects_non_string_input() {
        for value in [json!(5), json!(true), json!(["a"]), json!(null)] {
            let request = ProcessFactsRequest { input: Some(value) };
            assert!(matches!(
                request.input_text(),
                Err(ApiError::BadRequest(_))
            ));
        }
    }
}
