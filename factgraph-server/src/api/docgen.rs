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

use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentationRequest {
    pub file_content: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateDocumentationResponse {
    pub documentation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDiagramRequest {
    pub file_content: String,
    #[serde(default)]
    pub file_type: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateDiagramResponse {
    pub diagram: String,
}

/// POST /api/docgen/documentation
pub async fn generate_documentation(
    State(state): State<AppState>,
    Json(request): Json<GenerateDocumentationRequest>,
) -> Result<Json<GenerateDocumentationResponse>, ApiError> {
    if request.file_content.trim().is_empty() {
        return Err(ApiError::BadRequest("fileContent is required.".to_string()));
    }

    let documentation = state.docgen.generate_documentation(&request.file_content).await;
    Ok(Json(GenerateDocumentationResponse { documentation }))
}

/// POST /api/docgen/mermaid
pub async fn generate_diagram(
    State(state): State<AppState>,
    Json(request): Json<GenerateDiagramRequest>,
) -> Result<Json<GenerateDiagramResponse>, ApiError> {
    if request.file_content.trim().is_empty() {
        return Err(ApiError::BadRequest("fileContent is required.".to_string()));
    }

    let diagram = state
        .docgen
        .generate_mermaid_diagram(&request.file_content, &request.file_type)
        .await;
    Ok(Json(GenerateDiagramResponse { diagram }))
}
