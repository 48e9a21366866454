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

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiError, AppState};
use crate::store::{Document, DocumentUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<Document>,
    pub total: usize,
}

/// GET /api/documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentsResponse> {
    let documents = state.documents.list();
    let total = documents.len();
    Json(DocumentsResponse { documents, total })
}

/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    state
        .documents
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Document {id} not found")))
}

/// POST /api/documents
pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Document title is required.".to_string()));
    }

    let document = state
        .documents
        .create(request.title, request.content, request.tags);
    Ok((StatusCode::CREATED, Json(document)))
}

/// PUT /api/documents/:id
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<Document>, ApiError> {
    state
        .documents
        .update(id, update)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Document {id} not found")))
}

/// DELETE /api/documents/:id
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.documents.delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Document {id} not found")))
    }
}
