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

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::debug;

use crate::api::AppState;

/// Health check response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: StorageHealth,
}

#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub reachable: bool,
    pub documents: usize,
    pub api_calls: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");

    let storage_reachable = state.pipeline.current_facts().is_ok();

    let health = HealthResponse {
        status: if storage_reachable {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: StorageHealth {
            reachable: storage_reachable,
            documents: state.documents.list().len(),
            api_calls: state.api_calls.count(),
        },
    };

    let status_code = if storage_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}
