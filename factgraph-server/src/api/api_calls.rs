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
use serde::Serialize;

use crate::api::AppState;
use crate::store::ApiCallRecord;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallsResponse {
    pub api_calls: Vec<ApiCallRecord>,
    pub total: usize,
}

/// GET /api/api-calls
/// Audit trail of model invocations, newest first.
pub async fn list_api_calls(State(state): State<AppState>) -> Json<ApiCallsResponse> {
    let api_calls = state.api_calls.list();
    let total = state.api_calls.count();
    Json(ApiCallsResponse { api_calls, total })
}
