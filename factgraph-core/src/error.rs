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

//! Fact pipeline error types

use thiserror::Error;

/// Result type for fact operations
pub type FactResult<T> = Result<T, FactError>;

/// Errors that can occur in the fact pipeline
#[derive(Debug, Error)]
pub enum FactError {
    /// Bad request shape (empty input, missing field)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model output failed to parse into the reconciliation schema
    #[error("Malformed reconciliation response: {0}")]
    MalformedReconciliation(String),

    /// Review submitted while decisions remain undecided
    #[error("Review is incomplete: {undecided} decision(s) still pending")]
    IncompleteReview { undecided: usize },

    /// Decision recorded for an id not present in the session
    #[error("Unknown fact id: {0}")]
    UnknownFactId(String),

    /// Operation on a session that has already been finalized
    #[error("Review session has already been finalized")]
    SessionFinalized,

    /// Text model or store failure
    #[error("Upstream service error: {0}")]
    Upstream(String),
}
