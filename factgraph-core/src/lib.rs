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

//! Core domain types for the Factgraph knowledge base.
//!
//! A [`ReconciliationResult`] is the typed outcome of classifying new facts
//! against the previously stored fact set. It is reviewed by a human through
//! a [`ReviewSession`], whose decisions are packaged into [`ReviewedFacts`]
//! and merged back into the single canonical fact blob.
//!
//! These types are transient: the durable representation of knowledge is one
//! free-form text blob, one fact per line. Ids like `s1`/`n2`/`c1` are only
//! meaningful within a single reconciliation batch.

pub mod error;
pub mod fact;
pub mod review;

pub use error::{FactError, FactResult};
pub use fact::{ConflictEntry, Fact, ReconciliationResult, ReviewedConflict, ReviewedFact, ReviewedFacts};
pub use review::{DecisionBucket, ReviewSession, ReviewState};
