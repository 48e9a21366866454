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

//! Graph-store persistence, modeled as narrow file-backed repositories.
//!
//! Each store loads its file on open, serves reads from memory behind a
//! `parking_lot::RwLock`, and persists mutations with an atomic
//! write-temp-then-rename. The fact blob is a singleton record; documents
//! and API-call audit records are keyed collections.

pub mod api_calls;
pub mod documents;
pub mod facts;

pub use api_calls::{ApiCallLog, ApiCallRecord};
pub use documents::{Document, DocumentStore, DocumentUpdate};
pub use facts::{FactStore, FileFactStore};
