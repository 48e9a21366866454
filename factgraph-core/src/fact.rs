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

//! Fact and reconciliation data model.
//!
//! The wire shape is camelCase JSON produced by the reconciliation model:
//!
//! ```json
//! {
//!   "sustained": [{"id": "s1", "fact": "..."}],
//!   "new":       [{"id": "n1", "fact": "..."}],
//!   "conflicts": [{"id": "c1", "newFact": "...", "oldFact": "...",
//!                  "explanation": "...", "userPrompt": "..."}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{FactError, FactResult};

/// Id of the synthetic conflict produced by the "delete" escape hatch.
pub const DELETE_CONFLICT_ID: &str = "d1";

/// An atomic fact statement, scoped to one reconciliation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub fact: String,
}

impl Fact {
    pub fn new(id: impl Into<String>, fact: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fact: fact.into(),
        }
    }
}

/// A new fact paired with the previous fact it contradicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub id: String,
    pub new_fact: String,
    pub old_fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
}

/// Output of one reconciliation pass.
///
/// Every previous fact belongs to exactly one of `sustained` or the
/// `oldFact` side of a conflict; every incoming fact belongs to exactly one
/// of `new` or the `newFact` side of a conflict. The model is instructed to
/// uphold that partition; [`ReconciliationResult::validate`] enforces the
/// structurally checkable part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub sustained: Vec<Fact>,
    #[serde(rename = "new")]
    pub new_facts: Vec<Fact>,
    pub conflicts: Vec<ConflictEntry>,
}

impl ReconciliationResult {
    /// Synthetic result for the "delete" command: no extraction happens,
    /// the store is only cleared once the user accepts this conflict.
    pub fn delete_all() -> Self {
        Self {
            sustained: Vec::new(),
            new_facts: Vec::new(),
            conflicts: vec![ConflictEntry {
                id: DELETE_CONFLICT_ID.to_string(),
                new_fact: "No facts".to_string(),
                old_fact: "All previous facts".to_string(),
                explanation: Some("User requested to delete all facts".to_string()),
                user_prompt: None,
            }],
        }
    }

    /// Ids requiring a review decision (everything in `new` and `conflicts`).
    pub fn decision_ids(&self) -> Vec<String> {
        self.new_facts
            .iter()
            .map(|f| f.id.clone())
            .chain(self.conflicts.iter().map(|c| c.id.clone()))
            .collect()
    }

    /// Structural validation of a parsed reconciliation response.
    ///
    /// Rejects empty ids, ids reused across buckets, and fact text that
    /// appears both in `new` and as a conflict's `newFact`. Semantic
    /// coverage of the previous fact set cannot be checked without another
    /// model call and is trusted, as in the source system.
    pub fn validate(&self) -> FactResult<()> {
        let mut seen = HashSet::new();
        for id in self
            .sustained
            .iter()
            .map(|f| f.id.as_str())
            .chain(self.new_facts.iter().map(|f| f.id.as_str()))
            .chain(self.conflicts.iter().map(|c| c.id.as_str()))
        {
            if id.is_empty() {
                return Err(FactError::MalformedReconciliation(
                    "empty fact id".to_string(),
                ));
            }
            if !seen.insert(id) {
                return Err(FactError::MalformedReconciliation(format!(
                    "duplicate fact id across buckets: {id}"
                )));
            }
        }

        let conflict_texts: HashSet<&str> =
            self.conflicts.iter().map(|c| c.new_fact.as_str()).collect();
        if let Some(dup) = self
            .new_facts
            .iter()
            .find(|f| conflict_texts.contains(f.fact.as_str()))
        {
            return Err(FactError::MalformedReconciliation(format!(
                "fact appears in both new and conflicts: {}",
                dup.fact
            )));
        }

        Ok(())
    }
}

/// A new fact carrying the reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedFact {
    pub id: String,
    pub fact: String,
    #[serde(default)]
    pub accepted: Option<bool>,
}

/// A conflict carrying the reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedConflict {
    pub id: String,
    pub new_fact: String,
    pub old_fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub accepted: Option<bool>,
}

/// The finalize payload: the reconciliation buckets with decisions applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedFacts {
    pub sustained: Vec<Fact>,
    #[serde(rename = "new")]
    pub new_facts: Vec<ReviewedFact>,
    pub conflicts: Vec<ReviewedConflict>,
}

impl ReviewedFacts {
    /// Flat merge of the review: sustained facts, accepted new facts, then
    /// accepted conflicts' new side. Rejected and undecided entries are
    /// dropped; an accepted conflict's old fact was never re-added because
    /// reconciliation excluded it from `sustained`.
    pub fn merged_facts(&self) -> Vec<String> {
        self.sustained
            .iter()
            .map(|f| f.fact.clone())
            .chain(
                self.new_facts
                    .iter()
                    .filter(|f| f.accepted == Some(true))
                    .map(|f| f.fact.clone()),
            )
            .chain(
                self.conflicts
                    .iter()
                    .filter(|c| c.accepted == Some(true))
                    .map(|c| c.new_fact.clone()),
            )
            .collect()
    }
}
