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

//! Review session state machine.
//!
//! A session is seeded from a [`ReconciliationResult`], collects an
//! accept/reject decision for every id in `new` and `conflicts`, and when
//! complete packages the decisions into [`ReviewedFacts`] for the finalizer.
//!
//! Sessions live entirely in the caller's memory. They are never persisted
//! between requests; an abandoned session is recovered only by re-running
//! reconciliation.

use std::collections::HashMap;

use crate::error::{FactError, FactResult};
use crate::fact::{ReconciliationResult, ReviewedConflict, ReviewedFact, ReviewedFacts};

/// Session lifecycle. The only terminal state is `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Reconciliation result received, decision map not yet seeded.
    Init,
    /// At least one decision is still undecided.
    AwaitingDecisions,
    /// Every decision is set; `submit` is permitted.
    ReadyToFinalize,
    /// Decisions handed to the finalizer; the session cannot be reused.
    Finalized,
}

/// Bulk-review target: the two buckets that carry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionBucket {
    New,
    Conflicts,
}

/// Ephemeral, client-held review workflow over one reconciliation result.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    result: ReconciliationResult,
    decisions: HashMap<String, Option<bool>>,
    state: ReviewState,
}

impl ReviewSession {
    /// Seed a session: every id in `new` and `conflicts` starts undecided.
    /// Sustained facts carry no decision; they are always kept.
    pub fn new(result: ReconciliationResult) -> Self {
        let decisions: HashMap<String, Option<bool>> = result
            .decision_ids()
            .into_iter()
            .map(|id| (id, None))
            .collect();

        let mut session = Self {
            result,
            decisions,
            state: ReviewState::Init,
        };
        session.update_state();
        session
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn result(&self) -> &ReconciliationResult {
        &self.result
    }

    /// Number of decisions still undecided.
    pub fn undecided(&self) -> usize {
        self.decisions.values().filter(|d| d.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.undecided() == 0
    }

    /// Record one decision. Decisions may be revised until `submit`.
    pub fn review(&mut self, id: &str, accepted: bool) -> FactResult<()> {
        if self.state == ReviewState::Finalized {
            return Err(FactError::SessionFinalized);
        }
        match self.decisions.get_mut(id) {
            Some(decision) => {
                *decision = Some(accepted);
                self.update_state();
                Ok(())
            }
            None => Err(FactError::UnknownFactId(id.to_string())),
        }
    }

    /// Record the same decision for every id in one bucket.
    pub fn review_all(&mut self, bucket: DecisionBucket, accepted: bool) -> FactResult<()> {
        if self.state == ReviewState::Finalized {
            return Err(FactError::SessionFinalized);
        }
        let ids: Vec<String> = match bucket {
            DecisionBucket::New => self.result.new_facts.iter().map(|f| f.id.clone()).collect(),
            DecisionBucket::Conflicts => {
                self.result.conflicts.iter().map(|c| c.id.clone()).collect()
            }
        };
        for id in ids {
            if let Some(decision) = self.decisions.get_mut(&id) {
                *decision = Some(accepted);
            }
        }
        self.update_state();
        Ok(())
    }

    /// Package the decisions for the finalizer and consume the session.
    ///
    /// Hard precondition: every decision must be set. This is the single
    /// terminal transition; a finalized session rejects further calls.
    pub fn submit(&mut self) -> FactResult<ReviewedFacts> {
        if self.state == ReviewState::Finalized {
            return Err(FactError::SessionFinalized);
        }
        let undecided = self.undecided();
        if undecided > 0 {
            return Err(FactError::IncompleteReview { undecided });
        }

        let reviewed = ReviewedFacts {
            sustained: self.result.sustained.clone(),
            new_facts: self
                .result
                .new_facts
                .iter()
                .map(|f| ReviewedFact {
                    id: f.id.clone(),
                    fact: f.fact.clone(),
                    accepted: self.decisions.get(&f.id).copied().flatten(),
                })
                .collect(),
            conflicts: self
                .result
                .conflicts
                .iter()
                .map(|c| ReviewedConflict {
                    id: c.id.clone(),
                    new_fact: c.new_fact.clone(),
                    old_fact: c.old_fact.clone(),
                    explanation: c.explanation.clone(),
                    user_prompt: c.user_prompt.clone(),
                    accepted: self.decisions.get(&c.id).copied().flatten(),
                })
                .collect(),
        };

        self.state = ReviewState::Finalized;
        Ok(reviewed)
    }

    fn update_state(&mut self) {
        self.state = if self.is_complete() {
            ReviewState::ReadyToFinalize
        } else {
            ReviewState::AwaitingDecisions
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{ConflictEntry, Fact};

    fn sample_result() -> ReconciliationResult {
        ReconciliationResult {
            sustained: vec![Fact::new("s1", "kept fact")],
            new_facts: vec![Fact::new("n1", "new fact"), Fact::new("n2", "other new")],
            conflicts: vec![ConflictEntry {
                id: "c1".to_string(),
                new_fact: "new side".to_string(),
                old_fact: "old side".to_string(),
                explanation: Some("contradiction".to_string()),
                user_prompt: None,
            }],
        }
    }

    #[test]
    fn test_seed_all_undecided() {
        let session = ReviewSession::new(sample_result());
        assert_eq!(session.state(), ReviewState::AwaitingDecisions);
        assert_eq!(session.undecided(), 3);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_empty_result_is_immediately_ready() {
        let session = ReviewSession::new(ReconciliationResult::default());
        assert_eq!(session.state(), ReviewState::ReadyToFinalize);
    }

    #[test]
    fn test_review_transitions_when_complete() {
        let mut session = ReviewSession::new(sample_result());
        session.review("n1", true).unwrap();
        session.review("n2", false).unwrap();
        assert_eq!(session.state(), ReviewState::AwaitingDecisions);
        session.review("c1", true).unwrap();
        assert_eq!(session.state(), ReviewState::ReadyToFinalize);
    }

    #[test]
    fn test_review_unknown_id() {
        let mut session = ReviewSession::new(sample_result());
        assert!(matches!(
            session.review("s1", true),
            Err(FactError::UnknownFactId(_))
        ));
        assert!(matches!(
            session.review("zz", true),
            Err(FactError::UnknownFactId(_))
        ));
    }

    #[test]
    fn test_bulk_review() {
        let mut session = ReviewSession::new(sample_result());
        session.review_all(DecisionBucket::New, true).unwrap();
        assert_eq!(session.undecided(), 1);
        session.review_all(DecisionBucket::Conflicts, false).unwrap();
        assert_eq!(session.state(), ReviewState::ReadyToFinalize);

        let reviewed = session.submit().unwrap();
        assert!(reviewed.new_facts.iter().all(|f| f.accepted == Some(true)));
        assert_eq!(reviewed.conflicts[0].accepted, Some(false));
    }

    #[test]
    fn test_submit_incomplete_is_rejected() {
        let mut session = ReviewSession::new(sample_result());
        session.review("n1", true).unwrap();
        let err = session.submit().unwrap_err();
        assert!(matches!(err, FactError::IncompleteReview { undecided: 2 }));
        // Session is still usable after the rejected submit.
        assert_eq!(session.state(), ReviewState::AwaitingDecisions);
    }

    #[test]
    fn test_submit_packages_decisions() {
        let mut session = ReviewSession::new(sample_result());
        session.review("n1", true).unwrap();
        session.review("n2", false).unwrap();
        session.review("c1", true).unwrap();

        let reviewed = session.submit().unwrap();
        assert_eq!(session.state(), ReviewState::Finalized);
        assert_eq!(reviewed.sustained.len(), 1);
        assert_eq!(reviewed.new_facts[0].accepted, Some(true));
        assert_eq!(reviewed.new_facts[1].accepted, Some(false));
        assert_eq!(reviewed.conflicts[0].accepted, Some(true));
        assert_eq!(reviewed.merged_facts(), vec!["kept fact", "new fact", "new side"]);
    }

    #[test]
    fn test_finalized_session_cannot_be_reused() {
        let mut session = ReviewSession::new(ReconciliationResult::default());
        session.submit().unwrap();
        assert!(matches!(session.submit(), Err(FactError::SessionFinalized)));
        assert!(matches!(
            session.review("n1", true),
            Err(FactError::SessionFinalized)
        ));
        assert!(matches!(
            session.review_all(DecisionBucket::New, true),
            Err(FactError::SessionFinalized)
        ));
    }

    #[test]
    fn test_decisions_can_be_revised_before_submit() {
        let mut session = ReviewSession::new(sample_result());
        session.review_all(DecisionBucket::New, false).unwrap();
        session.review("n1", true).unwrap();
        session.review("c1", false).unwrap();

        let reviewed = session.submit().unwrap();
        assert_eq!(reviewed.new_facts[0].accepted, Some(true));
        assert_eq!(reviewed.new_facts[1].accepted, Some(false));
    }
}
