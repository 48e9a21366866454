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

//! The fact pipeline: extract, reconcile, review-merge, organize, save.
//!
//! Control flow for one submission:
//! input text -> extractor -> reconciler (reads the current blob) ->
//! review session (client-held) -> finalizer -> store write.
//!
//! The pipeline never retries a model call and only mutates the store as
//! its final step, so any failure leaves the previous blob intact.
//! Reconciliation itself is read-only against the store.

use std::sync::Arc;

use factgraph_core::{FactError, ReconciliationResult, ReviewedFacts};
use tracing::{debug, info};

use crate::llm::TextModel;
use crate::store::FactStore;

pub mod prompts;

/// Orchestrates the fact workflow over an injected store and text model.
pub struct FactPipeline {
    store: Arc<dyn FactStore>,
    model: Arc<dyn TextModel>,
}

impl FactPipeline {
    pub fn new(store: Arc<dyn FactStore>, model: Arc<dyn TextModel>) -> Self {
        Self { store, model }
    }

    /// Current canonical blob; empty string if nothing was ever saved.
    pub fn current_facts(&self) -> Result<String, FactError> {
        self.store.get().map_err(|e| FactError::Upstream(e.to_string()))
    }

    /// Run one fact submission: validate, extract, reconcile.
    ///
    /// The literal input `"delete"` (any case, surrounding whitespace
    /// ignored) bypasses extraction entirely and yields the synthetic
    /// delete-all conflict; the store is only cleared once the user accepts
    /// it through the normal review flow.
    pub async fn process(&self, input: &str) -> Result<ReconciliationResult, FactError> {
        if input.trim().is_empty() {
            return Err(FactError::InvalidInput(
                "Invalid input. Expected a non-empty string.".to_string(),
            ));
        }

        if input.trim().eq_ignore_ascii_case("delete") {
            info!("Delete command received. Clearing all facts pending confirmation.");
            return Ok(ReconciliationResult::delete_all());
        }

        info!("Starting fact processing");
        let extracted = self.extract(input).await?;
        debug!(extracted = %truncate(&extracted, 100), "Extracted facts");

        let previous = self.current_facts()?;
        let result = self.reconcile(&previous, &extracted).await?;
        debug!(
            sustained = result.sustained.len(),
            new = result.new_facts.len(),
            conflicts = result.conflicts.len(),
            "Reconciled facts"
        );

        Ok(result)
    }

    /// Turn unstructured input into newline-delimited atomic facts.
    pub async fn extract(&self, input: &str) -> Result<String, FactError> {
        let prompt = prompts::extract_facts_prompt(input);
        let response = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| FactError::Upstream(e.to_string()))?;
        Ok(response.trim().to_string())
    }

    /// Classify new facts against previous facts into the three buckets.
    ///
    /// Fails closed: a response that does not parse into the exact schema
    /// (or fails structural validation) rejects the whole batch. No partial
    /// results are coerced.
    pub async fn reconcile(
        &self,
        previous_facts: &str,
        new_facts: &str,
    ) -> Result<ReconciliationResult, FactError> {
        let prompt = prompts::reconcile_facts_prompt(previous_facts, new_facts);
        let response = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| FactError::Upstream(e.to_string()))?;

        let result = parse_reconciliation(&response)?;
        result.validate()?;
        Ok(result)
    }

    /// Deduplicate/normalize a flat fact list into the final blob.
    pub async fn organize(&self, facts: &[String]) -> Result<String, FactError> {
        let prompt = prompts::organize_facts_prompt(&facts.join("\n"));
        let response = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| FactError::Upstream(e.to_string()))?;
        Ok(response.trim().to_string())
    }

    /// Merge reviewed decisions, organize the result, and persist it.
    ///
    /// The store write is the last step; an organize failure leaves the
    /// previous blob untouched.
    pub async fn finalize(&self, reviewed: &ReviewedFacts) -> Result<String, FactError> {
        info!("Finalizing and saving facts");

        let merged = reviewed.merged_facts();
        debug!(count = merged.len(), "Merged reviewed facts");

        let organized = self.organize(&merged).await?;
        debug!(organized = %truncate(&organized, 100), "Organized facts");

        self.store
            .set(&organized)
            .map_err(|e| FactError::Upstream(e.to_string()))?;

        info!("Facts finalized and saved");
        Ok(organized)
    }
}

/// Parse a model response into a [`ReconciliationResult`].
///
/// The model is told to return only JSON, but responses occasionally carry
/// prose or code fences around it; the outermost object span is located
/// first, then parsed strictly.
fn parse_reconciliation(response: &str) -> Result<ReconciliationResult, FactError> {
    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => {
            return Err(FactError::MalformedReconciliation(
                "no JSON object found in model response".to_string(),
            ))
        }
    };

    serde_json::from_str(json_str)
        .map_err(|e| FactError::MalformedReconciliation(format!("schema mismatch: {e}")))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake model that replays scripted responses and records every prompt.
    struct ScriptedModel {
        responses: Mutex<VecDeque<anyhow::Result<String>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(responses: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn prompt(&self, idx: usize) -> String {
            self.prompts.lock()[idx].clone()
        }
    }

    #[async_trait::async_trait]
    impl TextModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no scripted response left")))
        }
    }

    /// In-memory store standing in for the graph database.
    #[derive(Default)]
    struct MemoryStore {
        blob: Mutex<String>,
        sets: AtomicUsize,
    }

    impl FactStore for MemoryStore {
        fn get(&self) -> anyhow::Result<String> {
            Ok(self.blob.lock().clone())
        }

        fn set(&self, facts: &str) -> anyhow::Result<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            *self.blob.lock() = facts.to_string();
            Ok(())
        }
    }

    fn pipeline(
        responses: Vec<anyhow::Result<String>>,
    ) -> (FactPipeline, Arc<MemoryStore>, Arc<ScriptedModel>) {
        let store = Arc::new(MemoryStore::default());
        let model = ScriptedModel::new(responses);
        (
            FactPipeline::new(store.clone(), model.clone()),
            store,
            model,
        )
    }

    const RECONCILE_JSON: &str = r#"{
        "sustained": [{"id": "s1", "fact": "Water is wet"}],
        "new": [{"id": "n1", "fact": "RCI operates 28 ships"}],
        "conflicts": []
    }"#;

    #[tokio::test]
    async fn test_empty_input_rejected_without_model_call() {
        let (pipeline, _store, model) = pipeline(vec![]);
        let err = pipeline.process("   ").await.unwrap_err();
        assert!(matches!(err, FactError::InvalidInput(_)));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_short_circuits_without_model_call() {
        let (pipeline, _store, model) = pipeline(vec![]);

        for input in ["delete", "DELETE", "  DeLeTe  "] {
            let result = pipeline.process(input).await.unwrap();
            assert_eq!(result, ReconciliationResult::delete_all());
            assert_eq!(result.conflicts[0].id, "d1");
            assert_eq!(result.conflicts[0].new_fact, "No facts");
            assert_eq!(result.conflicts[0].old_fact, "All previous facts");
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_process_extracts_then_reconciles() {
        let (pipeline, store, model) = pipeline(vec![
            Ok("Water is wet\nRCI operates 28 ships".to_string()),
            Ok(RECONCILE_JSON.to_string()),
        ]);
        store.set("Water is wet").unwrap();

        let result = pipeline
            .process("Water is wet, and RCI operates 28 ships.")
            .await
            .unwrap();

        assert_eq!(model.calls(), 2);
        // Extraction prompt embeds the raw input.
        assert!(model.prompt(0).contains("RCI operates 28 ships."));
        // Reconciliation prompt embeds both the stored blob and the
        // extracted facts.
        let reconcile_prompt = model.prompt(1);
        assert!(reconcile_prompt.contains("<previous_facts>\nWater is wet\n</previous_facts>"));
        assert!(reconcile_prompt.contains("Water is wet\nRCI operates 28 ships"));

        assert_eq!(result.sustained[0].fact, "Water is wet");
        assert_eq!(result.new_facts[0].id, "n1");
    }

    #[tokio::test]
    async fn test_reconcile_parses_conflict_pairing() {
        // Scenario: a new fact reverses a stored fact's meaning.
        let response = r#"Here is the classification:
        {
            "sustained": [],
            "new": [],
            "conflicts": [{
                "id": "c1",
                "newFact": "RCI is still known as RCCL",
                "oldFact": "RCI was previously known as RCCL",
                "explanation": "Naming contradiction",
                "userPrompt": "Which naming fact should be sustained?"
            }]
        }"#;
        let (pipeline, _store, _model) = pipeline(vec![Ok(response.to_string())]);

        let result = pipeline
            .reconcile(
                "RCI was previously known as RCCL",
                "RCI is still known as RCCL",
            )
            .await
            .unwrap();

        assert!(result.sustained.is_empty());
        assert!(result.new_facts.is_empty());
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].new_fact, "RCI is still known as RCCL");
        assert_eq!(result.conflicts[0].old_fact, "RCI was previously known as RCCL");
    }

    #[tokio::test]
    async fn test_reconcile_rejects_non_json() {
        let (pipeline, _store, _model) =
            pipeline(vec![Ok("I could not classify these facts.".to_string())]);
        let err = pipeline.reconcile("a", "b").await.unwrap_err();
        assert!(matches!(err, FactError::MalformedReconciliation(_)));
    }

    #[tokio::test]
    async fn test_reconcile_rejects_schema_mismatch() {
        // `conflicts` entries missing the required oldFact field.
        let response = r#"{"sustained": [], "new": [],
            "conflicts": [{"id": "c1", "newFact": "x"}]}"#;
        let (pipeline, _store, _model) = pipeline(vec![Ok(response.to_string())]);
        let err = pipeline.reconcile("a", "b").await.unwrap_err();
        assert!(matches!(err, FactError::MalformedReconciliation(_)));
    }

    #[tokio::test]
    async fn test_reconcile_rejects_partition_violation() {
        let response = r#"{
            "sustained": [{"id": "s1", "fact": "a"}],
            "new": [{"id": "s1", "fact": "b"}],
            "conflicts": []
        }"#;
        let (pipeline, _store, _model) = pipeline(vec![Ok(response.to_string())]);
        let err = pipeline.reconcile("a", "b").await.unwrap_err();
        assert!(matches!(err, FactError::MalformedReconciliation(_)));
    }

    #[tokio::test]
    async fn test_reconcile_upstream_error_propagates() {
        let (pipeline, _store, _model) = pipeline(vec![Err(anyhow!("model unavailable"))]);
        let err = pipeline.reconcile("a", "b").await.unwrap_err();
        assert!(matches!(err, FactError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_finalize_single_accepted_new_fact() {
        use factgraph_core::ReviewedFact;

        let (pipeline, store, model) = pipeline(vec![Ok("X".to_string())]);
        let reviewed = ReviewedFacts {
            sustained: vec![],
            new_facts: vec![ReviewedFact {
                id: "n1".to_string(),
                fact: "X".to_string(),
                accepted: Some(true),
            }],
            conflicts: vec![],
        };

        let blob = pipeline.finalize(&reviewed).await.unwrap();

        // The organize call receives exactly the one merged fact.
        assert!(model.prompt(0).contains("<facts>\nX\n</facts>"));
        assert_eq!(blob, "X");
        assert_eq!(store.get().unwrap(), "X");
        assert_eq!(pipeline.current_facts().unwrap(), "X");
    }

    #[tokio::test]
    async fn test_finalize_all_rejected_passes_sustained_only() {
        use factgraph_core::{Fact, ReviewedConflict, ReviewedFact};

        let (pipeline, _store, model) =
            pipeline(vec![Ok("kept one\nkept two".to_string())]);
        let reviewed = ReviewedFacts {
            sustained: vec![Fact::new("s1", "kept one"), Fact::new("s2", "kept two")],
            new_facts: vec![ReviewedFact {
                id: "n1".to_string(),
                fact: "rejected".to_string(),
                accepted: Some(false),
            }],
            conflicts: vec![ReviewedConflict {
                id: "c1".to_string(),
                new_fact: "also rejected".to_string(),
                old_fact: "kept one".to_string(),
                explanation: None,
                user_prompt: None,
                accepted: Some(false),
            }],
        };

        pipeline.finalize(&reviewed).await.unwrap();
        assert!(model.prompt(0).contains("<facts>\nkept one\nkept two\n</facts>"));
    }

    #[tokio::test]
    async fn test_finalize_organize_failure_leaves_store_unchanged() {
        let (pipeline, store, _model) = pipeline(vec![Err(anyhow!("model unavailable"))]);
        store.set("previous blob").unwrap();
        let sets_before = store.sets.load(Ordering::SeqCst);

        let err = pipeline.finalize(&ReviewedFacts::default()).await.unwrap_err();
        assert!(matches!(err, FactError::Upstream(_)));
        assert_eq!(store.get().unwrap(), "previous blob");
        assert_eq!(store.sets.load(Ordering::SeqCst), sets_before);
    }

    #[tokio::test]
    async fn test_incomplete_review_never_reaches_finalize() {
        use factgraph_core::{Fact, ReviewSession};

        let (pipeline, store, model) = pipeline(vec![]);
        store.set("previous blob").unwrap();

        let result = ReconciliationResult {
            sustained: vec![],
            new_facts: vec![Fact::new("n1", "undecided")],
            conflicts: vec![],
        };
        let mut session = ReviewSession::new(result);

        let err = session.submit().unwrap_err();
        assert!(matches!(err, FactError::IncompleteReview { undecided: 1 }));
        // Nothing was organized or written.
        assert_eq!(model.calls(), 0);
        assert_eq!(store.get().unwrap(), "previous blob");
    }

    #[tokio::test]
    async fn test_finalize_round_trip() {
        let (pipeline, _store, _model) =
            pipeline(vec![Ok("organized blob".to_string())]);
        let blob = pipeline.finalize(&ReviewedFacts::default()).await.unwrap();
        assert_eq!(pipeline.current_facts().unwrap(), blob);
    }

    #[test]
    fn test_parse_reconciliation_strips_code_fences() {
        let response = format!("```json\n{RECONCILE_JSON}\n```");
        let result = parse_reconciliation(&response).unwrap();
        assert_eq!(result.new_facts.len(), 1);
    }
}
