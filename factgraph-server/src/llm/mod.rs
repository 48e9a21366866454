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

//! Text-model access.
//!
//! Providers are registered behind the [`LLMProvider`] trait and routed by
//! id through [`LLMProviderManager`]. The fact pipeline and documentation
//! generator depend only on the narrower [`TextModel`] seam: one prompt in,
//! one completion out, no retries, no streaming. Every outbound call is
//! recorded in the API call audit log.

use crate::config::LLMConfig;
use crate::store::{ApiCallLog, ApiCallRecord};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

mod providers;
pub use providers::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub duration_ms: u32,
}

#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<ChatResponse>;

    fn list_models(&self) -> Vec<String>;
    fn name(&self) -> &str;
}

/// Opaque prompt-to-text service used by the fact pipeline.
#[async_trait::async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct LLMProviderManager {
    providers: DashMap<String, Arc<dyn LLMProvider>>,
    default_provider: String,
    default_model: Option<String>,
    audit_log: Arc<ApiCallLog>,
}

impl LLMProviderManager {
    pub fn new(llm_config: &LLMConfig, audit_log: Arc<ApiCallLog>) -> Self {
        let providers = DashMap::new();

        // Initialize Anthropic if key present
        if let Some(key) = &llm_config.anthropic_api_key {
            let provider = Arc::new(AnthropicProvider::new(key.clone()));
            providers.insert("anthropic".to_string(), provider as Arc<dyn LLMProvider>);
            info!("Initialized Anthropic provider");
        } else {
            warn!("ANTHROPIC_API_KEY not set, Anthropic provider disabled");
        }

        // Initialize Ollama (local, no key needed)
        if let Some(base_url) = &llm_config.ollama_base_url {
            let provider = Arc::new(OllamaProvider::new(base_url.clone()));
            providers.insert("ollama".to_string(), provider as Arc<dyn LLMProvider>);
            info!("Initialized Ollama provider");
        }

        if providers.is_empty() {
            warn!("No text-model provider configured; fact processing will fail until one is set");
        }

        Self {
            providers,
            default_provider: llm_config.default_provider.clone(),
            default_model: llm_config.model.clone(),
            audit_log,
        }
    }

    pub async fn chat(
        &self,
        provider_id: &str,
        model: Option<String>,
        messages: Vec<ChatMessage>,
    ) -> anyhow::Result<ChatResponse> {
        let provider = self
            .providers
            .get(provider_id)
            .ok_or_else(|| anyhow::anyhow!("Provider not found: {}", provider_id))?
            .clone();

        let audit_prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let response = provider.chat(messages, model).await?;

        self.audit_log.record(ApiCallRecord::new(
            response.provider.clone(),
            response.model.clone(),
            response.input_tokens,
            response.output_tokens,
            &audit_prompt,
        ));

        Ok(response)
    }

    pub fn list_providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|entry| {
                let (id, provider) = entry.pair();
                ProviderInfo {
                    id: id.clone(),
                    name: provider.name().to_string(),
                    models: provider.list_models(),
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl TextModel for LLMProviderManager {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];

        let response = self
            .chat(&self.default_provider, self.default_model.clone(), messages)
            .await?;

        Ok(response.content)
    }
}
