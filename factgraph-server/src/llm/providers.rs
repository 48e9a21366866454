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

use super::{ChatMessage, ChatResponse, LLMProvider};
use serde_json::json;
use std::time::Instant;

// Anthropic Provider
pub struct AnthropicProvider {
    api_key: String,
    client: reqwest::Client,
    models: Vec<String>,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            models: vec![
                "claude-3-5-sonnet-20240620".to_string(),
                "claude-3-opus-20240229".to_string(),
                "claude-3-haiku-20240307".to_string(),
            ],
        }
    }
}

#[async_trait::async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let model_name = model.unwrap_or_else(|| "claude-3-5-sonnet-20240620".to_string());

        let formatted_messages: Vec<_> = messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        // Temperature 0: classification output must be as deterministic as
        // the API allows.
        let body = json!({
            "model": model_name,
            "messages": formatted_messages,
            "max_tokens": 4096,
            "temperature": 0,
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let json: serde_json::Value = response.json().await?;

        let content = json["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Malformed response from Anthropic API"))?;

        let input_tokens = json["usage"]["input_tokens"].as_u64().map(|t| t as u32);
        let output_tokens = json["usage"]["output_tokens"].as_u64().map(|t| t as u32);

        Ok(ChatResponse {
            content,
            provider: "anthropic".to_string(),
            model: model_name,
            input_tokens,
            output_tokens,
            duration_ms: start.elapsed().as_millis() as u32,
        })
    }

    fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn name(&self) -> &str {
        "Anthropic"
    }
}

// Ollama Provider (Local)
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    models: Vec<String>,
}

impl OllamaProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            models: vec![
                "llama2".to_string(),
                "mistral".to_string(),
            ],
        }
    }
}

#[async_trait::async_trait]
impl LLMProvider for OllamaProvider {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let model_name = model.unwrap_or_else(|| "llama2".to_string());

        let formatted_messages: Vec<_> = messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let body = json!({
            "model": model_name,
            "messages": formatted_messages,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let json: serde_json::Value = response.json().await?;

        let content = json["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Malformed response from Ollama"))?;

        Ok(ChatResponse {
            content,
            provider: "ollama".to_string(),
            model: model_name,
            // Ollama doesn't always provide token counts
            input_tokens: json["prompt_eval_count"].as_u64().map(|t| t as u32),
            output_tokens: json["eval_count"].as_u64().map(|t| t as u32),
            duration_ms: start.elapsed().as_millis() as u32,
        })
    }

    fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
