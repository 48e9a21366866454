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

//! Factgraph HTTP server.
//!
//! Wires a file-backed fact store, a document store, an API-call audit log,
//! and an LLM provider manager into one axum application.

pub mod api;
pub mod config;
pub mod docgen;
pub mod facts;
pub mod llm;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use config::ServerConfig;
use docgen::DocGenerator;
use facts::FactPipeline;
use llm::LLMProviderManager;
use store::{ApiCallLog, DocumentStore, FileFactStore};

pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "factgraph_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Factgraph Server");
    tracing::info!("Configuration: {:#?}", config);

    config.validate()?;
    let addr = config.socket_addr()?;
    let data_dir = &config.storage.data_dir;

    let api_calls = Arc::new(ApiCallLog::open(data_dir.join("api_calls.json")));
    let fact_store = Arc::new(FileFactStore::open(data_dir.join("facts.json")));
    let documents = Arc::new(DocumentStore::open(data_dir.join("documents.json")));

    let llm_manager = Arc::new(LLMProviderManager::new(&config.llm, api_calls.clone()));
    for provider in llm_manager.list_providers() {
        tracing::info!("LLM provider available: {} ({:?})", provider.name, provider.models);
    }

    let state = AppState {
        pipeline: Arc::new(FactPipeline::new(fact_store, llm_manager.clone())),
        docgen: Arc::new(DocGenerator::new(llm_manager)),
        documents,
        api_calls,
    };

    let app = build_router(state)
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    tracing::info!("HTTP server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(server: &config::HttpServerConfig) -> CorsLayer {
    if !server.enable_cors {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.cors_origins.is_empty() {
        tracing::warn!("CORS: Allowing all origins (development mode). Set cors_origins in production!");
        return cors.allow_origin(Any);
    }

    let origins = parse_origins(&server.cors_origins);
    tracing::info!("CORS: Allowing origins: {:?}", origins);
    cors.allow_origin(AllowOrigin::list(origins))
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("CORS: Ignoring invalid origin: {}", origin);
                None
            }
        })
        .collect()
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::health_check))
        .route(
            "/api/facts",
            get(api::facts::get_facts).post(api::facts::process_facts),
        )
        .route("/api/facts/finalize", post(api::facts::finalize_facts))
        .route(
            "/api/documents",
            get(api::documents::list_documents).post(api::documents::create_document),
        )
        .route(
            "/api/documents/:id",
            get(api::documents::get_document)
                .put(api::documents::update_document)
                .delete(api::documents::delete_document),
        )
        .route("/api/api-calls", get(api::api_calls::list_api_calls))
        .route(
            "/api/docgen/documentation",
            post(api::docgen::generate_documentation),
        )
        .route("/api/docgen/mermaid", post(api::docgen::generate_diagram))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_keeps_valid_entries() {
        let origins = parse_origins(&[
            "https://app.example.com".to_string(),
            "http://localhost:5173".to_string(),
        ]);
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://app.example.com");
    }

    #[test]
    fn test_parse_origins_skips_invalid_entries() {
        let origins = parse_origins(&[
            "https://app.example.com".to_string(),
            "bad\norigin".to_string(),
        ]);
        assert_eq!(origins.len(), 1);
        assert_eq!(origins[0], "https://app.example.com");
    }
}
