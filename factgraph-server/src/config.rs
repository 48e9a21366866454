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

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Factgraph server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LLMConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:47300")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Allowed CORS origins (empty = allow all, use specific origins in production)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path to the Factgraph data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Ollama base URL (e.g., "http://localhost:11434")
    pub ollama_base_url: Option<String>,

    /// Provider used by the fact pipeline ("anthropic" or "ollama")
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model override; each provider has its own default
    pub model: Option<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
            cors_origins: vec![],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            ollama_base_url: None,
            default_provider: default_provider(),
            model: None,
        }
    }
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:47300".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./factgraph-data")
}

fn default_provider() -> String {
    "anthropic".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            storage: StorageConfig::default(),
            llm: LLMConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - FACTGRAPH_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:47300)
    /// - FACTGRAPH_DATA_DIR: Data directory path (default: ./factgraph-data)
    /// - FACTGRAPH_ENABLE_CORS: Enable CORS (default: true)
    /// - FACTGRAPH_LLM_PROVIDER: Provider used by the fact pipeline
    /// - FACTGRAPH_LLM_MODEL: Model override
    /// - ANTHROPIC_API_KEY: Anthropic API key
    /// - OLLAMA_BASE_URL: Ollama base URL
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("FACTGRAPH_HTTP_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Ok(cors) = std::env::var("FACTGRAPH_ENABLE_CORS") {
            config.server.enable_cors = cors.parse().unwrap_or(true);
        }

        if let Ok(data_dir) = std::env::var("FACTGRAPH_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(provider) = std::env::var("FACTGRAPH_LLM_PROVIDER") {
            config.llm.default_provider = provider;
        }

        if let Ok(model) = std::env::var("FACTGRAPH_LLM_MODEL") {
            config.llm.model = Some(model);
        }

        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            config.llm.anthropic_api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            config.llm.ollama_base_url = Some(base_url);
        }

        config
    }

    /// Load configuration with priority: env > file > defaults.
    ///
    /// Environment variables win over the config file, matching the CLI
    /// overrides in `main.rs` (clap reads the same `FACTGRAPH_` variables).
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        // Override with environment variables
        config = Self::merge_with_env(config);

        Ok(config)
    }

    /// Merge config with environment variables (env takes priority)
    fn merge_with_env(mut config: Self) -> Self {
        let env_config = Self::from_env();

        // Only override if env var was explicitly set
        if std::env::var("FACTGRAPH_HTTP_ADDR").is_ok() {
            config.server.listen_addr = env_config.server.listen_addr;
        }
        if std::env::var("FACTGRAPH_DATA_DIR").is_ok() {
            config.storage.data_dir = env_config.storage.data_dir;
        }
        if std::env::var("FACTGRAPH_LLM_PROVIDER").is_ok() {
            config.llm.default_provider = env_config.llm.default_provider;
        }
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            config.llm.anthropic_api_key = env_config.llm.anthropic_api_key;
        }
        if std::env::var("OLLAMA_BASE_URL").is_ok() {
            config.llm.ollama_base_url = env_config.llm.ollama_base_url;
        }

        config
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        match self.llm.default_provider.as_str() {
            "anthropic" | "ollama" => {}
            other => anyhow::bail!("Unknown LLM provider: {}", other),
        }

        if !self.storage.data_dir.exists() {
            std::fs::create_dir_all(&self.storage.data_dir)?;
        }

        Ok(())
    }
}
