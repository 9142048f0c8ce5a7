//! Configuration management.
//!
//! Loads and merges configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - A YAML config file (`dulich.yaml`)
//!
//! The language-model name is plain configuration data here and is
//! threaded into each pipeline invocation; there is no mutable global
//! "current model" anywhere in the system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default OpenAI-compatible inference endpoint.
const DEFAULT_LLM_ENDPOINT: &str = "https://models.github.ai/inference";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// OpenAI-compatible chat completions endpoint
    pub llm_endpoint: String,

    /// Model identifier sent with every completion request
    pub model: String,

    /// API key for the LLM endpoint
    pub llm_api_key: Option<String>,

    /// Elasticsearch base URL
    pub search_url: String,

    /// Elasticsearch index holding the travel documents
    pub search_index: String,

    /// API key for the search service
    pub search_api_key: Option<String>,

    /// Embedding service endpoint
    pub embedding_endpoint: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// YAML config file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    search: Option<SearchSection>,
    embedding: Option<EmbeddingSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    endpoint: Option<String>,
    model: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchSection {
    url: Option<String>,
    index: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    endpoint: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            llm_endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: "openai/gpt-4.1".to_string(),
            llm_api_key: None,
            search_url: "http://localhost:9200".to_string(),
            search_index: "chatbot_elastic".to_string(),
            search_api_key: None,
            embedding_endpoint: "https://api.jina.ai/v1/embeddings".to_string(),
            embedding_model: "jina-embeddings-v3".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DULICH_CONFIG`: Path to config file
    /// - `DULICH_MODEL`: Model identifier
    /// - `GITHUB_TOKEN`: API key for the LLM endpoint
    /// - `ELASTICSEARCH_URL` / `ELASTICSEARCH_API_KEY`: search service
    /// - `EMBEDDING_API_KEY`: embedding service key (read by the search crate)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("DULICH_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // YAML config file, if present, is applied first
        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("dulich.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(model) = std::env::var("DULICH_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("ELASTICSEARCH_URL") {
            config.search_url = url;
        }

        if config.llm_api_key.is_none() {
            config.llm_api_key = std::env::var("GITHUB_TOKEN").ok();
        }

        if config.search_api_key.is_none() {
            config.search_api_key = std::env::var("ELASTICSEARCH_API_KEY").ok();
        }

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(llm) = config_file.llm {
            if let Some(endpoint) = llm.endpoint {
                result.llm_endpoint = endpoint;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(env_var) = llm.api_key_env {
                result.llm_api_key = std::env::var(&env_var).ok();
            }
        }

        if let Some(search) = config_file.search {
            if let Some(url) = search.url {
                result.search_url = url;
            }
            if let Some(index) = search.index {
                result.search_index = index;
            }
            if let Some(env_var) = search.api_key_env {
                result.search_api_key = std::env::var(&env_var).ok();
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(endpoint) = embedding.endpoint {
                result.embedding_endpoint = endpoint;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate required settings for the active collaborators.
    pub fn validate(&self) -> AppResult<()> {
        if self.llm_api_key.is_none() {
            return Err(AppError::Config(
                "LLM API key not set (GITHUB_TOKEN or llm.apiKeyEnv)".to_string(),
            ));
        }

        if self.search_url.is_empty() {
            return Err(AppError::Config("Search URL must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model, "openai/gpt-4.1");
        assert_eq!(config.search_index, "chatbot_elastic");
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            Some("openai/gpt-4o-mini".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.model, "openai/gpt-4o-mini");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm:\n  model: openai/gpt-4o\nsearch:\n  index: travel_docs\nlogging:\n  level: warn"
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&file.path().to_path_buf()).unwrap();

        assert_eq!(merged.model, "openai/gpt-4o");
        assert_eq!(merged.search_index, "travel_docs");
        assert_eq!(merged.log_level, Some("warn".to_string()));
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut config = AppConfig::default();
        config.llm_api_key = None;
        assert!(config.validate().is_err());

        config.llm_api_key = Some("token".to_string());
        assert!(config.validate().is_ok());
    }
}
