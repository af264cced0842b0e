//! Configuration loading and persistence
//!
//! Settings live in `~/.docrag/config.toml` and are threaded explicitly
//! through the pipeline constructors; nothing reads configuration from
//! ambient global state.

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Generation model tag
    pub generate: String,
    /// Embedding model tag; must match between index build and query time
    pub embed: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            generate: "qwen2.5:7b-instruct".to_string(),
            embed: "nomic-embed-text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum fragment size in characters
    pub max_fragment_chars: usize,
    /// Overlap repeated from the previous fragment, in characters
    pub overlap_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_fragment_chars: 800,
            overlap_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Fragments retrieved per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Additional attempts after a transient failure
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            top_k: None,
            top_p: None,
            num_ctx: Some(4096),
            stop: None,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl RagConfig {
    /// Load configuration from file, creating the default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &PathBuf) -> Result<Self> {
        if !config_path.exists() {
            let config = RagConfig::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)?;

        let config: RagConfig = toml::from_str(&contents)
            .map_err(|e| RagError::ConfigError(format!("failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RagError::ConfigError("could not determine home directory".to_string()))?;

        Ok(home.join(".docrag").join("config.toml"))
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.ingest.max_fragment_chars == 0 {
            return Err(RagError::ConfigError(
                "ingest.max_fragment_chars must be at least 1".to_string(),
            ));
        }
        if self.ingest.overlap_chars >= self.ingest.max_fragment_chars {
            return Err(RagError::ConfigError(format!(
                "ingest.overlap_chars {} must be smaller than max_fragment_chars {}",
                self.ingest.overlap_chars, self.ingest.max_fragment_chars
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(RagError::ConfigError(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL of the Ollama server
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.server.port, 11434);
        assert_eq!(config.models.embed, "nomic-embed-text");
        assert_eq!(config.ingest.max_fragment_chars, 800);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.generation.max_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url() {
        let config = RagConfig::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_validate_rejects_bad_overlap() {
        let mut config = RagConfig::default();
        config.ingest.overlap_chars = config.ingest.max_fragment_chars;
        assert!(matches!(config.validate(), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = RagConfig::default();
        config.models.generate = "llama3.1:8b".to_string();
        config.generation.temperature = Some(0.3);

        let toml_string = toml::to_string(&config).unwrap();
        let back: RagConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(back.models.generate, "llama3.1:8b");
        assert_eq!(back.generation.temperature, Some(0.3));
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config: RagConfig = toml::from_str("[models]\ngenerate = \"x\"\nembed = \"y\"\n").unwrap();
        assert_eq!(config.models.generate, "x");
        assert_eq!(config.server.port, 11434);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = RagConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 11434);

        // Second load reads the file it just wrote
        let reloaded = RagConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.models.embed, config.models.embed);
    }
}
