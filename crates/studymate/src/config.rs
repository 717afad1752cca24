//! Configuration for StudyMate
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables. The binary loads `.env` before any of this runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "studymate.toml";

/// Environment variable holding the hosted LLM API key
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variable naming the embedding model
pub const EMBEDDING_MODEL_ENV: &str = "EMBEDDING_MODEL";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyMateConfig {
    /// Where sessions and vectors live on disk
    pub workspace: WorkspaceConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Hosted LLM configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

/// On-disk locations, relative paths resolve against the working directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Session registry file, one name per line
    pub registry_path: PathBuf,
    /// SQLite file holding every session collection
    pub storage_path: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("sessions.txt"),
            storage_path: PathBuf::from("studymate_db").join("vectors.db"),
        }
    }
}

impl WorkspaceConfig {
    /// Place both files under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            registry_path: dir.join("sessions.txt"),
            storage_path: dir.join("studymate_db").join("vectors.db"),
        }
    }
}

/// Embedding configuration (Ollama server)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Number of chunks embedded per batch
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            batch_size: 32,
            timeout_secs: 60,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            min_chunk_size: 1,
        }
    }
}

/// Hosted chat-completion API configuration (OpenAI compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL, `/chat/completions` is appended
    pub base_url: String,
    /// API key, usually taken from `GROQ_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Provider specific handling of reasoning tokens ("hidden" drops them)
    pub reasoning_format: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "qwen/qwen3-32b".to_string(),
            temperature: 0.0,
            reasoning_format: Some("hidden".to_string()),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// The API key, or a configuration error naming the variable to set
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", API_KEY_ENV)))
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the model per question
    pub top_k: usize,
    /// Print the sources under each answer
    pub show_sources: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            show_sources: false,
        }
    }
}

impl StudyMateConfig {
    /// Load configuration from `path`, or from `studymate.toml` when present,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text, missing sections fall back to defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get(EMBEDDING_MODEL_ENV) {
            self.embeddings.model = model;
        }
        if let Some(url) = get("STUDYMATE_EMBED_BASE_URL") {
            self.embeddings.base_url = url;
        }
        if let Some(url) = get("STUDYMATE_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("STUDYMATE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(top_k) = get("STUDYMATE_TOP_K") {
            match top_k.trim().parse() {
                Ok(k) => self.retrieval.top_k = k,
                Err(_) => tracing::warn!("Ignoring STUDYMATE_TOP_K={}, not a number", top_k),
            }
        }
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StudyMateConfig::default();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.workspace.registry_path, PathBuf::from("sessions.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = StudyMateConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 800

            [llm]
            model = "llama-3.1-8b-instant"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.embeddings.model, "nomic-embed-text");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GROQ_API_KEY", "gsk_test"),
            ("EMBEDDING_MODEL", "all-minilm"),
            ("STUDYMATE_TOP_K", "3"),
            ("STUDYMATE_LLM_MODEL", " "),
        ]
        .into_iter()
        .collect();

        let mut config = StudyMateConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key().unwrap(), "gsk_test");
        assert_eq!(config.embeddings.model, "all-minilm");
        assert_eq!(config.retrieval.top_k, 3);
        // blank values do not override
        assert_eq!(config.llm.model, "qwen/qwen3-32b");
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig::default();
        let err = config.api_key().unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = StudyMateConfig::default();
        config.chunking.chunk_overlap = 500;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
