//! Configuration system for docsum.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use docsum_extractors::{OcrEngineConfig, ShardOrder};
use tracing::warn;

use crate::error::{DocsumError, DocsumResult};
use crate::traits::LlmConfig;

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAI,
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            config: LlmConfig {
                model: "gemini-2.5-flash".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Where uploaded documents and OCR shards live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Directory on the local filesystem.
    #[default]
    Local,
    /// Google Cloud Storage bucket.
    Gcs,
}

/// Object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend.
    pub local_root: PathBuf,
    /// Upload bucket for the GCS backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_root: docsum_dir().join("objects"),
            bucket: None,
        }
    }
}

/// OCR capability provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OcrProvider {
    /// Google Cloud Vision (single-image and batch PDF OCR).
    #[default]
    GoogleVision,
    /// Local Tesseract (single-image only).
    Tesseract,
}

/// OCR configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OcrConfig {
    #[serde(default)]
    pub provider: OcrProvider,
    /// Output root, time budget and shard order for batch jobs.
    #[serde(flatten)]
    pub engine: OcrEngineConfig,
}

/// Summarization request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Inputs with fewer whitespace-delimited tokens are rejected.
    pub min_input_tokens: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            min_input_tokens: 20,
        }
    }
}

/// Main docsum configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsumConfig {
    /// LLM configuration.
    pub llm: LlmProviderConfig,
    /// Object store configuration.
    pub storage: StorageConfig,
    /// OCR configuration.
    pub ocr: OcrConfig,
    /// Summarization configuration.
    pub summarizer: SummarizerConfig,
    /// Path to the document status database.
    pub status_db_path: PathBuf,
}

fn docsum_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".docsum"))
        .unwrap_or_else(|| PathBuf::from(".docsum"))
}

impl Default for DocsumConfig {
    fn default() -> Self {
        Self {
            llm: LlmProviderConfig::default(),
            storage: StorageConfig::default(),
            ocr: OcrConfig::default(),
            summarizer: SummarizerConfig::default(),
            status_db_path: docsum_dir().join("status.db"),
        }
    }
}

impl DocsumConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DocsumResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| DocsumError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| DocsumError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| DocsumError::Configuration(e.to_string())),
            _ => Err(DocsumError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // LLM configuration
        if let Ok(provider) = std::env::var("DOCSUM_LLM_PROVIDER") {
            config.llm.provider = match provider.to_lowercase().as_str() {
                "openai" => LlmProvider::OpenAI,
                _ => LlmProvider::Gemini,
            };
            if config.llm.provider == LlmProvider::OpenAI {
                config.llm.config.model = "gpt-4o-mini".to_string();
            }
        }
        if let Ok(model) = std::env::var("DOCSUM_LLM_MODEL") {
            config.llm.config.model = model;
        }
        let key_var = match config.llm.provider {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
        };
        if let Ok(api_key) = std::env::var(key_var) {
            config.llm.config.api_key = Some(api_key);
        }

        // Storage configuration
        if let Ok(backend) = std::env::var("DOCSUM_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_lowercase().as_str() {
                "gcs" => StorageBackend::Gcs,
                _ => StorageBackend::Local,
            };
        }
        if let Ok(root) = std::env::var("DOCSUM_LOCAL_ROOT") {
            config.storage.local_root = PathBuf::from(root);
        }
        if let Ok(bucket) = std::env::var("DOCSUM_GCS_BUCKET") {
            config.storage.bucket = Some(bucket);
        }

        // OCR configuration
        if let Ok(provider) = std::env::var("DOCSUM_OCR_PROVIDER") {
            config.ocr.provider = match provider.to_lowercase().as_str() {
                "tesseract" => OcrProvider::Tesseract,
                _ => OcrProvider::GoogleVision,
            };
        }
        if let Ok(root) = std::env::var("DOCSUM_OCR_OUTPUT") {
            config.ocr.engine.output_root = root;
        }
        if let Ok(secs) = std::env::var("DOCSUM_OCR_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.ocr.engine.timeout = Duration::from_secs(secs),
                Err(_) => warn!(value = %secs, "Ignoring invalid DOCSUM_OCR_TIMEOUT_SECS"),
            }
        }
        // "natural" for Vision output past 100 pages
        if let Ok(order) = std::env::var("DOCSUM_SHARD_ORDER") {
            config.ocr.engine.shard_order = match order.to_lowercase().as_str() {
                "natural" => ShardOrder::Natural,
                _ => ShardOrder::Lexicographic,
            };
        }

        // Summarizer configuration
        if let Ok(min) = std::env::var("DOCSUM_MIN_INPUT_TOKENS") {
            match min.parse::<usize>() {
                Ok(min) => config.summarizer.min_input_tokens = min,
                Err(_) => warn!(value = %min, "Ignoring invalid DOCSUM_MIN_INPUT_TOKENS"),
            }
        }

        // Status database path
        if let Ok(path) = std::env::var("DOCSUM_STATUS_DB_PATH") {
            config.status_db_path = PathBuf::from(path);
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> DocsumConfigBuilder {
        DocsumConfigBuilder::default()
    }
}

/// Builder for DocsumConfig.
#[derive(Default)]
pub struct DocsumConfigBuilder {
    config: DocsumConfig,
}

impl DocsumConfigBuilder {
    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set object store configuration.
    pub fn storage(mut self, config: StorageConfig) -> Self {
        self.config.storage = config;
        self
    }

    /// Set OCR configuration.
    pub fn ocr(mut self, config: OcrConfig) -> Self {
        self.config.ocr = config;
        self
    }

    /// Set the batch OCR time budget.
    pub fn ocr_timeout(mut self, timeout: Duration) -> Self {
        self.config.ocr.engine.timeout = timeout;
        self
    }

    /// Set the minimum summarizable input size.
    pub fn min_input_tokens(mut self, tokens: usize) -> Self {
        self.config.summarizer.min_input_tokens = tokens;
        self
    }

    /// Set status database path.
    pub fn status_db_path(mut self, path: PathBuf) -> Self {
        self.config.status_db_path = path;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DocsumConfig {
        self.config
    }
}
