//! Corpus configuration management.
//!
//! Describes which documents to index and how, loaded from
//! `.docqa/corpus.yaml`. A missing file means an empty corpus with defaults.

use crate::chunker::ChunkerConfig;
use crate::embeddings::EmbeddingConfig;
use crate::index::IndexOptions;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the pipeline does when the routing call itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingFallback {
    /// Surface the routing error to the caller
    #[default]
    Fail,
    /// Log the error and search every indexed document
    AllDocuments,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Terms redacted in addition to the built-in rules
    #[serde(default)]
    pub redact: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Document id -> file path or http(s) URL
    #[serde(default)]
    pub documents: BTreeMap<String, String>,

    /// Chunk window, in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per routed document
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Deadline for each embedding, LLM or fetch call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Documents indexed concurrently at startup
    #[serde(default = "default_build_concurrency")]
    pub build_concurrency: usize,

    #[serde(default)]
    pub routing_fallback: RoutingFallback,

    #[serde(default)]
    pub compliance: ComplianceConfig,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_build_concurrency() -> usize {
    4
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding: EmbeddingConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            build_concurrency: default_build_concurrency(),
            routing_fallback: RoutingFallback::default(),
            compliance: ComplianceConfig::default(),
        }
    }
}

impl CorpusConfig {
    /// Check every parameter the pipeline relies on.
    pub fn validate(&self) -> AppResult<()> {
        self.chunker()?;
        self.embedding.validate()?;

        if self.top_k == 0 {
            return Err(AppError::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.build_concurrency == 0 {
            return Err(AppError::InvalidConfiguration(
                "build_concurrency must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfiguration(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(id) = self.documents.keys().find(|id| id.trim().is_empty()) {
            return Err(AppError::InvalidConfiguration(format!(
                "document id '{}' is blank",
                id
            )));
        }
        Ok(())
    }

    pub fn chunker(&self) -> AppResult<ChunkerConfig> {
        ChunkerConfig::new(self.chunk_size, self.chunk_overlap)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            metric: self.embedding.metric,
            batch_size: self.embedding.batch_size,
            timeout: self.request_timeout(),
        }
    }
}

/// Load `.docqa/corpus.yaml`, or defaults when it does not exist.
pub fn load_config(workspace: &Path) -> AppResult<CorpusConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No corpus config at {:?}, using defaults", config_path);
        return Ok(CorpusConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read corpus config at {:?}: {}", config_path, e))
    })?;

    let config: CorpusConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse corpus config at {:?}: {}", config_path, e))
    })?;

    tracing::debug!(
        "Loaded corpus config with {} documents from {:?}",
        config.documents.len(),
        config_path
    );
    Ok(config)
}

/// Write `config` to `.docqa/corpus.yaml`, creating the directory if needed.
pub fn save_config(workspace: &Path, config: &CorpusConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!(
            "Failed to write corpus config to {:?}: {}",
            config_path, e
        ))
    })?;

    tracing::debug!("Saved corpus config to {:?}", config_path);
    Ok(())
}

/// Resolve relative file locations against the workspace; URLs are left alone.
pub fn resolve_location(workspace: &Path, location: &str) -> String {
    if crate::loader::is_url(location) || Path::new(location).is_absolute() {
        return location.to_string();
    }
    workspace.join(location).to_string_lossy().into_owned()
}

pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".docqa").join("corpus.yaml")
}
