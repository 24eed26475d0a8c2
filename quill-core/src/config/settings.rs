//! Settings loaded from the TOML configuration file.
//!
//! All fields carry serde defaults so a missing file or a partial file
//! resolves to a fully usable configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level settings tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default)]
    pub search: SearchDefaults,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub tools: ToolsSettings,
}

impl Settings {
    /// Load settings from the default XDG location, falling back to
    /// defaults when no config file exists.
    pub fn load() -> Result<Self, SettingsError> {
        match config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quill").join("config.toml"))
}

/// Language-model collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_name")]
    pub model: String,
    /// Request timeout for completion calls. The only timeout in the
    /// system; everything else blocks until the collaborator answers.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: default_model_name(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

/// Document index settings: paths, chunking, embedding collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Folder holding the active source documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Folder that receives archived documents on clear.
    #[serde(default = "default_unused_dir")]
    pub unused_dir: PathBuf,
    /// SQLite database file for the vector collection.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Embedding dimensionality. When unset, taken from the first
    /// embedding the collaborator returns.
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_embedding_batch")]
    pub embedding_batch: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            unused_dir: default_unused_dir(),
            db_path: default_db_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            embedding_batch: default_embedding_batch(),
        }
    }
}

/// Similarity-search tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    /// Results fetched when assembling answer context.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Results fetched by the local-search tool inside the loop.
    #[serde(default = "default_tool_top_k")]
    pub tool_top_k: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            tool_top_k: default_tool_top_k(),
        }
    }
}

/// Relevance-gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    /// Classification score above which a query counts as in-domain.
    /// Deliberately low: the zero-shot classifier under-scores true
    /// positives.
    #[serde(default = "default_domain_threshold")]
    pub domain_threshold: f32,
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            domain_threshold: default_domain_threshold(),
            classifier_url: default_classifier_url(),
            classifier_model: default_classifier_model(),
        }
    }
}

/// Reasoning-loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Hard cap on think/act/observe iterations per turn.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Token budget for the rolling conversation memory.
    #[serde(default = "default_memory_token_limit")]
    pub memory_token_limit: u32,
    /// Number of recent turns shown to the history-relevance oracle.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            memory_token_limit: default_memory_token_limit(),
            history_window: default_history_window(),
        }
    }
}

/// Tool configuration tree (`[tools.web.search]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsSettings {
    #[serde(default)]
    pub web: WebToolsSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebToolsSettings {
    #[serde(default)]
    pub search: WebSearchSettings,
}

/// Web-search tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchSettings {
    #[serde(default = "default_web_search_enabled")]
    pub enabled: bool,
    #[serde(default = "default_web_search_provider")]
    pub provider: String,
    #[serde(default = "default_web_search_max_results")]
    pub max_results: usize,
    #[serde(default = "default_web_search_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_web_search_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_web_search_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            enabled: default_web_search_enabled(),
            provider: default_web_search_provider(),
            max_results: default_web_search_max_results(),
            timeout_seconds: default_web_search_timeout_seconds(),
            min_interval_ms: default_web_search_min_interval_ms(),
            cache_ttl_minutes: default_web_search_cache_ttl_minutes(),
        }
    }
}

fn default_model_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model_name() -> String {
    "llama3.1".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    120
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_unused_dir() -> PathBuf {
    PathBuf::from("unused_data")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("db/index.sqlite3")
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_batch() -> usize {
    32
}

fn default_top_k() -> usize {
    5
}

fn default_tool_top_k() -> usize {
    3
}

fn default_domain_threshold() -> f32 {
    0.1
}

fn default_classifier_url() -> String {
    "http://127.0.0.1:8085".to_string()
}

fn default_classifier_model() -> String {
    "bart-large-mnli".to_string()
}

fn default_max_iterations() -> usize {
    20
}

fn default_memory_token_limit() -> u32 {
    1500
}

fn default_history_window() -> usize {
    10
}

fn default_web_search_enabled() -> bool {
    false
}

fn default_web_search_provider() -> String {
    "brave".to_string()
}

fn default_web_search_max_results() -> usize {
    5
}

fn default_web_search_timeout_seconds() -> u64 {
    30
}

fn default_web_search_min_interval_ms() -> u64 {
    1100
}

fn default_web_search_cache_ttl_minutes() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_resolves_to_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.index.chunk_size, 1024);
        assert_eq!(settings.index.chunk_overlap, 100);
        assert_eq!(settings.agent.max_iterations, 20);
        assert_eq!(settings.search.top_k, 5);
        assert!((settings.gate.domain_threshold - 0.1).abs() < f32::EPSILON);
        assert!(!settings.tools.web.search.enabled);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let settings: Settings = toml::from_str(
            r#"
            [index]
            chunk_size = 512

            [gate]
            domain_threshold = 0.35

            [tools.web.search]
            enabled = true
            max_results = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.index.chunk_size, 512);
        assert_eq!(settings.index.chunk_overlap, 100);
        assert!((settings.gate.domain_threshold - 0.35).abs() < f32::EPSILON);
        assert!(settings.tools.web.search.enabled);
        assert_eq!(settings.tools.web.search.max_results, 3);
        assert_eq!(settings.tools.web.search.timeout_seconds, 30);
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\nmodel = \"qwen3\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.model.model, "qwen3");
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Settings::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(err, Err(SettingsError::Io { .. })));
    }
}
