use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ingest::IngestPolicy;

/// Main configuration structure for the policy assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Hosted embedding and generation provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Ingestion and retrieval settings
    #[serde(default)]
    pub rag: RagConfig,

    /// Vector store database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Google Gemini provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    /// API key. Falls back to `GEMINI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// REST base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model identifier; stored with every collection
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Output dimensionality of the embedding model
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Generative model identifier
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Sampling temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Timeout for a single provider request or pipeline stage
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Token bucket quota shared by embedding and generation requests
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Texts per batch embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

const fn default_embedding_dimension() -> usize {
    768
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

const fn default_temperature() -> f32 {
    0.1
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_requests_per_minute() -> u32 {
    1500
}

const fn default_embedding_batch_size() -> usize {
    100
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            generation_model: default_generation_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            requests_per_minute: default_requests_per_minute(),
            embedding_batch_size: default_embedding_batch_size(),
        }
    }
}

impl ProviderConfig {
    /// The API key with surrounding whitespace removed, if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Ingestion and retrieval configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RagConfig {
    /// Directory scanned for policy documents
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Collection the documents are stored in and queried from
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// File extensions to ingest
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Policy applied when the collection already has entries
    #[serde(default)]
    pub ingest_policy: IngestPolicy,

    /// Run ingestion when `ask`, `chat` or `serve` start
    #[serde(default = "default_true")]
    pub ingest_on_startup: bool,

    /// Embedding batches in flight during ingestion
    #[serde(default = "default_embedding_concurrency")]
    pub embedding_concurrency: usize,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("data/attachments")
}

fn default_collection_name() -> String {
    "bus_policy_info".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

const fn default_chunk_size() -> usize {
    512
}

const fn default_chunk_overlap() -> usize {
    50
}

const fn default_top_k() -> usize {
    4
}

const fn default_true() -> bool {
    true
}

const fn default_embedding_concurrency() -> usize {
    4
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            collection_name: default_collection_name(),
            extensions: default_extensions(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            ingest_policy: IngestPolicy::default(),
            ingest_on_startup: default_true(),
            embedding_concurrency: default_embedding_concurrency(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Directory holding `vectors.db`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".policy-rag/data")
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// Path of the SQLite file backing the vector store.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("vectors.db")
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// File rotation: hourly, daily or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow cross-origin requests from the booking frontend
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_deployment() {
        let config = Config::default();
        assert_eq!(config.rag.collection_name, "bus_policy_info");
        assert_eq!(config.rag.chunk_size, 512);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.rag.top_k, 4);
        assert_eq!(config.provider.embedding_model, "text-embedding-004");
        assert_eq!(config.provider.generation_model, "gemini-2.5-flash");
        assert!(config.provider.api_key.is_none());
        assert_eq!(
            config.database.database_path(),
            PathBuf::from(".policy-rag/data/vectors.db")
        );
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let provider = ProviderConfig {
            api_key: Some("   ".to_string()),
            ..ProviderConfig::default()
        };
        assert!(provider.api_key().is_none());

        let provider = ProviderConfig {
            api_key: Some(" AIzaKey ".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(provider.api_key(), Some("AIzaKey"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "rag:\n  top_k: 7\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rag.top_k, 7);
        assert_eq!(config.rag.chunk_size, 512);
        assert_eq!(config.server.port, 8000);
    }
}
