use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::ChunkingConfig;

/// Directory, relative to the project root, holding the config files.
pub const CONFIG_DIR: &str = ".policy-rag";

/// Environment variable read when `provider.api_key` is not set anywhere else.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Invalid chunking configuration: {0}")]
    InvalidChunking(String),

    #[error("Invalid top_k: {0}. Must be at least 1")]
    InvalidTopK(usize),

    #[error("Invalid embedding_dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid {field}: {value}. Must be at least 1")]
    InvalidLimit { field: &'static str, value: u64 },

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: hourly, daily, never")]
    InvalidRotation(String),

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .policy-rag/config.yaml
    /// 3. .policy-rag/local.yaml
    /// 4. `explicit` file, when given
    /// 5. Environment variables (POLICY_RAG_* prefix, `__` for nesting)
    ///
    /// `GEMINI_API_KEY` fills `provider.api_key` only when no layer set it.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        Self::load_from_dir(Path::new("."), explicit)
    }

    /// Same as [`ConfigLoader::load`] with config files resolved under `project_dir`.
    pub fn load_from_dir(project_dir: &Path, explicit: Option<&Path>) -> Result<Config> {
        let config_dir = project_dir.join(CONFIG_DIR);
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")));

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed("POLICY_RAG_").split("__"))
            .join(
                Env::raw()
                    .only(&[API_KEY_ENV])
                    .map(|_| "provider.api_key".into()),
            )
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading. A missing API key is not a
    /// configuration error here; startup reports it.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let provider = &config.provider;
        if provider.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyField("provider.base_url"));
        }
        if provider.embedding_model.trim().is_empty() {
            return Err(ConfigError::EmptyField("provider.embedding_model"));
        }
        if provider.generation_model.trim().is_empty() {
            return Err(ConfigError::EmptyField("provider.generation_model"));
        }
        if provider.embedding_dimension == 0 {
            return Err(ConfigError::InvalidDimension(provider.embedding_dimension));
        }
        if !(0.0..=2.0).contains(&provider.temperature) {
            return Err(ConfigError::InvalidTemperature(provider.temperature));
        }
        for (field, value) in [
            ("provider.request_timeout_secs", provider.request_timeout_secs),
            ("provider.requests_per_minute", u64::from(provider.requests_per_minute)),
            ("provider.embedding_batch_size", provider.embedding_batch_size as u64),
            ("rag.embedding_concurrency", config.rag.embedding_concurrency as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidLimit { field, value });
            }
        }

        let rag = &config.rag;
        if rag.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("rag.source_dir"));
        }
        if rag.collection_name.trim().is_empty() {
            return Err(ConfigError::EmptyField("rag.collection_name"));
        }
        if rag.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::EmptyField("rag.extensions"));
        }
        ChunkingConfig::new(rag.chunk_size, rag.chunk_overlap)
            .validate()
            .map_err(ConfigError::InvalidChunking)?;
        if rag.top_k == 0 {
            return Err(ConfigError::InvalidTopK(rag.top_k));
        }

        if config.database.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("database.data_dir"));
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let level = config.logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let format = config.logging.format.to_lowercase();
        if !["json", "pretty"].contains(&format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let rotation = config.logging.rotation.to_lowercase();
        if !["hourly", "daily", "never"].contains(&rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.server.host.trim().is_empty() {
            return Err(ConfigError::EmptyField("server.host"));
        }

        Ok(())
    }

    /// A copy of `config` safe to print: the API key is masked.
    pub fn redacted(config: &Config) -> Config {
        let mut redacted = config.clone();
        if redacted.provider.api_key.is_some() {
            redacted.provider.api_key = Some("[REDACTED]".to_string());
        }
        redacted
    }
}
