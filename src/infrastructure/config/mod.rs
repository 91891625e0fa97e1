//! Configuration management infrastructure
//!
//! Layered configuration using figment: defaults, project YAML files, an
//! optional explicit file and `POLICY_RAG_*` environment overrides.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, API_KEY_ENV, CONFIG_DIR};
