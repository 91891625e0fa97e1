//! Domain errors for the policy assistant.

use std::path::PathBuf;
use thiserror::Error;

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

/// Broad classification of a [`DomainError`], used to decide how a failure is
/// surfaced (fatal at startup, apology to the user, skip-and-continue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misconfiguration. Must stop startup or ingestion.
    Configuration,
    /// Network, timeout or rate-limit failure of an external service.
    Transient,
    /// A single unreadable input; the surrounding run continues.
    Data,
    /// Anything else (store failures, permanent provider rejections).
    Internal,
}

/// Domain-level errors that can occur in the ingestion and query pipelines.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("API key for {provider} is not configured. Set GEMINI_API_KEY or provider.api_key")]
    MissingApiKey { provider: String },

    #[error("Source directory not found: {}", .0.display())]
    SourceDirectoryNotFound(PathBuf),

    #[error("Source path is not a directory: {}", .0.display())]
    SourceNotADirectory(PathBuf),

    #[error("Embedding dimension mismatch ({context}): expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Collection '{collection}' was built with embedding model '{stored}' but '{configured}' is configured"
    )]
    EmbeddingModelMismatch {
        collection: String,
        stored: String,
        configured: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read document {}: {reason}", .path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("{provider} request to {endpoint} failed{}: {message}", format_status(.status))]
    Provider {
        provider: String,
        endpoint: String,
        status: Option<u16>,
        message: String,
        transient: bool,
    },

    #[error("{stage} timed out after {after_ms}ms")]
    Timeout { stage: String, after_ms: u64 },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingApiKey { .. }
            | Self::SourceDirectoryNotFound(_)
            | Self::SourceNotADirectory(_)
            | Self::DimensionMismatch { .. }
            | Self::EmbeddingModelMismatch { .. }
            | Self::InvalidArgument(_) => ErrorKind::Configuration,
            Self::Timeout { .. } => ErrorKind::Transient,
            Self::Provider { transient, .. } => {
                if *transient {
                    ErrorKind::Transient
                } else {
                    ErrorKind::Internal
                }
            }
            Self::DocumentUnreadable { .. } => ErrorKind::Data,
            Self::DatabaseError(_) | Self::SerializationError(_) | Self::TaskFailed(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns true if retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Returns true if this error means the deployment is misconfigured.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
