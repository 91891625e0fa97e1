//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty formatting on stderr
//! - Optional rolling log files
//! - Secret scrubbing for provider error bodies

pub mod logger;
pub mod secret_scrubbing;

pub use logger::{parse_log_level, parse_rotation, LoggerImpl};
pub use secret_scrubbing::SecretScrubber;
