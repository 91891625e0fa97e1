//! Infrastructure adapters for external systems.

pub mod gemini;
pub mod http;
pub mod sqlite;
