//! Application wiring shared by the CLI and the HTTP server.

pub mod context;

pub use context::RagContext;
