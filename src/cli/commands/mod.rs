//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod collections;
pub mod config;
pub mod ingest;
pub mod reset;
pub mod serve;
