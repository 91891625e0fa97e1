//! HTTP surface of the policy assistant.

pub mod policy_http;

pub use policy_http::{PolicyHttpConfig, PolicyHttpServer};
