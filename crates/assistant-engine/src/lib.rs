//! assistant-engine: client library for the Assistant Engine API
//!
//! This crate wraps the conversation and task endpoints of an Assistant
//! Engine deployment. Responses are hydrated into typed snapshots
//! ([`models::Conversation`], [`models::TaskOutput`]) and task runs can be
//! polled to completion.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod polling;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::AssistantEngine;
pub use config::ClientConfig;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use polling::PollPolicy;
pub use transport::{ReqwestTransport, Transport, TransportConfig};

/// Application name used for config directories and paths.
pub const APP_NAME: &str = "assistant-engine";

/// Returns the environment variable prefix for this application.
pub fn env_prefix() -> String {
    "ASSISTANT_ENGINE".to_string()
}
