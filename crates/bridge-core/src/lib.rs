//! Core traits, types, and error handling for linear-bridge.
//!
//! This crate provides the foundational abstractions shared by the remote
//! clients (Linear, GitHub) and the MCP dispatch layer.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use provider::{IssueTracker, SourceHost};
pub use types::*;
