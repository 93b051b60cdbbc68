//! Linear issue tracker implementation for linear-bridge.
//!
//! Talks to the Linear GraphQL API and maps its responses onto the
//! records defined in `bridge-core`.

mod client;
pub mod filter;
mod queries;
mod types;

pub use client::LinearClient;
pub use types::*;

/// Default Linear GraphQL endpoint.
pub const DEFAULT_LINEAR_URL: &str = bridge_core::config::DEFAULT_LINEAR_URL;

/// Host serving files uploaded to Linear. Downloads need the API key.
pub const UPLOADS_HOST: &str = "uploads.linear.app";
