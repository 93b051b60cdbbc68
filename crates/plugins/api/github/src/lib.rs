//! GitHub source host implementation for linear-bridge.
//!
//! This crate provides the branch, pull request and repository content
//! calls the bridge needs from the GitHub REST API.

mod client;
mod types;

pub use client::GitHubClient;
pub use types::*;

/// Default GitHub API URL.
pub const DEFAULT_GITHUB_URL: &str = bridge_core::config::DEFAULT_GITHUB_URL;
