//! MCP (Model Context Protocol) server for linear-bridge.
//!
//! Exposes Linear issue tracking, and optionally GitHub branch and pull
//! request operations, as schema-described tools over stdio JSON-RPC.

pub mod handlers;
pub mod images;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;
pub mod validation;
mod views;

pub use handlers::{GitHubDefaults, ToolHandler};
pub use images::{ImageAnalyzer, InlineImageAnalyzer, PlaceholderAnalyzer};
pub use server::McpServer;
