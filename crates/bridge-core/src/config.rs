//! Configuration management for linear-bridge.
//!
//! Settings come from an optional TOML file stored in a platform-specific
//! location:
//!
//! - **macOS/Linux**: `~/.config/linear-bridge/config.toml`
//! - **Windows**: `%APPDATA%\linear-bridge\config.toml`
//!
//! Credentials never live in the file. They are read from the environment
//! (`LINEAR_API_KEY`, `GITHUB_TOKEN`) by [`Credentials`].
//!
//! # Example
//!
//! ```ignore
//! use bridge_core::config::{Config, Credentials};
//!
//! let config = Config::load()?;
//! let credentials = Credentials::from_env(true)?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "linear-bridge";

/// Default Linear GraphQL endpoint.
pub const DEFAULT_LINEAR_URL: &str = "https://api.linear.app/graphql";

/// Default GitHub REST endpoint.
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";

/// Branch new feature branches start from when nothing else is configured.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Environment variable holding the Linear API key.
pub const LINEAR_API_KEY_VAR: &str = "LINEAR_API_KEY";

/// Environment variable holding the GitHub personal access token.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub linear: LinearConfig,

    /// GitHub configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfig>,

    #[serde(default)]
    pub images: ImagesConfig,
}

/// Linear API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearConfig {
    /// GraphQL endpoint
    #[serde(default = "default_linear_url")]
    pub api_url: String,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            api_url: default_linear_url(),
        }
    }
}

/// GitHub provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Default repository owner (user or organization)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Default repository name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// GitHub API base URL (for GitHub Enterprise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Branch feature branches are cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
}

/// How embedded images are handed to the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Report the URL with a fixed placeholder analysis.
    #[default]
    Placeholder,
    /// Fetch the bytes and inline them as a base64 data URI.
    Inline,
}

impl std::str::FromStr for ImageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "placeholder" => Ok(ImageMode::Placeholder),
            "inline" => Ok(ImageMode::Inline),
            other => Err(Error::Config(format!(
                "Unknown image mode '{}'. Expected 'placeholder' or 'inline'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageMode::Placeholder => write!(f, "placeholder"),
            ImageMode::Inline => write!(f, "inline"),
        }
    }
}

/// Image handling configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default)]
    pub mode: ImageMode,
}

fn default_linear_url() -> String {
    DEFAULT_LINEAR_URL.to_string()
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Branch feature branches are cut from.
    pub fn base_branch(&self) -> &str {
        self.github
            .as_ref()
            .and_then(|g| g.base_branch.as_deref())
            .unwrap_or(DEFAULT_BASE_BRANCH)
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `github.owner`, `images.mode`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "linear" => match field {
                "api_url" | "url" => self.linear.api_url = value.to_string(),
                _ => {
                    return Err(Error::Config(format!(
                        "Unknown Linear config field: {}",
                        field
                    )))
                }
            },
            "github" => {
                let config = self.github.get_or_insert_with(GitHubConfig::default);
                match field {
                    "owner" => config.owner = Some(value.to_string()),
                    "repo" => config.repo = Some(value.to_string()),
                    "base_url" | "url" => config.base_url = Some(value.to_string()),
                    "base_branch" => config.base_branch = Some(value.to_string()),
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown GitHub config field: {}",
                            field
                        )))
                    }
                }
            }
            "images" => match field {
                "mode" => self.images.mode = value.parse()?,
                _ => {
                    return Err(Error::Config(format!(
                        "Unknown images config field: {}",
                        field
                    )))
                }
            },
            _ => {
                return Err(Error::Config(format!("Unknown section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `github.owner`, `images.mode`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "linear" => match field {
                "api_url" | "url" => Ok(Some(self.linear.api_url.clone())),
                _ => Err(Error::Config(format!(
                    "Unknown Linear config field: {}",
                    field
                ))),
            },
            "github" => {
                let Some(config) = &self.github else {
                    return Ok(None);
                };
                match field {
                    "owner" => Ok(config.owner.clone()),
                    "repo" => Ok(config.repo.clone()),
                    "base_url" | "url" => Ok(config.base_url.clone()),
                    "base_branch" => Ok(config.base_branch.clone()),
                    _ => Err(Error::Config(format!(
                        "Unknown GitHub config field: {}",
                        field
                    ))),
                }
            }
            "images" => match field {
                "mode" => Ok(Some(self.images.mode.to_string())),
                _ => Err(Error::Config(format!(
                    "Unknown images config field: {}",
                    field
                ))),
            },
            _ => Err(Error::Config(format!("Unknown section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Credentials
// =============================================================================

/// API tokens read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub linear_api_key: String,
    /// `None` when GitHub tools are disabled.
    pub github_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("linear_api_key", &"<redacted>")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    ///
    /// `LINEAR_API_KEY` is always required; `GITHUB_TOKEN` only when
    /// `with_github` is set. A missing or blank variable is an error.
    pub fn from_env(with_github: bool) -> Result<Self> {
        Self::from_lookup(with_github, |name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup function.
    pub fn from_lookup<F>(with_github: bool, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str, purpose: &str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{} environment variable is required ({})",
                        name, purpose
                    ))
                })
        };

        let linear_api_key = require(LINEAR_API_KEY_VAR, "Linear API key")?;
        let github_token = if with_github {
            Some(require(
                GITHUB_TOKEN_VAR,
                "GitHub personal access token; pass --no-github to run without GitHub tools",
            )?)
        } else {
            None
        };

        Ok(Self {
            linear_api_key,
            github_token,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
