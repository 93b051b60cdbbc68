//! Tool handlers for the MCP server.
//!
//! Every call goes through the same path: look the tool up in the registry,
//! validate the arguments against its schema, run the handler against the
//! injected remote clients, and wrap the flattened JSON in the result
//! envelope. Handlers never retry; the first failing remote call ends the
//! call with an error result.

mod feature_pr;
mod github;
mod issues;

#[cfg(test)]
pub(crate) mod fakes;

use std::future::Future;
use std::sync::Arc;

use bridge_core::config::DEFAULT_BASE_BRANCH;
use bridge_core::{Config, Error, IssueRecord, IssueTracker, RepoRef, Result, SourceHost};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::images::{ImageAnalyzer, PlaceholderAnalyzer};
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools::{self, DEFAULT_PAGE_SIZE};
use crate::validation;

/// Repository defaults applied when a GitHub tool call omits them.
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubDefaults {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub base_branch: String,
}

impl Default for GitHubDefaults {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
        }
    }
}

impl GitHubDefaults {
    pub fn from_config(config: &Config) -> Self {
        let github = config.github.as_ref();
        Self {
            owner: github.and_then(|g| g.owner.clone()),
            repo: github.and_then(|g| g.repo.clone()),
            base_branch: config.base_branch().to_string(),
        }
    }
}

/// Tool handler that executes tools against the remote clients.
pub struct ToolHandler {
    tracker: Arc<dyn IssueTracker>,
    host: Option<Arc<dyn SourceHost>>,
    analyzer: Arc<dyn ImageAnalyzer>,
    defaults: GitHubDefaults,
    tools: Vec<ToolDefinition>,
}

impl ToolHandler {
    /// Create a handler exposing only the issue tracker tools.
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            tracker,
            host: None,
            analyzer: Arc::new(PlaceholderAnalyzer),
            defaults: GitHubDefaults::default(),
            tools: tools::registry(false),
        }
    }

    /// Enable the GitHub tools.
    pub fn with_source_host(mut self, host: Arc<dyn SourceHost>, defaults: GitHubDefaults) -> Self {
        self.host = Some(host);
        self.defaults = defaults;
        self.tools = tools::registry(true);
        self
    }

    /// Replace the image analyzer used by get-issue.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Tool definitions for tools/list.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let Some(tool) = self.tools.iter().find(|t| t.name == name) else {
            return ToolCallResult::error(format!("Unknown tool: {}", name));
        };

        let args = arguments.unwrap_or_else(|| Value::Object(Default::default()));

        let outcome = match validation::validate(name, &tool.input_schema, &args) {
            Ok(()) => self.dispatch(name, strip_nulls(args)).await,
            Err(e) => Err(e),
        };

        match outcome.and_then(|value| Ok(serde_json::to_string_pretty(&value)?)) {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        debug!(tool = name, "Dispatching tool call");

        match name {
            tools::CREATE_ISSUE => self.create_issue(args).await,
            tools::LIST_ISSUES => self.list_issues(args).await,
            tools::UPDATE_ISSUE => self.update_issue(args).await,
            tools::GET_ISSUE => self.get_issue(args).await,
            tools::SEARCH_ISSUES => self.search_issues(args).await,
            tools::LIST_TEAMS => self.list_teams(args).await,
            tools::LIST_PROJECTS => self.list_projects(args).await,
            tools::ADD_COMMENT => self.add_comment(args).await,
            tools::GITHUB_CREATE_BRANCH => self.github_create_branch(args).await,
            tools::GITHUB_CREATE_PR => self.github_create_pr(args).await,
            tools::GITHUB_UPDATE_PR => self.github_update_pr(args).await,
            tools::GITHUB_GET_PR => self.github_get_pr(args).await,
            tools::GITHUB_LINK_PR_TO_ISSUE => self.github_link_pr_to_issue(args).await,
            tools::GITHUB_GET_PR_TEMPLATE => self.github_get_pr_template(args).await,
            tools::CREATE_FEATURE_PR => self.create_feature_pr(args).await,
            other => Err(Error::Validation(format!("Unknown tool: {}", other))),
        }
    }

    /// Look up an issue, turning an absent issue into an error.
    async fn find_issue(&self, id: &str) -> Result<IssueRecord> {
        self.tracker
            .issue(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Issue {}", id)))
    }

    fn source_host(&self) -> Result<&dyn SourceHost> {
        self.host
            .as_deref()
            .ok_or_else(|| Error::Config("GitHub tools are disabled".to_string()))
    }

    /// Repository from the call arguments, falling back to configuration.
    fn repo(&self, owner: Option<String>, repo: Option<String>) -> Result<RepoRef> {
        let owner = owner.or_else(|| self.defaults.owner.clone());
        let repo = repo.or_else(|| self.defaults.repo.clone());
        match (owner, repo) {
            (Some(owner), Some(repo)) => Ok(RepoRef::new(owner, repo)),
            (None, _) => Err(Error::Validation(
                "owner is required (pass it or set github.owner in the config)".to_string(),
            )),
            (_, None) => Err(Error::Validation(
                "repo is required (pass it or set github.repo in the config)".to_string(),
            )),
        }
    }

    fn base_branch(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.defaults.base_branch.clone())
    }
}

/// Deserialize validated arguments into a handler's parameter struct.
fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::Validation(format!("{}: invalid arguments: {}", tool, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Drop top-level `null` arguments so they read as "not given".
fn strip_nulls(args: Value) -> Value {
    match args {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}

fn page_size(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Await a reference lookup only when the reference is set.
async fn optional<T, F>(lookup: Option<F>) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    match lookup {
        Some(fut) => fut.await.map(Some),
        None => Ok(None),
    }
}
