//! GitHub tool handlers and the linking/template helpers they share with
//! create-feature-pr.

use bridge_core::{
    Branch, CreatePullRequestInput, Error, RepoRef, Result, SourceHost, UpdatePullRequestInput,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{parse_args, to_json, ToolHandler};
use crate::tools::{
    GITHUB_CREATE_BRANCH, GITHUB_CREATE_PR, GITHUB_GET_PR, GITHUB_GET_PR_TEMPLATE,
    GITHUB_LINK_PR_TO_ISSUE, GITHUB_UPDATE_PR,
};
use crate::views::{CreatedBranch, LinkedPullRequest, PrTemplate};

/// Where pull request templates are looked for, in order.
pub(super) const PR_TEMPLATE_PATHS: &[&str] = &[
    ".github/pull_request_template.md",
    ".github/PULL_REQUEST_TEMPLATE.md",
    "PULL_REQUEST_TEMPLATE.md",
    "docs/pull_request_template.md",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBranchArgs {
    branch: String,
    owner: Option<String>,
    repo: Option<String>,
    base_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePrArgs {
    title: String,
    head: String,
    owner: Option<String>,
    repo: Option<String>,
    base: Option<String>,
    body: Option<String>,
    draft: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePrArgs {
    pull_number: u64,
    owner: Option<String>,
    repo: Option<String>,
    title: Option<String>,
    body: Option<String>,
    state: Option<String>,
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullNumberArgs {
    pull_number: u64,
    owner: Option<String>,
    repo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkArgs {
    pull_number: u64,
    issue_id: String,
    owner: Option<String>,
    repo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoArgs {
    owner: Option<String>,
    repo: Option<String>,
}

impl ToolHandler {
    pub(super) async fn github_create_branch(&self, args: Value) -> Result<Value> {
        let args: CreateBranchArgs = parse_args(GITHUB_CREATE_BRANCH, args)?;
        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;
        let base = self.base_branch(args.base_branch);

        let branch = create_branch_from(host, &repo, &args.branch, &base).await?;
        to_json(&CreatedBranch {
            branch,
            base_branch: base,
            repository: repo.to_string(),
        })
    }

    pub(super) async fn github_create_pr(&self, args: Value) -> Result<Value> {
        let args: CreatePrArgs = parse_args(GITHUB_CREATE_PR, args)?;
        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;

        let input = CreatePullRequestInput {
            title: args.title,
            head: args.head,
            base: self.base_branch(args.base),
            body: args.body,
            draft: args.draft.unwrap_or(false),
        };
        let pr = host.create_pull_request(&repo, &input).await?;
        info!(repo = %repo, number = pr.number, "Pull request created");
        to_json(&pr)
    }

    pub(super) async fn github_update_pr(&self, args: Value) -> Result<Value> {
        let args: UpdatePrArgs = parse_args(GITHUB_UPDATE_PR, args)?;
        let input = UpdatePullRequestInput {
            title: args.title,
            body: args.body,
            state: args.state,
            base: args.base,
        };
        if input == UpdatePullRequestInput::default() {
            return Err(Error::Validation(format!(
                "{}: no fields to update",
                GITHUB_UPDATE_PR
            )));
        }

        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;
        let pr = host
            .update_pull_request(&repo, args.pull_number, &input)
            .await?;
        info!(repo = %repo, number = pr.number, "Pull request updated");
        to_json(&pr)
    }

    pub(super) async fn github_get_pr(&self, args: Value) -> Result<Value> {
        let args: PullNumberArgs = parse_args(GITHUB_GET_PR, args)?;
        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;
        to_json(&host.pull_request(&repo, args.pull_number).await?)
    }

    pub(super) async fn github_link_pr_to_issue(&self, args: Value) -> Result<Value> {
        let args: LinkArgs = parse_args(GITHUB_LINK_PR_TO_ISSUE, args)?;
        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;
        let linked = link_pull_request(host, &repo, args.pull_number, &args.issue_id).await?;
        to_json(&linked)
    }

    pub(super) async fn github_get_pr_template(&self, args: Value) -> Result<Value> {
        let args: RepoArgs = parse_args(GITHUB_GET_PR_TEMPLATE, args)?;
        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;
        to_json(&find_pr_template(host, &repo).await?)
    }
}

/// Create `branch` at the current head of `base`.
pub(super) async fn create_branch_from(
    host: &dyn SourceHost,
    repo: &RepoRef,
    branch: &str,
    base: &str,
) -> Result<Branch> {
    let sha = host.branch_head(repo, base).await?;
    let created = host.create_branch(repo, branch, &sha).await?;
    info!(repo = %repo, branch = branch, base = base, sha = %sha, "Branch created");
    Ok(created)
}

/// Closing keyword line that links a pull request to an issue.
pub(super) fn fixes_marker(issue: &str) -> String {
    format!("Fixes {}", issue)
}

/// Whether `body` already carries the marker for exactly this issue
/// (`Fixes ENG-1` must not match `Fixes ENG-12`).
fn has_marker(body: &str, marker: &str) -> bool {
    body.match_indices(marker).any(|(start, _)| {
        body[start + marker.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '-' || c == '_'))
    })
}

/// Body with the marker appended after a blank line, or `None` when the
/// body already links the issue.
pub(super) fn body_with_marker(body: Option<&str>, issue: &str) -> Option<String> {
    let marker = fixes_marker(issue);
    let body = body.unwrap_or_default();
    if has_marker(body, &marker) {
        return None;
    }

    let trimmed = body.trim_end();
    if trimmed.is_empty() {
        Some(marker)
    } else {
        Some(format!("{}\n\n{}", trimmed, marker))
    }
}

/// Ensure the pull request body references the issue. Idempotent: when the
/// marker is present nothing is written.
pub(super) async fn link_pull_request(
    host: &dyn SourceHost,
    repo: &RepoRef,
    number: u64,
    issue: &str,
) -> Result<LinkedPullRequest> {
    let pr = host.pull_request(repo, number).await?;

    let Some(body) = body_with_marker(pr.body.as_deref(), issue) else {
        debug!(repo = %repo, number = number, issue = issue, "Pull request already linked");
        return Ok(LinkedPullRequest {
            pull_request: pr,
            updated: false,
        });
    };

    let update = UpdatePullRequestInput {
        body: Some(body),
        ..Default::default()
    };
    let pr = host.update_pull_request(repo, number, &update).await?;
    info!(repo = %repo, number = number, issue = issue, "Pull request linked to issue");

    Ok(LinkedPullRequest {
        pull_request: pr,
        updated: true,
    })
}

/// First pull request template found in the repository, if any.
pub(super) async fn find_pr_template(
    host: &dyn SourceHost,
    repo: &RepoRef,
) -> Result<Option<PrTemplate>> {
    for path in PR_TEMPLATE_PATHS {
        match host.file_contents(repo, path).await {
            Ok(content) => {
                return Ok(Some(PrTemplate {
                    path: path.to_string(),
                    content,
                }))
            }
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
