//! create-feature-pr: issue → branch → pull request → link.
//!
//! The steps run strictly in order and nothing is rolled back. When a step
//! fails, the error names the step and lists what earlier steps created so
//! the caller can finish or clean up by hand.

use std::fmt;

use bridge_core::{
    Branch, CreatePullRequestInput, Error, IssueRecord, PullRequest, RepoRef, Result, SourceHost,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::github::{create_branch_from, find_pr_template, link_pull_request};
use super::{parse_args, to_json, ToolHandler};
use crate::tools::CREATE_FEATURE_PR;
use crate::views::FeaturePr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeaturePrArgs {
    issue_id: String,
    owner: Option<String>,
    repo: Option<String>,
    base_branch: Option<String>,
    draft: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CreateBranch,
    CreatePullRequest,
    LinkIssue,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateBranch => write!(f, "step 1 (create branch)"),
            Step::CreatePullRequest => write!(f, "step 2 (create pull request)"),
            Step::LinkIssue => write!(f, "step 3 (link pull request to issue)"),
        }
    }
}

/// What the pipeline has created so far.
#[derive(Debug, Default)]
struct Created {
    branch: Option<Branch>,
    pull_request: Option<PullRequest>,
}

impl Created {
    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(branch) = &self.branch {
            parts.push(format!("branch '{}'", branch.name));
        }
        if let Some(pr) = &self.pull_request {
            parts.push(format!("pull request #{} ({})", pr.number, pr.url));
        }
        if parts.is_empty() {
            "nothing".to_string()
        } else {
            parts.join(", ")
        }
    }

    fn failed(&self, step: Step, source: Error) -> Error {
        Error::Other(anyhow::anyhow!(
            "{} failed at {}: {}. Already created: {}",
            CREATE_FEATURE_PR,
            step,
            source,
            self.describe()
        ))
    }
}

/// The tracker's precomputed branch name, if it has a usable one.
fn branch_name(issue: &IssueRecord) -> Result<String> {
    issue
        .branch_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            Error::Validation(format!(
                "{}: issue {} has no branch name",
                CREATE_FEATURE_PR, issue.identifier
            ))
        })
}

fn pull_request_title(issue: &IssueRecord) -> String {
    format!("{}: {}", issue.identifier, issue.title)
}

impl ToolHandler {
    pub(super) async fn create_feature_pr(&self, args: Value) -> Result<Value> {
        let args: FeaturePrArgs = parse_args(CREATE_FEATURE_PR, args)?;
        let host = self.source_host()?;
        let repo = self.repo(args.owner, args.repo)?;
        let base = self.base_branch(args.base_branch);

        let issue = self.find_issue(&args.issue_id).await?;
        let head = branch_name(&issue)?;

        let mut created = Created::default();

        let branch = create_branch_from(host, &repo, &head, &base)
            .await
            .map_err(|e| created.failed(Step::CreateBranch, e))?;
        created.branch = Some(branch.clone());

        let input = CreatePullRequestInput {
            title: pull_request_title(&issue),
            head: branch.name.clone(),
            base,
            body: self.pull_request_body(host, &repo, &issue).await,
            draft: args.draft.unwrap_or(false),
        };
        let pr = host
            .create_pull_request(&repo, &input)
            .await
            .map_err(|e| created.failed(Step::CreatePullRequest, e))?;
        info!(repo = %repo, number = pr.number, issue = %issue.identifier, "Feature pull request created");
        created.pull_request = Some(pr.clone());

        let linked = link_pull_request(host, &repo, pr.number, &issue.identifier)
            .await
            .map_err(|e| created.failed(Step::LinkIssue, e))?;

        to_json(&FeaturePr {
            issue: issue.identifier,
            branch,
            pull_request: linked.pull_request,
        })
    }

    /// Issue description, else the repository template, else nothing.
    async fn pull_request_body(
        &self,
        host: &dyn SourceHost,
        repo: &RepoRef,
        issue: &IssueRecord,
    ) -> Option<String> {
        if let Some(description) = issue
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
        {
            return Some(description.to_string());
        }

        match find_pr_template(host, repo).await {
            Ok(template) => template.map(|t| t.content),
            Err(e) => {
                warn!(repo = %repo, error = %e, "Pull request template lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fakes::{FailAt, FakeHost, FakeTracker, MockHost};
    use super::super::GitHubDefaults;
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn defaults() -> GitHubDefaults {
        GitHubDefaults {
            owner: Some("acme".to_string()),
            repo: Some("web".to_string()),
            base_branch: "develop".to_string(),
        }
    }

    fn tracker_with(description: Option<&str>, branch_name: Option<&str>) -> FakeTracker {
        let tracker = FakeTracker::default();
        tracker.insert(IssueRecord {
            id: "issue-1".to_string(),
            identifier: "ENG-1".to_string(),
            title: "Crash on save".to_string(),
            description: description.map(String::from),
            branch_name: branch_name.map(String::from),
            ..Default::default()
        });
        tracker
    }

    fn handler(tracker: FakeTracker, host: Arc<FakeHost>) -> ToolHandler {
        ToolHandler::new(Arc::new(tracker)).with_source_host(host, defaults())
    }

    fn host() -> FakeHost {
        FakeHost::default()
            .with_head("develop", "sha-dev")
            .with_head("main", "sha-main")
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let host = Arc::new(host());
        let handler = handler(
            tracker_with(Some("Saving crashes."), Some("ada/eng-1-crash-on-save")),
            host.clone(),
        );

        let result = handler
            .execute(
                "create-feature-pr",
                Some(json!({"issueId": "ENG-1", "draft": true})),
            )
            .await;
        assert!(!result.is_error(), "{}", result.text_content());
        let value: Value = serde_json::from_str(result.text_content()).unwrap();

        assert_eq!(value["issue"], "ENG-1");
        assert_eq!(value["branch"]["name"], "ada/eng-1-crash-on-save");
        assert_eq!(value["branch"]["sha"], "sha-dev");
        assert_eq!(value["pullRequest"]["title"], "ENG-1: Crash on save");
        assert_eq!(value["pullRequest"]["base"], "develop");
        assert_eq!(value["pullRequest"]["draft"], true);
        assert_eq!(value["pullRequest"]["body"], "Saving crashes.\n\nFixes ENG-1");

        assert_eq!(
            host.calls(),
            vec![
                "branch_head acme/web develop".to_string(),
                "create_branch acme/web ada/eng-1-crash-on-save sha-dev".to_string(),
                "create_pull_request acme/web ada/eng-1-crash-on-save -> develop".to_string(),
                "pull_request acme/web 1".to_string(),
                "update_pull_request acme/web 1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_base_branch_argument_wins() {
        let host = Arc::new(host());
        let handler = handler(tracker_with(Some("d"), Some("eng-1")), host.clone());

        let result = handler
            .execute(
                "create-feature-pr",
                Some(json!({"issueId": "ENG-1", "baseBranch": "main"})),
            )
            .await;

        assert!(!result.is_error(), "{}", result.text_content());
        assert_eq!(host.calls()[0], "branch_head acme/web main");
    }

    #[tokio::test]
    async fn test_empty_description_uses_template() {
        let host = Arc::new(host().with_file(".github/PULL_REQUEST_TEMPLATE.md", "## Summary\n"));
        let handler = handler(tracker_with(Some("  "), Some("eng-1")), host.clone());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;
        assert!(!result.is_error(), "{}", result.text_content());

        assert_eq!(
            host.pull(1).unwrap().body.as_deref(),
            Some("## Summary\n\nFixes ENG-1")
        );
    }

    #[tokio::test]
    async fn test_no_description_and_no_template() {
        let host = Arc::new(host());
        let handler = handler(tracker_with(None, Some("eng-1")), host.clone());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;
        assert!(!result.is_error(), "{}", result.text_content());

        assert_eq!(host.pull(1).unwrap().body.as_deref(), Some("Fixes ENG-1"));
    }

    #[tokio::test]
    async fn test_missing_branch_name_makes_no_github_calls() {
        let mut host = MockHost::new();
        host.expect_branch_head().never();
        host.expect_create_branch().never();
        host.expect_create_pull_request().never();

        let handler = ToolHandler::new(Arc::new(tracker_with(Some("d"), None)))
            .with_source_host(Arc::new(host), defaults());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;

        assert!(result.is_error());
        assert_eq!(
            result.text_content(),
            "Validation error: create-feature-pr: issue ENG-1 has no branch name"
        );
    }

    #[tokio::test]
    async fn test_blank_branch_name_is_missing() {
        let mut host = MockHost::new();
        host.expect_create_branch().never();

        let handler = ToolHandler::new(Arc::new(tracker_with(Some("d"), Some(" "))))
            .with_source_host(Arc::new(host), defaults());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_unknown_issue() {
        let mut host = MockHost::new();
        host.expect_create_branch().never();

        let handler = ToolHandler::new(Arc::new(FakeTracker::default()))
            .with_source_host(Arc::new(host), defaults());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-404"})))
            .await;

        assert!(result.is_error());
        assert_eq!(result.text_content(), "Not found: Issue ENG-404");
    }

    #[tokio::test]
    async fn test_failure_at_pull_request_reports_created_branch() {
        let host = Arc::new(host().failing_at(FailAt::CreatePullRequest));
        let handler = handler(tracker_with(Some("d"), Some("eng-1")), host.clone());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;

        assert!(result.is_error());
        let message = result.text_content();
        assert!(message.contains("failed at step 2 (create pull request)"));
        assert!(message.contains("Already created: branch 'eng-1'"));
    }

    #[tokio::test]
    async fn test_failure_at_link_reports_branch_and_pr() {
        let host = Arc::new(host().failing_at(FailAt::UpdatePullRequest));
        let handler = handler(tracker_with(Some("d"), Some("eng-1")), host.clone());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;

        assert!(result.is_error());
        let message = result.text_content();
        assert!(message.contains("failed at step 3 (link pull request to issue)"));
        assert!(message.contains("branch 'eng-1', pull request #1"));
        // Nothing is rolled back
        assert!(host.pull(1).is_some());
    }

    #[tokio::test]
    async fn test_failure_at_branch_reports_nothing_created() {
        let host = Arc::new(host().failing_at(FailAt::CreateBranch));
        let handler = handler(tracker_with(Some("d"), Some("eng-1")), host.clone());

        let result = handler
            .execute("create-feature-pr", Some(json!({"issueId": "ENG-1"})))
            .await;

        assert!(result.text_content().contains("step 1 (create branch)"));
        assert!(result.text_content().ends_with("Already created: nothing"));
    }
}
