//! Remote client traits.
//!
//! The dispatch layer only ever talks to these traits. Concrete clients are
//! constructed once at startup and injected, so tests can hand in fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Attachment, Branch, Comment, CreateCommentInput, CreateIssueInput, CreatePullRequestInput,
    Cycle, IssueFilter, IssueRecord, Label, Project, ProjectFilter, PullRequest, RepoRef, Team,
    UpdateIssueInput, UpdatePullRequestInput, User, WorkflowState,
};

/// Issue tracker operations (Linear).
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Get the tracker name (e.g., "linear")
    fn name(&self) -> &'static str;

    async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueRecord>;

    async fn update_issue(&self, id: &str, input: &UpdateIssueInput) -> Result<IssueRecord>;

    /// Look up an issue by id or identifier (`ENG-123`).
    ///
    /// Returns `Ok(None)` when the tracker has no such issue.
    async fn issue(&self, id: &str) -> Result<Option<IssueRecord>>;

    /// List one page of issues matching the filter.
    async fn issues(&self, filter: &IssueFilter, first: u32) -> Result<Vec<IssueRecord>>;

    /// Free-text search; the query is forwarded as-is.
    async fn search_issues(&self, query: &str, first: u32) -> Result<Vec<IssueRecord>>;

    async fn teams(&self, first: u32) -> Result<Vec<Team>>;

    async fn projects(&self, filter: &ProjectFilter, first: u32) -> Result<Vec<Project>>;

    async fn add_comment(&self, input: &CreateCommentInput) -> Result<Comment>;

    // Reference resolution

    async fn workflow_state(&self, id: &str) -> Result<WorkflowState>;

    async fn user(&self, id: &str) -> Result<User>;

    async fn team(&self, id: &str) -> Result<Team>;

    async fn project(&self, id: &str) -> Result<Project>;

    async fn cycle(&self, id: &str) -> Result<Cycle>;

    async fn issue_labels(&self, issue_id: &str) -> Result<Vec<Label>>;

    async fn issue_comments(&self, issue_id: &str) -> Result<Vec<Comment>>;

    async fn issue_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>>;
}

/// Source hosting operations (GitHub).
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Get the host name (e.g., "github")
    fn name(&self) -> &'static str;

    /// Resolve a branch to the sha of its head commit.
    async fn branch_head(&self, repo: &RepoRef, branch: &str) -> Result<String>;

    /// Create `refs/heads/<branch>` pointing at `sha`.
    async fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<Branch>;

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        input: &CreatePullRequestInput,
    ) -> Result<PullRequest>;

    async fn update_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
        input: &UpdatePullRequestInput,
    ) -> Result<PullRequest>;

    async fn pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest>;

    /// Read a file from the default branch. Missing files are `Error::NotFound`.
    async fn file_contents(&self, repo: &RepoRef, path: &str) -> Result<String>;
}
