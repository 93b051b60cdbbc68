//! Flattened tool outputs.
//!
//! Records from the remote APIs carry references (`state_id`, `team_id`, ...)
//! that handlers resolve; these structs are the resolved, flat JSON the agent
//! receives.

use bridge_core::{
    Attachment, Branch, Comment, Cycle, IssueRecord, Label, Project, PullRequest, Team, User,
    WorkflowState,
};
use serde::Serialize;

use crate::images::ImageReference;

/// Row of list-issues and search-issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<u8>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub url: Option<String>,
}

impl IssueSummary {
    pub fn new(issue: IssueRecord, state: Option<WorkflowState>, assignee: Option<User>) -> Self {
        Self {
            id: issue.id,
            identifier: issue.identifier,
            title: issue.title,
            description: issue.description,
            priority: issue.priority,
            status: state.map(|s| s.name),
            assignee: assignee.map(|u| u.name),
            url: issue.url,
        }
    }
}

/// Parent issue, reduced to what identifies it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
}

/// Everything get-issue resolves around one issue.
#[derive(Debug, Default)]
pub struct IssueContext {
    pub state: Option<WorkflowState>,
    pub assignee: Option<User>,
    pub creator: Option<User>,
    pub team: Option<Team>,
    pub project: Option<Project>,
    pub parent: Option<IssueRecord>,
    pub cycle: Option<Cycle>,
    pub labels: Vec<Label>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}

/// Output of get-issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<u8>,
    pub url: Option<String>,
    pub branch_name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub status: Option<String>,
    pub status_type: Option<String>,
    pub assignee: Option<User>,
    pub creator: Option<User>,
    pub team: Option<Team>,
    pub project: Option<Project>,
    pub parent: Option<ParentIssue>,
    pub cycle: Option<Cycle>,
    pub labels: Vec<String>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
    pub images: Vec<ImageReference>,
    pub attachment_images: Vec<ImageReference>,
}

impl IssueDetail {
    pub fn new(
        issue: IssueRecord,
        context: IssueContext,
        images: Vec<ImageReference>,
        attachment_images: Vec<ImageReference>,
    ) -> Self {
        let (status, status_type) = match context.state {
            Some(state) => (Some(state.name), state.state_type),
            None => (None, None),
        };

        Self {
            id: issue.id,
            identifier: issue.identifier,
            title: issue.title,
            description: issue.description,
            priority: issue.priority,
            url: issue.url,
            branch_name: issue.branch_name,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            status,
            status_type,
            assignee: context.assignee,
            creator: context.creator,
            team: context.team,
            project: context.project,
            parent: context.parent.map(|p| ParentIssue {
                id: p.id,
                identifier: p.identifier,
                title: p.title,
            }),
            cycle: context.cycle,
            labels: context.labels.into_iter().map(|l| l.name).collect(),
            comments: context.comments,
            attachments: context.attachments,
            images,
            attachment_images,
        }
    }
}

/// Output of github-create-branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBranch {
    #[serde(flatten)]
    pub branch: Branch,
    pub base_branch: String,
    pub repository: String,
}

/// Output of github-link-pr-to-issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPullRequest {
    pub pull_request: PullRequest,
    /// False when the marker was already present and nothing was written.
    pub updated: bool,
}

/// Output of github-get-pr-template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrTemplate {
    pub path: String,
    pub content: String,
}

/// Output of create-feature-pr.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePr {
    pub issue: String,
    pub branch: Branch,
    pub pull_request: PullRequest,
}
