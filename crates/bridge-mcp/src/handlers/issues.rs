//! Linear issue tool handlers.

use bridge_core::{
    CreateCommentInput, CreateIssueInput, Error, IssueFilter, IssueRecord, ProjectFilter, Result,
    UpdateIssueInput,
};
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{optional, page_size, parse_args, to_json, ToolHandler};
use crate::images::{analyze_all, extract_image_urls, is_image_url};
use crate::tools::{
    ADD_COMMENT, CREATE_ISSUE, GET_ISSUE, LIST_ISSUES, LIST_PROJECTS, LIST_TEAMS, SEARCH_ISSUES,
    UPDATE_ISSUE,
};
use crate::views::{IssueContext, IssueDetail, IssueSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIssuesArgs {
    team_id: Option<String>,
    assignee_id: Option<String>,
    status: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIssueArgs {
    issue_id: String,
    #[serde(flatten)]
    changes: UpdateIssueInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueIdArgs {
    issue_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchIssuesArgs {
    query: String,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LimitArgs {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsArgs {
    team_id: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentArgs {
    issue_id: String,
    body: String,
}

impl ToolHandler {
    pub(super) async fn create_issue(&self, args: Value) -> Result<Value> {
        let input: CreateIssueInput = parse_args(CREATE_ISSUE, args)?;
        let issue = self.tracker.create_issue(&input).await?;
        info!(identifier = %issue.identifier, "Issue created");
        to_json(&issue)
    }

    pub(super) async fn list_issues(&self, args: Value) -> Result<Value> {
        let args: ListIssuesArgs = parse_args(LIST_ISSUES, args)?;
        let filter = IssueFilter {
            team_id: args.team_id,
            assignee_id: args.assignee_id,
            status: args.status,
        };

        let issues = self.tracker.issues(&filter, page_size(args.limit)).await?;
        to_json(&self.summarize(issues).await?)
    }

    pub(super) async fn update_issue(&self, args: Value) -> Result<Value> {
        let args: UpdateIssueArgs = parse_args(UPDATE_ISSUE, args)?;
        if args.changes.is_empty() {
            return Err(Error::Validation(format!(
                "{}: no fields to update",
                UPDATE_ISSUE
            )));
        }

        let existing = self.find_issue(&args.issue_id).await?;
        let issue = self
            .tracker
            .update_issue(&existing.id, &args.changes)
            .await?;
        info!(identifier = %issue.identifier, "Issue updated");
        to_json(&issue)
    }

    pub(super) async fn get_issue(&self, args: Value) -> Result<Value> {
        let args: IssueIdArgs = parse_args(GET_ISSUE, args)?;
        let issue = self.find_issue(&args.issue_id).await?;
        let context = self.resolve_context(&issue).await?;

        let description_images = issue
            .description
            .as_deref()
            .map(extract_image_urls)
            .unwrap_or_default();
        let attachment_images: Vec<String> = context
            .attachments
            .iter()
            .map(|a| a.url.clone())
            .filter(|url| is_image_url(url))
            .collect();

        let (images, attachment_images) = tokio::join!(
            analyze_all(self.analyzer.as_ref(), description_images),
            analyze_all(self.analyzer.as_ref(), attachment_images),
        );

        to_json(&IssueDetail::new(
            issue,
            context,
            images,
            attachment_images,
        ))
    }

    pub(super) async fn search_issues(&self, args: Value) -> Result<Value> {
        let args: SearchIssuesArgs = parse_args(SEARCH_ISSUES, args)?;
        let issues = self
            .tracker
            .search_issues(&args.query, page_size(args.limit))
            .await?;
        to_json(&self.summarize(issues).await?)
    }

    pub(super) async fn list_teams(&self, args: Value) -> Result<Value> {
        let args: LimitArgs = parse_args(LIST_TEAMS, args)?;
        let teams = self.tracker.teams(page_size(args.limit)).await?;
        to_json(&teams)
    }

    pub(super) async fn list_projects(&self, args: Value) -> Result<Value> {
        let args: ListProjectsArgs = parse_args(LIST_PROJECTS, args)?;
        let filter = ProjectFilter {
            team_id: args.team_id,
        };
        let projects = self
            .tracker
            .projects(&filter, page_size(args.limit))
            .await?;
        to_json(&projects)
    }

    pub(super) async fn add_comment(&self, args: Value) -> Result<Value> {
        let args: AddCommentArgs = parse_args(ADD_COMMENT, args)?;
        let issue = self.find_issue(&args.issue_id).await?;
        let comment = self
            .tracker
            .add_comment(&CreateCommentInput {
                issue_id: issue.id,
                body: args.body,
            })
            .await?;
        info!(issue = %issue.identifier, "Comment added");
        to_json(&comment)
    }

    /// Resolve status and assignee of every issue, all issues concurrently.
    async fn summarize(&self, issues: Vec<IssueRecord>) -> Result<Vec<IssueSummary>> {
        let tracker = self.tracker.as_ref();
        try_join_all(issues.into_iter().map(|issue| async move {
            let (state, assignee) = tokio::try_join!(
                optional(issue.state_id.as_deref().map(|id| tracker.workflow_state(id))),
                optional(issue.assignee_id.as_deref().map(|id| tracker.user(id))),
            )?;
            Ok::<_, Error>(IssueSummary::new(issue, state, assignee))
        }))
        .await
    }

    /// Resolve every reference of one issue concurrently.
    async fn resolve_context(&self, issue: &IssueRecord) -> Result<IssueContext> {
        let tracker = self.tracker.as_ref();
        let (state, assignee, creator, team, project, parent, cycle, labels, comments, attachments) =
            tokio::try_join!(
                optional(issue.state_id.as_deref().map(|id| tracker.workflow_state(id))),
                optional(issue.assignee_id.as_deref().map(|id| tracker.user(id))),
                optional(issue.creator_id.as_deref().map(|id| tracker.user(id))),
                optional(issue.team_id.as_deref().map(|id| tracker.team(id))),
                optional(issue.project_id.as_deref().map(|id| tracker.project(id))),
                optional(issue.parent_id.as_deref().map(|id| tracker.issue(id))),
                optional(issue.cycle_id.as_deref().map(|id| tracker.cycle(id))),
                tracker.issue_labels(&issue.id),
                tracker.issue_comments(&issue.id),
                tracker.issue_attachments(&issue.id),
            )?;

        Ok(IssueContext {
            state,
            assignee,
            creator,
            team,
            project,
            parent: parent.flatten(),
            cycle,
            labels,
            comments,
            attachments,
        })
    }
}
