//! Linear GraphQL client implementation.

use async_trait::async_trait;
use bridge_core::{
    Attachment, Comment, CreateCommentInput, CreateIssueInput, Cycle, Error, IssueFilter,
    IssueRecord, IssueTracker, Label, Project, ProjectFilter, Result, Team, UpdateIssueInput,
    User, WorkflowState,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::filter;
use crate::queries;
use crate::types::{
    CommentCreateData, CommentCreateInput, CycleData, GraphQlError, GraphQlRequest,
    GraphQlResponse, IssueAttachmentsData, IssueCommentsData, IssueCreateData, IssueCreateInput,
    IssueData, IssueLabelsData, IssuePayload, IssueUpdateData, IssueUpdateInput, IssuesData,
    LinearAttachment, LinearComment, LinearCycle, LinearIssue, LinearLabel, LinearProject,
    LinearTeam, LinearUser, LinearWorkflowState, ProjectData, ProjectsData, SearchIssuesData,
    TeamData, TeamsData, UserData, WorkflowStateData,
};
use crate::DEFAULT_LINEAR_URL;

/// Prefix of Linear personal API keys, which are sent without `Bearer`.
const PERSONAL_KEY_PREFIX: &str = "lin_api_";

/// Linear API client.
pub struct LinearClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl LinearClient {
    /// Create a new Linear client.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_api_url(DEFAULT_LINEAR_URL, api_key)
    }

    /// Create a new Linear client with a custom endpoint (for testing).
    pub fn with_api_url(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .user_agent("linear-bridge")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Authorization header value, also accepted by the uploads host.
    ///
    /// Personal API keys go in raw; OAuth access tokens need `Bearer`.
    pub fn authorization(&self) -> String {
        if self.api_key.starts_with(PERSONAL_KEY_PREFIX) || self.api_key.starts_with("Bearer ") {
            self.api_key.clone()
        } else {
            format!("Bearer {}", self.api_key)
        }
    }

    /// Execute a GraphQL document and return its `data`.
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let operation = operation_name(query);
        debug!(operation = operation, "Linear GraphQL request");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", self.authorization())
            .header("Content-Type", "application/json")
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            let status_code = status.as_u16();
            // User errors come back as 400 with an errors array.
            let err = match serde_json::from_str::<GraphQlResponse<Value>>(&body) {
                Ok(r) if !r.errors.is_empty() => map_graphql_errors(&r.errors, status_code),
                _ => Error::from_status(status_code, body),
            };
            warn!(
                status = status_code,
                error = %err,
                operation = operation,
                "Linear API error response"
            );
            return Err(err);
        }

        let parsed: GraphQlResponse<T> = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        if !parsed.errors.is_empty() {
            let err = map_graphql_errors(&parsed.errors, status.as_u16());
            warn!(operation = operation, error = %err, "Linear GraphQL errors");
            return Err(err);
        }

        parsed
            .data
            .ok_or_else(|| Error::InvalidData(format!("{} returned no data", operation)))
    }
}

/// Extract the operation name (`query Issue(...)` -> `Issue`) for logging.
fn operation_name(query: &str) -> &str {
    query
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.split('(').next())
        .unwrap_or("anonymous")
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| {
            e.extensions
                .as_ref()
                .and_then(|x| x.user_presentable_message.clone())
                .unwrap_or_else(|| e.message.clone())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classify a GraphQL `errors` array. Errors that match no known kind fall
/// back to the HTTP status.
fn map_graphql_errors(errors: &[GraphQlError], status: u16) -> Error {
    let message = join_messages(errors);

    let is_kind = |needle: &str| {
        errors.iter().any(|e| {
            let ext = e.extensions.as_ref();
            let error_type = ext.and_then(|x| x.error_type.as_deref()).unwrap_or("");
            let code = ext.and_then(|x| x.code.as_deref()).unwrap_or("");
            error_type.eq_ignore_ascii_case(needle)
                || code.eq_ignore_ascii_case(&needle.replace(' ', "_"))
        })
    };

    if is_kind("authentication error") {
        return Error::Unauthorized(message);
    }
    if is_kind("forbidden") {
        return Error::Forbidden(message);
    }
    if is_kind("ratelimited") {
        return Error::RateLimited(message);
    }
    if errors
        .iter()
        .any(|e| e.message.to_lowercase().contains("not found"))
    {
        return Error::NotFound(message);
    }

    Error::from_status(status, message)
}

// =============================================================================
// Mapping functions: Linear types -> core types
// =============================================================================

fn map_issue(issue: LinearIssue) -> IssueRecord {
    IssueRecord {
        id: issue.id,
        identifier: issue.identifier,
        title: issue.title,
        description: issue.description,
        priority: issue.priority.map(|p| p.clamp(0.0, 4.0) as u8),
        url: issue.url,
        branch_name: issue.branch_name.filter(|b| !b.is_empty()),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        state_id: issue.state.map(|r| r.id),
        assignee_id: issue.assignee.map(|r| r.id),
        creator_id: issue.creator.map(|r| r.id),
        team_id: issue.team.map(|r| r.id),
        project_id: issue.project.map(|r| r.id),
        parent_id: issue.parent.map(|r| r.id),
        cycle_id: issue.cycle.map(|r| r.id),
    }
}

fn map_state(state: LinearWorkflowState) -> WorkflowState {
    WorkflowState {
        id: state.id,
        name: state.name,
        state_type: state.state_type,
        color: state.color,
    }
}

fn map_user(user: LinearUser) -> User {
    User {
        id: user.id,
        name: user.name,
        display_name: user.display_name,
        email: user.email,
    }
}

fn map_team(team: LinearTeam) -> Team {
    Team {
        id: team.id,
        key: team.key,
        name: team.name,
        description: team.description,
    }
}

fn map_project(project: LinearProject) -> Project {
    Project {
        id: project.id,
        name: project.name,
        description: project.description,
        state: project.state,
        url: project.url,
    }
}

fn map_cycle(cycle: LinearCycle) -> Cycle {
    Cycle {
        id: cycle.id,
        number: cycle.number.map(|n| n as u32),
        name: cycle.name,
        starts_at: cycle.starts_at,
        ends_at: cycle.ends_at,
    }
}

fn map_label(label: LinearLabel) -> Label {
    Label {
        id: label.id,
        name: label.name,
        color: label.color,
    }
}

fn map_comment(comment: LinearComment) -> Comment {
    Comment {
        id: comment.id,
        body: comment.body,
        author: comment.user.map(|u| u.name),
        created_at: comment.created_at,
    }
}

fn map_attachment(attachment: LinearAttachment) -> Attachment {
    Attachment {
        id: attachment.id,
        title: attachment.title,
        url: attachment.url,
    }
}

/// Unwrap an `issueCreate`/`issueUpdate` payload.
fn payload_issue(payload: IssuePayload, operation: &str) -> Result<IssueRecord> {
    match payload {
        IssuePayload {
            success: true,
            issue: Some(issue),
        } => Ok(map_issue(issue)),
        _ => Err(Error::Api {
            status: 200,
            message: format!("{} did not succeed", operation),
        }),
    }
}

fn create_input(input: &CreateIssueInput) -> IssueCreateInput {
    IssueCreateInput {
        title: input.title.clone(),
        team_id: input.team_id.clone(),
        description: input.description.clone(),
        assignee_id: input.assignee_id.clone(),
        priority: input.priority,
        label_ids: input.label_ids.clone(),
        project_id: input.project_id.clone(),
        state_id: input.state_id.clone(),
    }
}

fn update_input(input: &UpdateIssueInput) -> IssueUpdateInput {
    IssueUpdateInput {
        title: input.title.clone(),
        description: input.description.clone(),
        assignee_id: input.assignee_id.clone(),
        priority: input.priority,
        state_id: input.state_id.clone(),
        label_ids: input.label_ids.clone(),
        project_id: input.project_id.clone(),
    }
}

// =============================================================================
// Trait implementation
// =============================================================================

#[async_trait]
impl IssueTracker for LinearClient {
    fn name(&self) -> &'static str {
        "linear"
    }

    async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueRecord> {
        let data: IssueCreateData = self
            .execute(
                queries::ISSUE_CREATE,
                json!({ "input": create_input(input) }),
            )
            .await?;
        payload_issue(data.issue_create, "issueCreate")
    }

    async fn update_issue(&self, id: &str, input: &UpdateIssueInput) -> Result<IssueRecord> {
        let data: IssueUpdateData = self
            .execute(
                queries::ISSUE_UPDATE,
                json!({ "id": id, "input": update_input(input) }),
            )
            .await?;
        payload_issue(data.issue_update, "issueUpdate")
    }

    async fn issue(&self, id: &str) -> Result<Option<IssueRecord>> {
        match self
            .execute::<IssueData>(queries::ISSUE, json!({ "id": id }))
            .await
        {
            Ok(data) => Ok(data.issue.map(map_issue)),
            Err(e) if e.is_not_found() => {
                debug!(id = id, "Linear issue not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn issues(&self, filter: &IssueFilter, first: u32) -> Result<Vec<IssueRecord>> {
        let filter = filter::issue_filter(filter);
        let variables = if filter.is_empty() {
            json!({ "first": first })
        } else {
            json!({ "filter": filter, "first": first })
        };

        let data: IssuesData = self.execute(queries::ISSUES, variables).await?;
        Ok(data.issues.nodes.into_iter().map(map_issue).collect())
    }

    async fn search_issues(&self, query: &str, first: u32) -> Result<Vec<IssueRecord>> {
        let data: SearchIssuesData = self
            .execute(
                queries::SEARCH_ISSUES,
                json!({ "term": query, "first": first }),
            )
            .await?;
        Ok(data.search_issues.nodes.into_iter().map(map_issue).collect())
    }

    async fn teams(&self, first: u32) -> Result<Vec<Team>> {
        let data: TeamsData = self
            .execute(queries::TEAMS, json!({ "first": first }))
            .await?;
        Ok(data.teams.nodes.into_iter().map(map_team).collect())
    }

    async fn projects(&self, filter: &ProjectFilter, first: u32) -> Result<Vec<Project>> {
        let filter = filter::project_filter(filter);
        let variables = if filter.is_empty() {
            json!({ "first": first })
        } else {
            json!({ "filter": filter, "first": first })
        };

        let data: ProjectsData = self.execute(queries::PROJECTS, variables).await?;
        Ok(data.projects.nodes.into_iter().map(map_project).collect())
    }

    async fn add_comment(&self, input: &CreateCommentInput) -> Result<Comment> {
        let request = CommentCreateInput {
            issue_id: input.issue_id.clone(),
            body: input.body.clone(),
        };
        let data: CommentCreateData = self
            .execute(queries::COMMENT_CREATE, json!({ "input": request }))
            .await?;

        match data.comment_create {
            crate::types::CommentPayload {
                success: true,
                comment: Some(comment),
            } => Ok(map_comment(comment)),
            _ => Err(Error::Api {
                status: 200,
                message: "commentCreate did not succeed".to_string(),
            }),
        }
    }

    async fn workflow_state(&self, id: &str) -> Result<WorkflowState> {
        let data: WorkflowStateData = self
            .execute(queries::WORKFLOW_STATE, json!({ "id": id }))
            .await?;
        Ok(map_state(data.workflow_state))
    }

    async fn user(&self, id: &str) -> Result<User> {
        let data: UserData = self.execute(queries::USER, json!({ "id": id })).await?;
        Ok(map_user(data.user))
    }

    async fn team(&self, id: &str) -> Result<Team> {
        let data: TeamData = self.execute(queries::TEAM, json!({ "id": id })).await?;
        Ok(map_team(data.team))
    }

    async fn project(&self, id: &str) -> Result<Project> {
        let data: ProjectData = self
            .execute(queries::PROJECT, json!({ "id": id }))
            .await?;
        Ok(map_project(data.project))
    }

    async fn cycle(&self, id: &str) -> Result<Cycle> {
        let data: CycleData = self.execute(queries::CYCLE, json!({ "id": id })).await?;
        Ok(map_cycle(data.cycle))
    }

    async fn issue_labels(&self, issue_id: &str) -> Result<Vec<Label>> {
        let data: IssueLabelsData = self
            .execute(queries::ISSUE_LABELS, json!({ "id": issue_id }))
            .await?;
        Ok(data.issue.labels.nodes.into_iter().map(map_label).collect())
    }

    async fn issue_comments(&self, issue_id: &str) -> Result<Vec<Comment>> {
        let data: IssueCommentsData = self
            .execute(queries::ISSUE_COMMENTS, json!({ "id": issue_id }))
            .await?;
        Ok(data
            .issue
            .comments
            .nodes
            .into_iter()
            .map(map_comment)
            .collect())
    }

    async fn issue_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>> {
        let data: IssueAttachmentsData = self
            .execute(queries::ISSUE_ATTACHMENTS, json!({ "id": issue_id }))
            .await?;
        Ok(data
            .issue
            .attachments
            .nodes
            .into_iter()
            .map(map_attachment)
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
