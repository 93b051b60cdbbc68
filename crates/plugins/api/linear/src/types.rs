//! Linear API response types.
//!
//! These types represent the raw GraphQL payloads returned by Linear.
//! They are deserialized and then mapped to `bridge-core` records.

use serde::{Deserialize, Serialize};

// =============================================================================
// GraphQL envelope
// =============================================================================

/// Top-level GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// A single GraphQL error.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorExtensions {
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "userPresentableMessage")]
    pub user_presentable_message: Option<String>,
}

/// GraphQL request body.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

/// `{ nodes: [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// `{ id }`, an unresolved reference.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Linear models priority as a float (0.0 - 4.0).
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub state: Option<NodeRef>,
    #[serde(default)]
    pub assignee: Option<NodeRef>,
    #[serde(default)]
    pub creator: Option<NodeRef>,
    #[serde(default)]
    pub team: Option<NodeRef>,
    #[serde(default)]
    pub project: Option<NodeRef>,
    #[serde(default)]
    pub parent: Option<NodeRef>,
    #[serde(default)]
    pub cycle: Option<NodeRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearWorkflowState {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub state_type: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearTeam {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearCycle {
    pub id: String,
    /// Linear returns cycle numbers as floats.
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearLabel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearCommentUser {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearComment {
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub user: Option<LinearCommentUser>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearAttachment {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
}

// =============================================================================
// Query payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct IssueData {
    pub issue: Option<LinearIssue>,
}

#[derive(Debug, Deserialize)]
pub struct IssuesData {
    pub issues: Connection<LinearIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIssuesData {
    pub search_issues: Connection<LinearIssue>,
}

#[derive(Debug, Deserialize)]
pub struct TeamsData {
    pub teams: Connection<LinearTeam>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsData {
    pub projects: Connection<LinearProject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateData {
    pub workflow_state: LinearWorkflowState,
}

#[derive(Debug, Deserialize)]
pub struct UserData {
    pub user: LinearUser,
}

#[derive(Debug, Deserialize)]
pub struct TeamData {
    pub team: LinearTeam,
}

#[derive(Debug, Deserialize)]
pub struct ProjectData {
    pub project: LinearProject,
}

#[derive(Debug, Deserialize)]
pub struct CycleData {
    pub cycle: LinearCycle,
}

#[derive(Debug, Deserialize)]
pub struct IssueLabelsData {
    pub issue: IssueLabels,
}

#[derive(Debug, Deserialize)]
pub struct IssueLabels {
    pub labels: Connection<LinearLabel>,
}

#[derive(Debug, Deserialize)]
pub struct IssueCommentsData {
    pub issue: IssueComments,
}

#[derive(Debug, Deserialize)]
pub struct IssueComments {
    pub comments: Connection<LinearComment>,
}

#[derive(Debug, Deserialize)]
pub struct IssueAttachmentsData {
    pub issue: IssueAttachments,
}

#[derive(Debug, Deserialize)]
pub struct IssueAttachments {
    pub attachments: Connection<LinearAttachment>,
}

/// Shared shape of `issueCreate` / `issueUpdate` payloads.
#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub success: bool,
    #[serde(default)]
    pub issue: Option<LinearIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateData {
    pub issue_create: IssuePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateData {
    pub issue_update: IssuePayload,
}

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub success: bool,
    #[serde(default)]
    pub comment: Option<LinearComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateData {
    pub comment_create: CommentPayload,
}

// =============================================================================
// Mutation inputs
// =============================================================================

/// Linear `IssueCreateInput`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateInput {
    pub title: String,
    pub team_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

/// Linear `IssueUpdateInput`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Linear `CommentCreateInput`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateInput {
    pub issue_id: String,
    pub body: String,
}
