//! GitHub API response types.
//!
//! These types represent the raw JSON responses from GitHub API.
//! They are deserialized and then mapped to `bridge-core` records.

use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// GitHub user representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
}

// =============================================================================
// Git references
// =============================================================================

/// `GET /repos/{owner}/{repo}/git/ref/{ref}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub object: GitHubRefObject,
}

/// Object a reference points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRefObject {
    pub sha: String,
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
}

/// Request body for creating a reference.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

// =============================================================================
// Pull Request
// =============================================================================

/// GitHub pull request representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubPullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub merged_at: Option<String>,
    #[serde(default)]
    pub user: Option<GitHubUser>,
    pub head: GitHubBranchRef,
    pub base: GitHubBranchRef,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// GitHub branch reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubBranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

/// Request body for creating a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequestRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub draft: bool,
}

/// Request body for updating a pull request.
#[derive(Debug, Clone, Serialize, Default)]
pub struct UpdatePullRequestRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

// =============================================================================
// Repository contents
// =============================================================================

/// `GET /repos/{owner}/{repo}/contents/{path}` response for a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubContent {
    pub path: String,
    /// "file", "dir", "symlink" or "submodule"
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}
