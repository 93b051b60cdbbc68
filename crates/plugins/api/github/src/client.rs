//! GitHub API client implementation.

use async_trait::async_trait;
use base64::Engine;
use bridge_core::{
    Branch, CreatePullRequestInput, Error, PullRequest, RepoRef, Result, SourceHost,
    UpdatePullRequestInput,
};
use tracing::{debug, warn};

use crate::types::{
    CreatePullRequestRequest, CreateRefRequest, GitHubContent, GitHubPullRequest, GitHubRef,
    UpdatePullRequestRequest,
};
use crate::DEFAULT_GITHUB_URL;

/// GitHub API client.
pub struct GitHubClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a new GitHub client.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GITHUB_URL, token)
    }

    /// Create a new GitHub client with a custom base URL (GitHub Enterprise, tests).
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::builder()
                .user_agent("linear-bridge")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.repo)
    }

    /// URL below the repository, with every path segment percent-encoded.
    /// Slashes inside `segments` still separate segments.
    fn repo_path_url(&self, repo: &RepoRef, segments: &[&str]) -> Result<String> {
        let invalid = || Error::Config(format!("Invalid GitHub base URL: {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.repo.as_str()])
            .extend(
                segments
                    .iter()
                    .flat_map(|s| s.split('/'))
                    .filter(|s| !s.is_empty()),
            );
        Ok(url.to_string())
    }

    /// Build request with common headers.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = url, "GitHub GET request");

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url = url, "GitHub POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated PATCH request.
    async fn patch<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url = url, "GitHub PATCH request");

        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = error_message(response.text().await.unwrap_or_default());
            warn!(
                status = status_code,
                message = message,
                "GitHub API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

/// Prefer the `message` field of a GitHub error body over the raw JSON.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body)
}

// =============================================================================
// Mapping functions: GitHub types -> core types
// =============================================================================

fn map_pull_request(pr: GitHubPullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title,
        body: pr.body,
        state: pr.state,
        url: pr.html_url,
        head: pr.head.ref_name,
        base: pr.base.ref_name,
        draft: pr.draft,
        merged: pr.merged || pr.merged_at.is_some(),
        author: pr.user.map(|u| u.login),
        created_at: pr.created_at,
        updated_at: pr.updated_at,
    }
}

fn map_branch(git_ref: GitHubRef) -> Branch {
    let name = git_ref
        .ref_name
        .strip_prefix("refs/heads/")
        .unwrap_or(&git_ref.ref_name)
        .to_string();
    Branch {
        name,
        ref_name: git_ref.ref_name,
        sha: git_ref.object.sha,
    }
}

/// Decode a contents-API file body. GitHub wraps base64 at 60 columns.
fn decode_content(content: &GitHubContent) -> Result<String> {
    if content.content_type != "file" {
        return Err(Error::InvalidData(format!(
            "{} is a {}, not a file",
            content.path, content.content_type
        )));
    }

    let raw = content.content.as_deref().unwrap_or_default();
    match content.encoding.as_deref() {
        Some("base64") => {
            let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(cleaned)
                .map_err(|e| Error::InvalidData(format!("Invalid base64 content: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|e| Error::InvalidData(format!("{} is not UTF-8: {}", content.path, e)))
        }
        _ => Ok(raw.to_string()),
    }
}

// =============================================================================
// Trait implementation
// =============================================================================

#[async_trait]
impl SourceHost for GitHubClient {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn branch_head(&self, repo: &RepoRef, branch: &str) -> Result<String> {
        let url = self.repo_path_url(repo, &["git/ref/heads", branch])?;
        let git_ref: GitHubRef = self.get(&url).await.map_err(|e| match e {
            Error::NotFound(_) => {
                Error::NotFound(format!("Branch '{}' not found in {}", branch, repo))
            }
            other => other,
        })?;
        Ok(git_ref.object.sha)
    }

    async fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<Branch> {
        let url = format!("{}/git/refs", self.repo_url(repo));
        let request = CreateRefRequest {
            ref_name: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        };

        let git_ref: GitHubRef = self.post(&url, &request).await?;
        Ok(map_branch(git_ref))
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        input: &CreatePullRequestInput,
    ) -> Result<PullRequest> {
        let url = format!("{}/pulls", self.repo_url(repo));
        let request = CreatePullRequestRequest {
            title: input.title.clone(),
            head: input.head.clone(),
            base: input.base.clone(),
            body: input.body.clone(),
            draft: input.draft,
        };

        let pr: GitHubPullRequest = self.post(&url, &request).await?;
        Ok(map_pull_request(pr))
    }

    async fn update_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
        input: &UpdatePullRequestInput,
    ) -> Result<PullRequest> {
        let url = format!("{}/pulls/{}", self.repo_url(repo), number);
        let request = UpdatePullRequestRequest {
            title: input.title.clone(),
            body: input.body.clone(),
            state: input.state.clone(),
            base: input.base.clone(),
        };

        let pr: GitHubPullRequest = self.patch(&url, &request).await?;
        Ok(map_pull_request(pr))
    }

    async fn pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        let url = format!("{}/pulls/{}", self.repo_url(repo), number);
        let pr: GitHubPullRequest = self.get(&url).await?;
        Ok(map_pull_request(pr))
    }

    async fn file_contents(&self, repo: &RepoRef, path: &str) -> Result<String> {
        let url = self.repo_path_url(repo, &["contents", path])?;
        let content: GitHubContent = self.get(&url).await?;
        decode_content(&content)
    }
}

// =============================================================================
// Tests
// =============================================================================
