//! In-memory tracker and host doubles for handler tests.
//!
//! `FakeTracker`/`FakeHost` keep state so multi-step flows can be checked
//! end to end; `MockTracker`/`MockHost` are for "this must never be called".

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bridge_core::{
    Attachment, Branch, Comment, CreateCommentInput, CreateIssueInput, CreatePullRequestInput,
    Cycle, Error, IssueFilter, IssueRecord, IssueTracker, Label, Project, ProjectFilter,
    PullRequest, RepoRef, Result, SourceHost, Team, UpdateIssueInput, UpdatePullRequestInput,
    User, WorkflowState,
};
use mockall::mock;

mock! {
    pub Tracker {}

    #[async_trait]
    impl IssueTracker for Tracker {
        fn name(&self) -> &'static str;
        async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueRecord>;
        async fn update_issue(&self, id: &str, input: &UpdateIssueInput) -> Result<IssueRecord>;
        async fn issue(&self, id: &str) -> Result<Option<IssueRecord>>;
        async fn issues(&self, filter: &IssueFilter, first: u32) -> Result<Vec<IssueRecord>>;
        async fn search_issues(&self, query: &str, first: u32) -> Result<Vec<IssueRecord>>;
        async fn teams(&self, first: u32) -> Result<Vec<Team>>;
        async fn projects(&self, filter: &ProjectFilter, first: u32) -> Result<Vec<Project>>;
        async fn add_comment(&self, input: &CreateCommentInput) -> Result<Comment>;
        async fn workflow_state(&self, id: &str) -> Result<WorkflowState>;
        async fn user(&self, id: &str) -> Result<User>;
        async fn team(&self, id: &str) -> Result<Team>;
        async fn project(&self, id: &str) -> Result<Project>;
        async fn cycle(&self, id: &str) -> Result<Cycle>;
        async fn issue_labels(&self, issue_id: &str) -> Result<Vec<Label>>;
        async fn issue_comments(&self, issue_id: &str) -> Result<Vec<Comment>>;
        async fn issue_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>>;
    }
}

mock! {
    pub Host {}

    #[async_trait]
    impl SourceHost for Host {
        fn name(&self) -> &'static str;
        async fn branch_head(&self, repo: &RepoRef, branch: &str) -> Result<String>;
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
        async fn file_contents(&self, repo: &RepoRef, path: &str) -> Result<String>;
    }
}

fn not_found(kind: &str, id: &str) -> Error {
    Error::NotFound(format!("{} {}", kind, id))
}

// =============================================================================
// FakeTracker
// =============================================================================

#[derive(Default)]
pub struct FakeTracker {
    issues: Mutex<Vec<IssueRecord>>,
    states: Vec<WorkflowState>,
    users: Vec<User>,
    teams: Vec<Team>,
    labels: HashMap<String, Vec<Label>>,
    comments: Mutex<HashMap<String, Vec<Comment>>>,
    attachments: HashMap<String, Vec<Attachment>>,
    pages: Mutex<Vec<u32>>,
    issue_filters: Mutex<Vec<IssueFilter>>,
    project_filters: Mutex<Vec<ProjectFilter>>,
    updated_ids: Mutex<Vec<String>>,
}

impl FakeTracker {
    pub fn with_state(mut self, state: WorkflowState) -> Self {
        self.states.push(state);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.teams.push(team);
        self
    }

    pub fn with_label(mut self, issue_id: &str, label: Label) -> Self {
        self.labels.entry(issue_id.to_string()).or_default().push(label);
        self
    }

    pub fn with_comment(self, issue_id: &str, comment: Comment) -> Self {
        self.comments
            .lock()
            .unwrap()
            .entry(issue_id.to_string())
            .or_default()
            .push(comment);
        self
    }

    pub fn with_attachment(mut self, issue_id: &str, attachment: Attachment) -> Self {
        self.attachments
            .entry(issue_id.to_string())
            .or_default()
            .push(attachment);
        self
    }

    pub fn insert(&self, issue: IssueRecord) {
        self.issues.lock().unwrap().push(issue);
    }

    /// Page sizes requested by list/search calls, in call order.
    pub fn pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }

    pub fn issue_filters(&self) -> Vec<IssueFilter> {
        self.issue_filters.lock().unwrap().clone()
    }

    pub fn project_filters(&self) -> Vec<ProjectFilter> {
        self.project_filters.lock().unwrap().clone()
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updated_ids.lock().unwrap().clone()
    }

    fn find(&self, id: &str) -> Option<IssueRecord> {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id || i.identifier == id)
            .cloned()
    }

    fn state_name(&self, state_id: Option<&str>) -> Option<&str> {
        let state_id = state_id?;
        self.states
            .iter()
            .find(|s| s.id == state_id)
            .map(|s| s.name.as_str())
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueRecord> {
        let mut issues = self.issues.lock().unwrap();
        let number = issues.len() + 1;
        let key = self
            .teams
            .iter()
            .find(|t| t.id == input.team_id)
            .map(|t| t.key.clone())
            .unwrap_or_else(|| "ISS".to_string());

        let issue = IssueRecord {
            id: format!("issue-{}", number),
            identifier: format!("{}-{}", key, number),
            title: input.title.clone(),
            description: input.description.clone(),
            priority: input.priority,
            team_id: Some(input.team_id.clone()),
            assignee_id: input.assignee_id.clone(),
            state_id: input.state_id.clone(),
            project_id: input.project_id.clone(),
            ..Default::default()
        };
        issues.push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, id: &str, input: &UpdateIssueInput) -> Result<IssueRecord> {
        self.updated_ids.lock().unwrap().push(id.to_string());

        let mut issues = self.issues.lock().unwrap();
        let issue = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Issue", id))?;

        if let Some(title) = &input.title {
            issue.title = title.clone();
        }
        if let Some(description) = &input.description {
            issue.description = Some(description.clone());
        }
        if let Some(priority) = input.priority {
            issue.priority = Some(priority);
        }
        if let Some(state_id) = &input.state_id {
            issue.state_id = Some(state_id.clone());
        }
        if let Some(assignee_id) = &input.assignee_id {
            issue.assignee_id = Some(assignee_id.clone());
        }
        Ok(issue.clone())
    }

    async fn issue(&self, id: &str) -> Result<Option<IssueRecord>> {
        Ok(self.find(id))
    }

    async fn issues(&self, filter: &IssueFilter, first: u32) -> Result<Vec<IssueRecord>> {
        self.pages.lock().unwrap().push(first);
        self.issue_filters.lock().unwrap().push(filter.clone());

        let issues = self.issues.lock().unwrap();
        Ok(issues
            .iter()
            .filter(|i| filter.team_id.is_none() || i.team_id == filter.team_id)
            .filter(|i| filter.assignee_id.is_none() || i.assignee_id == filter.assignee_id)
            .filter(|i| {
                filter.status.is_none()
                    || self.state_name(i.state_id.as_deref()) == filter.status.as_deref()
            })
            .take(first as usize)
            .cloned()
            .collect())
    }

    async fn search_issues(&self, query: &str, first: u32) -> Result<Vec<IssueRecord>> {
        self.pages.lock().unwrap().push(first);

        let query = query.to_lowercase();
        let issues = self.issues.lock().unwrap();
        Ok(issues
            .iter()
            .filter(|i| i.title.to_lowercase().contains(&query))
            .take(first as usize)
            .cloned()
            .collect())
    }

    async fn teams(&self, first: u32) -> Result<Vec<Team>> {
        self.pages.lock().unwrap().push(first);
        Ok(self.teams.iter().take(first as usize).cloned().collect())
    }

    async fn projects(&self, filter: &ProjectFilter, first: u32) -> Result<Vec<Project>> {
        self.pages.lock().unwrap().push(first);
        self.project_filters.lock().unwrap().push(filter.clone());
        Ok(Vec::new())
    }

    async fn add_comment(&self, input: &CreateCommentInput) -> Result<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let list = comments.entry(input.issue_id.clone()).or_default();
        let comment = Comment {
            id: format!("comment-{}", list.len() + 1),
            body: input.body.clone(),
            author: None,
            created_at: None,
        };
        list.push(comment.clone());
        Ok(comment)
    }

    async fn workflow_state(&self, id: &str) -> Result<WorkflowState> {
        self.states
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found("Workflow state", id))
    }

    async fn user(&self, id: &str) -> Result<User> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| not_found("User", id))
    }

    async fn team(&self, id: &str) -> Result<Team> {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found("Team", id))
    }

    async fn project(&self, id: &str) -> Result<Project> {
        Err(not_found("Project", id))
    }

    async fn cycle(&self, id: &str) -> Result<Cycle> {
        Err(not_found("Cycle", id))
    }

    async fn issue_labels(&self, issue_id: &str) -> Result<Vec<Label>> {
        Ok(self.labels.get(issue_id).cloned().unwrap_or_default())
    }

    async fn issue_comments(&self, issue_id: &str) -> Result<Vec<Comment>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(issue_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn issue_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>> {
        Ok(self.attachments.get(issue_id).cloned().unwrap_or_default())
    }
}

// =============================================================================
// FakeHost
// =============================================================================

/// Step at which `FakeHost` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    CreateBranch,
    CreatePullRequest,
    UpdatePullRequest,
    FileContents,
}

#[derive(Default)]
pub struct FakeHost {
    heads: HashMap<String, String>,
    files: HashMap<String, String>,
    pulls: Mutex<Vec<PullRequest>>,
    calls: Mutex<Vec<String>>,
    fail_at: Option<FailAt>,
}

impl FakeHost {
    pub fn with_head(mut self, branch: &str, sha: &str) -> Self {
        self.heads.insert(branch.to_string(), sha.to_string());
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_pull(self, pr: PullRequest) -> Self {
        self.pulls.lock().unwrap().push(pr);
        self
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Calls made so far, e.g. `create_branch acme/web eng-1 abc`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pull(&self, number: u64) -> Option<PullRequest> {
        self.pulls
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.number == number)
            .cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, step: FailAt) -> Result<()> {
        if self.fail_at == Some(step) {
            return Err(Error::Api {
                status: 422,
                message: format!("{:?} rejected", step),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SourceHost for FakeHost {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn branch_head(&self, repo: &RepoRef, branch: &str) -> Result<String> {
        self.record(format!("branch_head {} {}", repo, branch));
        self.heads
            .get(branch)
            .cloned()
            .ok_or_else(|| not_found("Branch", branch))
    }

    async fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<Branch> {
        self.record(format!("create_branch {} {} {}", repo, branch, sha));
        self.check(FailAt::CreateBranch)?;
        Ok(Branch {
            name: branch.to_string(),
            ref_name: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        input: &CreatePullRequestInput,
    ) -> Result<PullRequest> {
        self.record(format!(
            "create_pull_request {} {} -> {}",
            repo, input.head, input.base
        ));
        self.check(FailAt::CreatePullRequest)?;

        let mut pulls = self.pulls.lock().unwrap();
        let pr = PullRequest {
            number: pulls.len() as u64 + 1,
            title: input.title.clone(),
            body: input.body.clone(),
            state: "open".to_string(),
            url: format!("https://github.com/{}/pull/{}", repo, pulls.len() + 1),
            head: input.head.clone(),
            base: input.base.clone(),
            draft: input.draft,
            ..Default::default()
        };
        pulls.push(pr.clone());
        Ok(pr)
    }

    async fn update_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
        input: &UpdatePullRequestInput,
    ) -> Result<PullRequest> {
        self.record(format!("update_pull_request {} {}", repo, number));
        self.check(FailAt::UpdatePullRequest)?;

        let mut pulls = self.pulls.lock().unwrap();
        let pr = pulls
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or_else(|| not_found("Pull request", &number.to_string()))?;

        if let Some(title) = &input.title {
            pr.title = title.clone();
        }
        if let Some(body) = &input.body {
            pr.body = Some(body.clone());
        }
        if let Some(state) = &input.state {
            pr.state = state.clone();
        }
        if let Some(base) = &input.base {
            pr.base = base.clone();
        }
        Ok(pr.clone())
    }

    async fn pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        self.record(format!("pull_request {} {}", repo, number));
        self.pull(number)
            .ok_or_else(|| not_found("Pull request", &number.to_string()))
    }

    async fn file_contents(&self, repo: &RepoRef, path: &str) -> Result<String> {
        self.record(format!("file_contents {} {}", repo, path));
        self.check(FailAt::FileContents)?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("File", path))
    }
}
