//! MCP tool registry: names, descriptions and input schemas.

use serde_json::{json, Value};

use crate::protocol::ToolDefinition;

pub const CREATE_ISSUE: &str = "create-issue";
pub const LIST_ISSUES: &str = "list-issues";
pub const UPDATE_ISSUE: &str = "update-issue";
pub const GET_ISSUE: &str = "get-issue";
pub const SEARCH_ISSUES: &str = "search-issues";
pub const LIST_TEAMS: &str = "list-teams";
pub const LIST_PROJECTS: &str = "list-projects";
pub const ADD_COMMENT: &str = "add-comment";

pub const GITHUB_CREATE_BRANCH: &str = "github-create-branch";
pub const GITHUB_CREATE_PR: &str = "github-create-pr";
pub const GITHUB_UPDATE_PR: &str = "github-update-pr";
pub const GITHUB_GET_PR: &str = "github-get-pr";
pub const GITHUB_LINK_PR_TO_ISSUE: &str = "github-link-pr-to-issue";
pub const GITHUB_GET_PR_TEMPLATE: &str = "github-get-pr-template";
pub const CREATE_FEATURE_PR: &str = "create-feature-pr";

/// Page size used when a call omits `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 250;

fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        }),
    }
}

fn limit_property() -> Value {
    json!({
        "type": "integer",
        "description": format!("Maximum number of results (default: {})", DEFAULT_PAGE_SIZE),
        "minimum": 1,
        "maximum": MAX_PAGE_SIZE
    })
}

fn priority_property() -> Value {
    json!({
        "type": "integer",
        "description": "Priority: 0 none, 1 urgent, 2 high, 3 medium, 4 low",
        "minimum": 0,
        "maximum": 4
    })
}

fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn required_string(description: &str) -> Value {
    json!({ "type": "string", "minLength": 1, "description": description })
}

fn id_list_property(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

fn repo_properties() -> (Value, Value) {
    (
        string_property("Repository owner (default: configured github.owner)"),
        string_property("Repository name (default: configured github.repo)"),
    )
}

fn pull_number_property() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Pull request number"
    })
}

/// Linear tools. Always available.
pub fn issue_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            CREATE_ISSUE,
            "Create a new Linear issue in a team",
            json!({
                "title": required_string("Issue title"),
                "teamId": required_string("Team ID the issue belongs to"),
                "description": string_property("Issue description (markdown)"),
                "assigneeId": string_property("User ID to assign"),
                "priority": priority_property(),
                "labelIds": id_list_property("Label IDs to apply"),
                "projectId": string_property("Project ID"),
                "stateId": string_property("Workflow state ID")
            }),
            &["title", "teamId"],
        ),
        tool(
            LIST_ISSUES,
            "List Linear issues, optionally filtered by team, assignee or status name",
            json!({
                "teamId": string_property("Only issues of this team"),
                "assigneeId": string_property("Only issues assigned to this user"),
                "status": string_property("Only issues in the workflow state with this name (e.g. \"In Progress\")"),
                "limit": limit_property()
            }),
            &[],
        ),
        tool(
            UPDATE_ISSUE,
            "Update fields of an existing Linear issue",
            json!({
                "issueId": required_string("Issue ID or identifier (e.g. ENG-123)"),
                "title": string_property("New title"),
                "description": string_property("New description (markdown)"),
                "assigneeId": string_property("User ID to assign"),
                "priority": priority_property(),
                "stateId": string_property("Workflow state ID"),
                "labelIds": id_list_property("Replace labels with these IDs"),
                "projectId": string_property("Project ID")
            }),
            &["issueId"],
        ),
        tool(
            GET_ISSUE,
            "Get a Linear issue with status, people, team, project, parent, cycle, labels, comments, attachments and embedded images",
            json!({
                "issueId": required_string("Issue ID or identifier (e.g. ENG-123)")
            }),
            &["issueId"],
        ),
        tool(
            SEARCH_ISSUES,
            "Full-text search over Linear issues",
            json!({
                "query": required_string("Search text"),
                "limit": limit_property()
            }),
            &["query"],
        ),
        tool(
            LIST_TEAMS,
            "List Linear teams",
            json!({
                "limit": limit_property()
            }),
            &[],
        ),
        tool(
            LIST_PROJECTS,
            "List Linear projects, optionally only those accessible to a team",
            json!({
                "teamId": string_property("Only projects accessible to this team"),
                "limit": limit_property()
            }),
            &[],
        ),
        tool(
            ADD_COMMENT,
            "Add a comment to a Linear issue",
            json!({
                "issueId": required_string("Issue ID or identifier (e.g. ENG-123)"),
                "body": required_string("Comment body (markdown)")
            }),
            &["issueId", "body"],
        ),
    ]
}

/// GitHub tools. Only advertised when a source host is configured.
pub fn github_tools() -> Vec<ToolDefinition> {
    let (owner, repo) = repo_properties();
    vec![
        tool(
            GITHUB_CREATE_BRANCH,
            "Create a GitHub branch from the head of a base branch",
            json!({
                "branch": required_string("Name of the new branch"),
                "owner": owner,
                "repo": repo,
                "baseBranch": string_property("Branch to start from (default: configured base branch, else main)")
            }),
            &["branch"],
        ),
        tool(
            GITHUB_CREATE_PR,
            "Open a GitHub pull request",
            json!({
                "title": required_string("Pull request title"),
                "head": required_string("Branch containing the changes"),
                "owner": owner,
                "repo": repo,
                "base": string_property("Branch to merge into (default: configured base branch, else main)"),
                "body": string_property("Pull request description"),
                "draft": { "type": "boolean", "description": "Open as draft" }
            }),
            &["title", "head"],
        ),
        tool(
            GITHUB_UPDATE_PR,
            "Update a GitHub pull request",
            json!({
                "pullNumber": pull_number_property(),
                "owner": owner,
                "repo": repo,
                "title": string_property("New title"),
                "body": string_property("New description"),
                "state": {
                    "type": "string",
                    "enum": ["open", "closed"],
                    "description": "Open or close the pull request"
                },
                "base": string_property("New base branch")
            }),
            &["pullNumber"],
        ),
        tool(
            GITHUB_GET_PR,
            "Get a GitHub pull request",
            json!({
                "pullNumber": pull_number_property(),
                "owner": owner,
                "repo": repo
            }),
            &["pullNumber"],
        ),
        tool(
            GITHUB_LINK_PR_TO_ISSUE,
            "Link a GitHub pull request to a Linear issue by adding \"Fixes <issue>\" to its description",
            json!({
                "pullNumber": pull_number_property(),
                "issueId": required_string("Linear issue identifier (e.g. ENG-123)"),
                "owner": owner,
                "repo": repo
            }),
            &["pullNumber", "issueId"],
        ),
        tool(
            GITHUB_GET_PR_TEMPLATE,
            "Get the repository's pull request template, or null if it has none",
            json!({
                "owner": owner,
                "repo": repo
            }),
            &[],
        ),
        tool(
            CREATE_FEATURE_PR,
            "Create a branch and pull request for a Linear issue and link them",
            json!({
                "issueId": required_string("Issue ID or identifier (e.g. ENG-123)"),
                "owner": owner,
                "repo": repo,
                "baseBranch": string_property("Branch to start from (default: configured base branch, else main)"),
                "draft": { "type": "boolean", "description": "Open the pull request as draft" }
            }),
            &["issueId"],
        ),
    ]
}

/// Every tool the server exposes for the given setup.
pub fn registry(with_github: bool) -> Vec<ToolDefinition> {
    let mut tools = issue_tools();
    if with_github {
        tools.extend(github_tools());
    }
    tools
}
