//! GraphQL documents sent to Linear.

/// Scalar fields plus one-hop references, as `{ id }` stubs.
macro_rules! issue_fields {
    () => {
        "id identifier title description priority url branchName createdAt updatedAt \
         state { id } assignee { id } creator { id } team { id } project { id } \
         parent { id } cycle { id }"
    };
}

pub const ISSUE: &str = concat!(
    "query Issue($id: String!) { issue(id: $id) { ",
    issue_fields!(),
    " } }"
);

pub const ISSUES: &str = concat!(
    "query Issues($filter: IssueFilter, $first: Int) { ",
    "issues(filter: $filter, first: $first) { nodes { ",
    issue_fields!(),
    " } } }"
);

pub const SEARCH_ISSUES: &str = concat!(
    "query SearchIssues($term: String!, $first: Int) { ",
    "searchIssues(term: $term, first: $first) { nodes { ",
    issue_fields!(),
    " } } }"
);

pub const ISSUE_CREATE: &str = concat!(
    "mutation IssueCreate($input: IssueCreateInput!) { ",
    "issueCreate(input: $input) { success issue { ",
    issue_fields!(),
    " } } }"
);

pub const ISSUE_UPDATE: &str = concat!(
    "mutation IssueUpdate($id: String!, $input: IssueUpdateInput!) { ",
    "issueUpdate(id: $id, input: $input) { success issue { ",
    issue_fields!(),
    " } } }"
);

pub const COMMENT_CREATE: &str = "mutation CommentCreate($input: CommentCreateInput!) { \
    commentCreate(input: $input) { success comment { id body createdAt user { name } } } }";

pub const TEAMS: &str =
    "query Teams($first: Int) { teams(first: $first) { nodes { id key name description } } }";

pub const PROJECTS: &str = "query Projects($filter: ProjectFilter, $first: Int) { \
    projects(filter: $filter, first: $first) { nodes { id name description state url } } }";

pub const WORKFLOW_STATE: &str =
    "query WorkflowState($id: String!) { workflowState(id: $id) { id name type color } }";

pub const USER: &str =
    "query User($id: String!) { user(id: $id) { id name displayName email } }";

pub const TEAM: &str = "query Team($id: String!) { team(id: $id) { id key name description } }";

pub const PROJECT: &str =
    "query Project($id: String!) { project(id: $id) { id name description state url } }";

pub const CYCLE: &str =
    "query Cycle($id: String!) { cycle(id: $id) { id number name startsAt endsAt } }";

pub const ISSUE_LABELS: &str =
    "query IssueLabels($id: String!) { issue(id: $id) { labels { nodes { id name color } } } }";

pub const ISSUE_COMMENTS: &str = "query IssueComments($id: String!) { issue(id: $id) { \
    comments { nodes { id body createdAt user { name } } } } }";

pub const ISSUE_ATTACHMENTS: &str = "query IssueAttachments($id: String!) { issue(id: $id) { \
    attachments { nodes { id title url } } } }";
