//! Translation of domain filters into Linear's nested filter objects.
//!
//! Linear filters are keyed by field, then by comparator:
//! `{ "team": { "id": { "eq": "..." } } }`. Each filterable field has its
//! own builder; the builders are composed into one typed filter value.
//!
//! Issue and project filters differ for teams. Issues filter on `team`,
//! projects have no `team` field and must go through `accessibleTeams`.

use bridge_core::{IssueFilter, ProjectFilter};
use serde::Serialize;

/// `{ "eq": value }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eq {
    pub eq: String,
}

/// `{ "id": { "eq": value } }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdComparator {
    pub id: Eq,
}

/// `{ "name": { "eq": value } }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameComparator {
    pub name: Eq,
}

/// `{ "some": { "id": { "eq": value } } }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SomeComparator {
    pub some: IdComparator,
}

/// Linear `IssueFilter` input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueFilterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<IdComparator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<IdComparator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NameComparator>,
}

impl IssueFilterInput {
    pub fn is_empty(&self) -> bool {
        self.team.is_none() && self.assignee.is_none() && self.state.is_none()
    }
}

/// Linear `ProjectFilter` input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessible_teams: Option<SomeComparator>,
}

impl ProjectFilterInput {
    pub fn is_empty(&self) -> bool {
        self.accessible_teams.is_none()
    }
}

fn id_eq(value: &str) -> IdComparator {
    IdComparator {
        id: Eq {
            eq: value.to_string(),
        },
    }
}

/// Issues owned by a team.
pub fn team(team_id: &str) -> IdComparator {
    id_eq(team_id)
}

/// Issues assigned to a user.
pub fn assignee(user_id: &str) -> IdComparator {
    id_eq(user_id)
}

/// Issues in a workflow state, matched by state name.
pub fn state_name(name: &str) -> NameComparator {
    NameComparator {
        name: Eq {
            eq: name.to_string(),
        },
    }
}

/// Projects a team can access.
pub fn accessible_team(team_id: &str) -> SomeComparator {
    SomeComparator {
        some: id_eq(team_id),
    }
}

/// Compose the per-field builders into a Linear issue filter.
pub fn issue_filter(filter: &IssueFilter) -> IssueFilterInput {
    IssueFilterInput {
        team: filter.team_id.as_deref().map(team),
        assignee: filter.assignee_id.as_deref().map(assignee),
        state: filter.status.as_deref().map(state_name),
    }
}

/// Compose the per-field builders into a Linear project filter.
pub fn project_filter(filter: &ProjectFilter) -> ProjectFilterInput {
    ProjectFilterInput {
        accessible_teams: filter.team_id.as_deref().map(accessible_team),
    }
}
