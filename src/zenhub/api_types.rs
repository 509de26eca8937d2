//! Serde-deserializable types matching ZenHub GraphQL responses.
//!
//! These types are separate from the cached records so that the wire shape
//! (camelCase, nesting, `__typename` unions) stays at the fetch boundary.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{
  EpicRecord, IssueLocation, IssueRecord, LabelRecord, PipelineRecord, PriorityRecord,
  RepositoryRecord, SprintRecord, SprintState, UserRecord,
};

// ============================================================================
// GraphQL envelope and pagination
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiGraphqlResponse {
  pub data: Option<serde_json::Value>,
  #[serde(default)]
  pub errors: Vec<ApiGraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGraphqlError {
  pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageInfo {
  #[serde(default)]
  pub has_next_page: bool,
  pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConnection<N> {
  #[serde(default = "Vec::new")]
  pub nodes: Vec<N>,
  pub page_info: ApiPageInfo,
}

// ============================================================================
// Entity nodes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiPipeline {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRepositoryRef {
  pub name: String,
  pub owner_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiEpicIssue {
  pub title: String,
  pub number: u64,
  pub repository: ApiRepositoryRef,
}

/// Roadmap item, discriminated by `__typename`
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum ApiRoadmapItem {
  /// Workspace-native epic
  ZenhubEpic { id: String, title: String },
  /// Epic backed by a tracked issue
  Epic { id: String, issue: ApiEpicIssue },
  /// Projects and anything else the roadmap may carry
  #[serde(other)]
  Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSprint {
  pub id: String,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub generated_name: Option<String>,
  pub state: SprintState,
  pub start_at: Option<DateTime<Utc>>,
  pub end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSprintReferents {
  pub active_sprint: Option<ApiSprint>,
  pub upcoming_sprint: Option<ApiSprint>,
  pub previous_sprint: Option<ApiSprint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRepository {
  pub id: String,
  pub gh_id: u64,
  pub name: String,
  pub owner_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiLabel {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGithubUser {
  pub login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
  pub id: String,
  #[serde(default)]
  pub name: Option<String>,
  pub github_user: Option<ApiGithubUser>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub repository: ApiRepositoryRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiWorkspace {
  pub name: String,
}

// ============================================================================
// Conversions to records
// ============================================================================

impl From<ApiPipeline> for PipelineRecord {
  fn from(p: ApiPipeline) -> Self {
    PipelineRecord {
      id: p.id,
      name: p.name,
    }
  }
}

impl ApiRoadmapItem {
  /// Convert to an epic record; `None` for roadmap items that are not epics.
  pub fn into_epic(self) -> Option<EpicRecord> {
    match self {
      ApiRoadmapItem::ZenhubEpic { id, title } => Some(EpicRecord::Native { id, title }),
      ApiRoadmapItem::Epic { id, issue } => Some(EpicRecord::Legacy {
        id,
        title: issue.title,
        issue: IssueLocation {
          number: issue.number,
          repo: issue.repository.name,
          owner: issue.repository.owner_name,
        },
      }),
      ApiRoadmapItem::Other => None,
    }
  }
}

impl From<ApiSprint> for SprintRecord {
  fn from(s: ApiSprint) -> Self {
    SprintRecord {
      id: s.id,
      name: s.name.unwrap_or_default(),
      generated_name: s.generated_name.unwrap_or_default(),
      state: s.state,
      start_at: s.start_at,
      end_at: s.end_at,
    }
  }
}

impl From<ApiRepository> for RepositoryRecord {
  fn from(r: ApiRepository) -> Self {
    RepositoryRecord {
      id: r.id,
      gh_id: r.gh_id,
      name: r.name,
      owner: r.owner_name,
    }
  }
}

impl From<ApiLabel> for LabelRecord {
  fn from(l: ApiLabel) -> Self {
    LabelRecord {
      id: l.id,
      name: l.name,
      color: l.color,
    }
  }
}

impl From<ApiLabel> for PriorityRecord {
  fn from(l: ApiLabel) -> Self {
    PriorityRecord {
      id: l.id,
      name: l.name,
      color: l.color,
    }
  }
}

impl From<ApiUser> for UserRecord {
  fn from(u: ApiUser) -> Self {
    let login = u.github_user.map(|g| g.login);
    UserRecord {
      id: u.id,
      // Fall back to the login so every user has something to match on
      name: u
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| login.clone())
        .unwrap_or_default(),
      login,
    }
  }
}

impl From<ApiIssue> for IssueRecord {
  fn from(i: ApiIssue) -> Self {
    IssueRecord {
      id: i.id,
      number: i.number,
      title: i.title,
      repo: i.repository.name,
      owner: i.repository.owner_name,
    }
  }
}
