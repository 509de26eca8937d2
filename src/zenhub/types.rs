//! Lightweight records: the minimal projection of each entity needed to
//! resolve it and to print a short reference without another request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace pipeline (board column)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRecord {
  pub id: String,
  pub name: String,
}

/// Repository and owner of the issue backing a legacy epic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLocation {
  pub number: u64,
  pub repo: String,
  pub owner: String,
}

impl fmt::Display for IssueLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
  }
}

/// Epic, either workspace-native or backed by a tracked issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpicRecord {
  Native {
    id: String,
    title: String,
  },
  Legacy {
    id: String,
    title: String,
    issue: IssueLocation,
  },
}

impl EpicRecord {
  pub fn id(&self) -> &str {
    match self {
      EpicRecord::Native { id, .. } | EpicRecord::Legacy { id, .. } => id,
    }
  }

  pub fn title(&self) -> &str {
    match self {
      EpicRecord::Native { title, .. } | EpicRecord::Legacy { title, .. } => title,
    }
  }

  pub fn issue(&self) -> Option<&IssueLocation> {
    match self {
      EpicRecord::Native { .. } => None,
      EpicRecord::Legacy { issue, .. } => Some(issue),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintState {
  Open,
  Closed,
  #[serde(other)]
  Unknown,
}

impl fmt::Display for SprintState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      SprintState::Open => "open",
      SprintState::Closed => "closed",
      SprintState::Unknown => "unknown",
    })
  }
}

/// Sprint; `name` may be empty, in which case `generated_name` is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintRecord {
  pub id: String,
  pub name: String,
  pub generated_name: String,
  pub state: SprintState,
  pub start_at: Option<DateTime<Utc>>,
  pub end_at: Option<DateTime<Utc>>,
}

impl SprintRecord {
  pub fn display_name(&self) -> &str {
    if self.name.trim().is_empty() {
      &self.generated_name
    } else {
      &self.name
    }
  }

  /// "open, 2024-01-01 to 2024-01-14"
  pub fn describe_window(&self) -> String {
    let day = |ts: &Option<DateTime<Utc>>| {
      ts.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".to_string())
    };
    format!(
      "{}, {} to {}",
      self.state,
      day(&self.start_at),
      day(&self.end_at)
    )
  }
}

/// Sprint list plus the workspace's relative sprints
#[derive(Debug, Clone, Default)]
pub struct SprintSnapshot {
  pub sprints: Vec<SprintRecord>,
  pub active: Option<SprintRecord>,
  pub upcoming: Option<SprintRecord>,
  pub previous: Option<SprintRecord>,
}

/// Repository connected to the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
  pub id: String,
  /// Numeric id on the code host
  pub gh_id: u64,
  pub name: String,
  pub owner: String,
}

impl RepositoryRecord {
  pub fn full_name(&self) -> String {
    format!("{}/{}", self.owner, self.name)
  }
}

/// Label or priority: both share this shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
  pub id: String,
  pub name: String,
  pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRecord {
  pub id: String,
  pub name: String,
  pub color: String,
}

/// Workspace member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  pub id: String,
  pub name: String,
  /// Code-host login, absent for users without a linked account
  pub login: Option<String>,
}

/// Issue as returned by issue lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub repo: String,
  pub owner: String,
}

impl fmt::Display for PipelineRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\t{}", self.id, self.name)
  }
}

impl fmt::Display for EpicRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EpicRecord::Native { id, title } => write!(f, "{}\t{}", id, title),
      EpicRecord::Legacy { id, title, issue } => write!(f, "{}\t{}\t{}", id, title, issue),
    }
  }
}

impl fmt::Display for SprintRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}\t{}\t{}",
      self.id,
      self.display_name(),
      self.describe_window()
    )
  }
}

impl fmt::Display for RepositoryRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\t{}", self.id, self.full_name())
  }
}

impl fmt::Display for LabelRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\t{}\t#{}", self.id, self.name, self.color)
  }
}

impl fmt::Display for PriorityRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\t{}\t#{}", self.id, self.name, self.color)
  }
}

impl fmt::Display for UserRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.login {
      Some(login) => write!(f, "{}\t{}\t@{}", self.id, self.name, login),
      None => write!(f, "{}\t{}", self.id, self.name),
    }
  }
}

impl fmt::Display for IssueRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}\t{}/{}#{}\t{}",
      self.id, self.owner, self.repo, self.number, self.title
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_epic_serializes_with_kind_tag() {
    let legacy = EpicRecord::Legacy {
      id: "e2".to_string(),
      title: "Old".to_string(),
      issue: IssueLocation {
        number: 7,
        repo: "api".to_string(),
        owner: "acme".to_string(),
      },
    };
    let value = serde_json::to_value(&legacy).unwrap();
    assert_eq!(value["kind"], "legacy");
    assert_eq!(value["issue"]["number"], 7);

    let native: EpicRecord =
      serde_json::from_value(serde_json::json!({"kind": "native", "id": "e1", "title": "New"}))
        .unwrap();
    assert_eq!(native.issue(), None);
    assert_eq!(legacy.issue().unwrap().to_string(), "acme/api#7");
  }

  #[test]
  fn test_sprint_display_name_falls_back() {
    let mut sprint = SprintRecord {
      id: "s1".to_string(),
      name: String::new(),
      generated_name: "Sprint: Jan 1 - Jan 14".to_string(),
      state: SprintState::Open,
      start_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
      end_at: None,
    };
    assert_eq!(sprint.display_name(), "Sprint: Jan 1 - Jan 14");
    assert_eq!(sprint.describe_window(), "open, 2024-01-01 to ?");
    sprint.name = "Sprint 47".to_string();
    assert_eq!(sprint.display_name(), "Sprint 47");
  }

  #[test]
  fn test_unknown_sprint_state() {
    let state: SprintState = serde_json::from_str("\"ARCHIVED\"").unwrap();
    assert_eq!(state, SprintState::Unknown);
  }
}
