use clap::ValueEnum;
use std::fmt;
use thiserror::Error;

use super::ambiguity::Ambiguity;
use super::sprint::SprintKeyword;
use crate::zenhub::ClientError;

/// Kind of entity a user-typed identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
  Pipeline,
  Epic,
  Sprint,
  Repo,
  Label,
  Priority,
  User,
  Issue,
  #[value(skip)]
  Workspace,
}

impl EntityKind {
  pub fn as_str(self) -> &'static str {
    match self {
      EntityKind::Pipeline => "pipeline",
      EntityKind::Epic => "epic",
      EntityKind::Sprint => "sprint",
      EntityKind::Repo => "repository",
      EntityKind::Label => "label",
      EntityKind::Priority => "priority",
      EntityKind::User => "user",
      EntityKind::Issue => "issue",
      EntityKind::Workspace => "workspace",
    }
  }

  pub fn plural(self) -> &'static str {
    match self {
      EntityKind::Repo => "repositories",
      EntityKind::Priority => "priorities",
      EntityKind::Pipeline => "pipelines",
      EntityKind::Epic => "epics",
      EntityKind::Sprint => "sprints",
      EntityKind::Label => "labels",
      EntityKind::User => "users",
      EntityKind::Issue => "issues",
      EntityKind::Workspace => "workspaces",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Why an identifier could not be turned into exactly one entity.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("no {kind} matches '{identifier}'")]
  NotFound { kind: EntityKind, identifier: String },

  #[error("{0}")]
  Ambiguous(Ambiguity),

  #[error("workspace has no {keyword} sprint")]
  NoActiveSprint { keyword: SprintKeyword },

  #[error("{0}")]
  Usage(String),

  #[error(transparent)]
  Upstream(#[from] ClientError),
}

impl ResolveError {
  pub fn not_found(kind: EntityKind, identifier: &str) -> Self {
    ResolveError::NotFound {
      kind,
      identifier: identifier.to_string(),
    }
  }

  pub fn usage(message: impl Into<String>) -> Self {
    ResolveError::Usage(message.into())
  }

  /// Process exit code for this failure.
  pub fn exit_code(&self) -> i32 {
    match self {
      ResolveError::Upstream(_) => 1,
      ResolveError::Usage(_) => 2,
      ResolveError::NotFound { .. } => 3,
      ResolveError::Ambiguous(_) => 4,
      ResolveError::NoActiveSprint { .. } => 5,
    }
  }
}
