use std::borrow::Cow;
use std::fmt;
use tracing::debug;

use super::{pick, require, Candidate, EntityKind, ResolveError, Resolver, Rules};
use crate::cache::CacheKey;
use crate::zenhub::fetch::fetch_sprints;
use crate::zenhub::{GraphqlExecutor, SprintRecord};

/// Reserved sprint identifiers resolved relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintKeyword {
  Current,
  Next,
  Previous,
}

impl SprintKeyword {
  pub fn parse(identifier: &str) -> Option<Self> {
    match identifier.to_ascii_lowercase().as_str() {
      "current" => Some(SprintKeyword::Current),
      "next" => Some(SprintKeyword::Next),
      "previous" => Some(SprintKeyword::Previous),
      _ => None,
    }
  }
}

impl fmt::Display for SprintKeyword {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      SprintKeyword::Current => "active",
      SprintKeyword::Next => "upcoming",
      SprintKeyword::Previous => "previous",
    })
  }
}

impl Candidate for SprintRecord {
  const KIND: EntityKind = EntityKind::Sprint;

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(SprintRecord::display_name(self))
  }

  fn names(&self) -> Vec<Cow<'_, str>> {
    [&self.name, &self.generated_name]
      .into_iter()
      .filter(|n| !n.is_empty())
      .map(|n| Cow::Borrowed(n.as_str()))
      .collect()
  }

  fn context(&self) -> Option<String> {
    Some(self.describe_window())
  }
}

impl<C: GraphqlExecutor> Resolver<'_, C> {
  pub async fn sprint(&self, identifier: &str) -> Result<SprintRecord, ResolveError> {
    let identifier = require(EntityKind::Sprint, identifier)?;
    if let Some(keyword) = SprintKeyword::parse(identifier) {
      return self.relative_sprint(keyword).await;
    }

    let rules = Rules {
      by_id: true,
      aliases: None,
    };
    let (client, workspace_id) = (self.client, self.workspace_id);
    self
      .resolve_listed(
        move || async move {
          fetch_sprints(client, workspace_id, None)
            .await
            .map(|snapshot| snapshot.sprints)
        },
        |candidates| pick(candidates, identifier, rules),
      )
      .await
  }

  /// The referents only come with a fresh fetch, which also refreshes the cached list.
  async fn relative_sprint(&self, keyword: SprintKeyword) -> Result<SprintRecord, ResolveError> {
    let snapshot = fetch_sprints(self.client, self.workspace_id, None).await?;
    self.cache.save(
      &CacheKey::of::<SprintRecord>(self.workspace_id),
      &snapshot.sprints,
    );

    let referent = match keyword {
      SprintKeyword::Current => snapshot.active,
      SprintKeyword::Next => snapshot.upcoming,
      SprintKeyword::Previous => snapshot.previous,
    };
    debug!(%keyword, found = referent.is_some(), "relative sprint");
    referent.ok_or(ResolveError::NoActiveSprint { keyword })
  }
}
