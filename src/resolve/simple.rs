//! Labels, priorities, repositories and users: small complete lists matched
//! by name only.

use std::borrow::Cow;

use super::{pick, require, Candidate, EntityKind, ResolveError, Resolver, Rules};
use crate::zenhub::fetch::{fetch_labels, fetch_priorities, fetch_repositories, fetch_users};
use crate::zenhub::{GraphqlExecutor, LabelRecord, PriorityRecord, RepositoryRecord, UserRecord};

impl Candidate for LabelRecord {
  const KIND: EntityKind = EntityKind::Label;

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(&self.name)
  }
}

impl Candidate for PriorityRecord {
  const KIND: EntityKind = EntityKind::Priority;

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(&self.name)
  }
}

impl Candidate for RepositoryRecord {
  const KIND: EntityKind = EntityKind::Repo;

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(&self.name)
  }

  fn names(&self) -> Vec<Cow<'_, str>> {
    vec![Cow::Borrowed(&self.name), Cow::Owned(self.full_name())]
  }

  fn context(&self) -> Option<String> {
    Some(self.owner.clone())
  }
}

impl Candidate for UserRecord {
  const KIND: EntityKind = EntityKind::User;

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(&self.name)
  }

  fn names(&self) -> Vec<Cow<'_, str>> {
    let mut names = vec![Cow::Borrowed(self.name.as_str())];
    names.extend(self.login.as_deref().map(Cow::Borrowed));
    names
  }

  fn context(&self) -> Option<String> {
    self.login.as_ref().map(|login| format!("@{}", login))
  }
}

impl<C: GraphqlExecutor> Resolver<'_, C> {
  pub async fn label(&self, identifier: &str) -> Result<LabelRecord, ResolveError> {
    let identifier = require(EntityKind::Label, identifier)?;
    self
      .resolve_listed(
        || fetch_labels(self.client, self.workspace_id, None),
        |candidates| pick(candidates, identifier, Rules::NAMES),
      )
      .await
  }

  pub async fn priority(&self, identifier: &str) -> Result<PriorityRecord, ResolveError> {
    let identifier = require(EntityKind::Priority, identifier)?;
    self
      .resolve_listed(
        || fetch_priorities(self.client, self.workspace_id, None),
        |candidates| pick(candidates, identifier, Rules::NAMES),
      )
      .await
  }

  pub async fn repository(&self, identifier: &str) -> Result<RepositoryRecord, ResolveError> {
    let identifier = require(EntityKind::Repo, identifier)?;
    self
      .resolve_listed(
        || fetch_repositories(self.client, self.workspace_id, None),
        |candidates| pick(candidates, identifier, Rules::NAMES),
      )
      .await
  }

  /// Users are fetched on every call; a leading `@` is ignored.
  pub async fn user(&self, identifier: &str) -> Result<UserRecord, ResolveError> {
    let trimmed = require(EntityKind::User, identifier)?;
    let identifier = require(
      EntityKind::User,
      trimmed.strip_prefix('@').unwrap_or(trimmed),
    )?;
    let users = fetch_users(self.client, self.workspace_id, None).await?;
    pick(&users, identifier, Rules::NAMES)
  }
}
