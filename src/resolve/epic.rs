use std::borrow::Cow;

use super::{pick, require, AliasTable, Candidate, EntityKind, ResolveError, Resolver, Rules};
use crate::zenhub::fetch::fetch_epics;
use crate::zenhub::{EpicRecord, GraphqlExecutor};

impl Candidate for EpicRecord {
  const KIND: EntityKind = EntityKind::Epic;

  fn id(&self) -> &str {
    EpicRecord::id(self)
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(self.title())
  }

  /// Legacy epics are also named by their backing issue, `owner/repo#n` or `repo#n`.
  /// The short form can match epics under several owners.
  fn matches_reference(&self, identifier: &str) -> bool {
    let Some(issue) = self.issue() else {
      return false;
    };
    let short = format!("{}#{}", issue.repo, issue.number);
    identifier.eq_ignore_ascii_case(&issue.to_string()) || identifier.eq_ignore_ascii_case(&short)
  }

  fn context(&self) -> Option<String> {
    match self.issue() {
      Some(issue) => Some(issue.to_string()),
      None => Some("zenhub epic".to_string()),
    }
  }
}

impl<C: GraphqlExecutor> Resolver<'_, C> {
  pub async fn epic(
    &self,
    identifier: &str,
    aliases: &AliasTable,
  ) -> Result<EpicRecord, ResolveError> {
    let identifier = require(EntityKind::Epic, identifier)?;
    let rules = Rules {
      by_id: true,
      aliases: Some(aliases),
    };
    self
      .resolve_listed(
        || fetch_epics(self.client, self.workspace_id, None),
        |candidates| pick(candidates, identifier, rules),
      )
      .await
  }
}
