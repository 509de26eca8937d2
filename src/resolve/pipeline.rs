use std::borrow::Cow;

use super::{pick, require, AliasTable, Candidate, EntityKind, ResolveError, Resolver, Rules};
use crate::zenhub::fetch::fetch_pipelines;
use crate::zenhub::{GraphqlExecutor, PipelineRecord};

impl Candidate for PipelineRecord {
  const KIND: EntityKind = EntityKind::Pipeline;

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> Cow<'_, str> {
    Cow::Borrowed(&self.name)
  }
}

impl<C: GraphqlExecutor> Resolver<'_, C> {
  pub async fn pipeline(
    &self,
    identifier: &str,
    aliases: &AliasTable,
  ) -> Result<PipelineRecord, ResolveError> {
    let identifier = require(EntityKind::Pipeline, identifier)?;
    let rules = Rules {
      by_id: true,
      aliases: Some(aliases),
    };
    self
      .resolve_listed(
        || fetch_pipelines(self.client, self.workspace_id, None),
        |candidates| pick(candidates, identifier, rules),
      )
      .await
  }
}
