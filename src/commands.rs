//! Command handlers: each composes resolution, network calls and cache
//! maintenance, and writes its result to `out`.

use color_eyre::{eyre::eyre, Result};
use std::fmt::Display;
use std::io::Write;
use tracing::warn;

use crate::cache::{CacheKey, CacheLayer, Cacheable, Namespace};
use crate::config::Config;
use crate::github::GithubClient;
use crate::invalidate;
use crate::resolve::{EntityKind, ResolveError, Resolver};
use crate::zenhub::{fetch, mutations, GraphqlExecutor};

/// Everything a command needs, passed explicitly.
pub struct Context<C> {
  pub client: C,
  pub cache: CacheLayer,
  pub config: Config,
  pub github: Option<GithubClient>,
  workspace_id: Option<String>,
}

impl<C: GraphqlExecutor> Context<C> {
  /// `workspace_override` (the `--workspace` flag) wins over the configured workspace.
  pub fn new(
    client: C,
    cache: CacheLayer,
    config: Config,
    workspace_override: Option<String>,
  ) -> Self {
    let workspace_id = workspace_override.or_else(|| config.zenhub.workspace.clone());
    Self {
      client,
      cache,
      config,
      github: None,
      workspace_id,
    }
  }

  pub fn with_github(mut self, github: Option<GithubClient>) -> Self {
    self.github = github;
    self
  }

  fn workspace(&self) -> Result<&str, ResolveError> {
    self.workspace_id.as_deref().ok_or_else(|| {
      ResolveError::usage("no active workspace: set zenhub.workspace or pass --workspace")
    })
  }

  fn resolver(&self) -> Result<Resolver<'_, C>, ResolveError> {
    Ok(Resolver::new(&self.client, &self.cache, self.workspace()?))
  }
}

fn print_all<T: Display>(out: &mut impl Write, records: &[T]) -> Result<()> {
  for record in records {
    writeln!(out, "{}", record)?;
  }
  Ok(())
}

/// Warm the cache from a complete listing; failure only costs a later fetch.
fn warm<T: Cacheable>(cache: &CacheLayer, records: &[T], workspace_id: &str, complete: bool) {
  if !complete {
    return;
  }
  if let Err(e) = cache.fetch_into_cache(records, workspace_id) {
    warn!(namespace = %T::namespace(), error = %e, "failed to warm cache");
  }
}

pub async fn resolve<C: GraphqlExecutor>(
  ctx: &Context<C>,
  kind: EntityKind,
  identifier: &str,
  repo: Option<&str>,
  out: &mut impl Write,
) -> Result<()> {
  let resolver = ctx.resolver()?;
  let aliases = &ctx.config.aliases;
  let line = match kind {
    EntityKind::Pipeline => resolver.pipeline(identifier, &aliases.pipelines).await?.to_string(),
    EntityKind::Epic => resolver.epic(identifier, &aliases.epics).await?.to_string(),
    EntityKind::Sprint => resolver.sprint(identifier).await?.to_string(),
    EntityKind::Repo => resolver.repository(identifier).await?.to_string(),
    EntityKind::Label => resolver.label(identifier).await?.to_string(),
    EntityKind::Priority => resolver.priority(identifier).await?.to_string(),
    EntityKind::User => resolver.user(identifier).await?.to_string(),
    EntityKind::Issue => resolver
      .issue(identifier, repo, ctx.github.as_ref())
      .await?
      .to_string(),
    EntityKind::Workspace => {
      return Err(ResolveError::usage("workspaces are selected by id").into())
    }
  };
  writeln!(out, "{}", line)?;
  Ok(())
}

/// List a kind; a complete listing also warms the cache for later resolutions.
pub async fn list<C: GraphqlExecutor>(
  ctx: &Context<C>,
  kind: EntityKind,
  limit: Option<usize>,
  out: &mut impl Write,
) -> Result<()> {
  let client = &ctx.client;
  let ws = ctx.workspace()?;
  let complete = limit.is_none();

  match kind {
    EntityKind::Pipeline => {
      let records = fetch::fetch_pipelines(client, ws, limit).await.map_err(ResolveError::from)?;
      warm(&ctx.cache, &records, ws, complete);
      print_all(out, &records)
    }
    EntityKind::Epic => {
      let records = fetch::fetch_epics(client, ws, limit).await.map_err(ResolveError::from)?;
      warm(&ctx.cache, &records, ws, complete);
      print_all(out, &records)
    }
    EntityKind::Sprint => {
      let snapshot = fetch::fetch_sprints(client, ws, limit).await.map_err(ResolveError::from)?;
      warm(&ctx.cache, &snapshot.sprints, ws, complete);
      let active = snapshot.active.as_ref().map(|s| s.id.as_str());
      for sprint in &snapshot.sprints {
        let marker = if Some(sprint.id.as_str()) == active { "*" } else { " " };
        writeln!(out, "{} {}", marker, sprint)?;
      }
      Ok(())
    }
    EntityKind::Repo => {
      let records = fetch::fetch_repositories(client, ws, limit).await.map_err(ResolveError::from)?;
      warm(&ctx.cache, &records, ws, complete);
      print_all(out, &records)
    }
    EntityKind::Label => {
      let records = fetch::fetch_labels(client, ws, limit).await.map_err(ResolveError::from)?;
      warm(&ctx.cache, &records, ws, complete);
      print_all(out, &records)
    }
    EntityKind::Priority => {
      let records = fetch::fetch_priorities(client, ws, limit).await.map_err(ResolveError::from)?;
      warm(&ctx.cache, &records, ws, complete);
      print_all(out, &records)
    }
    EntityKind::User => {
      let records = fetch::fetch_users(client, ws, limit).await.map_err(ResolveError::from)?;
      print_all(out, &records)
    }
    EntityKind::Issue | EntityKind::Workspace => {
      Err(ResolveError::usage(format!("{} cannot be listed", kind.plural())).into())
    }
  }
}

pub async fn create_pipeline<C: GraphqlExecutor>(
  ctx: &Context<C>,
  name: &str,
  out: &mut impl Write,
) -> Result<()> {
  let ws = ctx.workspace()?;
  let created = mutations::create_pipeline(&ctx.client, ws, name)
    .await
    .map_err(ResolveError::from)?;
  invalidate::pipelines_changed(&ctx.cache, ws);
  writeln!(out, "{}", created)?;
  Ok(())
}

pub async fn rename_pipeline<C: GraphqlExecutor>(
  ctx: &Context<C>,
  pipeline: &str,
  name: &str,
  out: &mut impl Write,
) -> Result<()> {
  let ws = ctx.workspace()?;
  let target = ctx
    .resolver()?
    .pipeline(pipeline, &ctx.config.aliases.pipelines)
    .await?;
  let renamed = mutations::rename_pipeline(&ctx.client, &target.id, name)
    .await
    .map_err(ResolveError::from)?;
  invalidate::pipelines_changed(&ctx.cache, ws);
  writeln!(out, "{}", renamed)?;
  Ok(())
}

/// Delete a pipeline, moving its issues into `into`.
pub async fn delete_pipeline<C: GraphqlExecutor>(
  ctx: &Context<C>,
  pipeline: &str,
  into: &str,
  out: &mut impl Write,
) -> Result<()> {
  let ws = ctx.workspace()?;
  let resolver = ctx.resolver()?;
  let aliases = &ctx.config.aliases.pipelines;
  let target = resolver.pipeline(pipeline, aliases).await?;
  let destination = resolver.pipeline(into, aliases).await?;
  if target.id == destination.id {
    return Err(
      ResolveError::usage(format!(
        "cannot move issues of '{}' into itself",
        target.name
      ))
      .into(),
    );
  }

  mutations::delete_pipeline(&ctx.client, &target.id, &destination.id)
    .await
    .map_err(ResolveError::from)?;
  invalidate::pipelines_changed(&ctx.cache, ws);
  writeln!(
    out,
    "deleted {}, issues moved to {}",
    target.name, destination.name
  )?;
  Ok(())
}

pub async fn create_epic<C: GraphqlExecutor>(
  ctx: &Context<C>,
  title: &str,
  body: Option<&str>,
  out: &mut impl Write,
) -> Result<()> {
  let ws = ctx.workspace()?;
  let epic = mutations::create_epic(&ctx.client, ws, title, body)
    .await
    .map_err(ResolveError::from)?;
  invalidate::epics_changed(&ctx.cache, ws);
  writeln!(out, "{}", epic)?;
  Ok(())
}

/// Make `workspace_id` the active workspace and drop the previous one's cache.
pub async fn switch_workspace<C: GraphqlExecutor>(
  ctx: &mut Context<C>,
  workspace_id: &str,
  out: &mut impl Write,
) -> Result<()> {
  let name = fetch::fetch_workspace_name(&ctx.client, workspace_id)
    .await
    .map_err(ResolveError::from)?
    .ok_or_else(|| ResolveError::not_found(EntityKind::Workspace, workspace_id))?;

  let previous = ctx.config.zenhub.workspace.replace(workspace_id.to_string());
  ctx.config.save()?;
  invalidate::workspace_switched(&ctx.cache, previous.as_deref(), workspace_id);
  ctx.workspace_id = Some(workspace_id.to_string());

  writeln!(out, "switched to {} ({})", name, workspace_id)?;
  Ok(())
}

/// Clear the active workspace's cache, or one namespace of it.
pub fn clear_cache<C: GraphqlExecutor>(
  ctx: &Context<C>,
  namespace: Option<&str>,
  out: &mut impl Write,
) -> Result<()> {
  let ws = ctx.workspace()?;
  match namespace {
    None => {
      ctx.cache.clear_workspace(ws)?;
      writeln!(out, "cleared cache for workspace {}", ws)?;
    }
    Some(name) => {
      let namespace = Namespace::parse(name).ok_or_else(|| {
        let known: Vec<&str> = Namespace::ALL.iter().map(|n| n.as_str()).collect();
        eyre!("Unknown cache namespace '{}' (one of: {})", name, known.join(", "))
      })?;
      ctx.cache.clear(&CacheKey::new(namespace, ws))?;
      writeln!(out, "cleared {} cache for workspace {}", namespace, ws)?;
    }
  }
  Ok(())
}
