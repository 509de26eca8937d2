//! Entity snapshot fetchers.
//!
//! Each fetcher pages through a workspace connection until it is exhausted
//! or `limit` records have been collected, and returns flat lightweight records.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::api_types::{
  ApiConnection, ApiIssue, ApiLabel, ApiPipeline, ApiRepository, ApiRoadmapItem, ApiSprint,
  ApiSprintReferents, ApiUser, ApiWorkspace,
};
use super::client::{decode_at, ClientError, GraphqlExecutor};
use super::queries;
use super::types::{
  EpicRecord, IssueRecord, LabelRecord, PipelineRecord, PriorityRecord, RepositoryRecord,
  SprintRecord, SprintSnapshot, UserRecord,
};

/// Records requested per round trip.
pub const PAGE_SIZE: usize = 100;

/// Nodes collected from a connection plus the first page's raw data.
pub struct Paginated<N> {
  pub nodes: Vec<N>,
  pub first_page: Value,
}

/// Walk a connection at `pointer` until exhaustion or `limit`.
pub async fn paginate<C, N>(
  client: &C,
  query: &str,
  mut variables: Map<String, Value>,
  pointer: &str,
  limit: Option<usize>,
) -> Result<Paginated<N>, ClientError>
where
  C: GraphqlExecutor,
  N: DeserializeOwned,
{
  let mut nodes = Vec::new();
  let mut first_page = None;
  let mut after: Option<String> = None;

  loop {
    let first = match limit {
      Some(limit) => limit.saturating_sub(nodes.len()).min(PAGE_SIZE),
      None => PAGE_SIZE,
    };
    if first == 0 {
      break;
    }
    variables.insert("first".to_string(), json!(first));
    variables.insert("after".to_string(), json!(after));

    let data = client
      .execute(query, Value::Object(variables.clone()))
      .await?;
    let page: ApiConnection<N> = decode_at(&data, pointer)?;
    if first_page.is_none() {
      first_page = Some(data);
    }

    nodes.extend(page.nodes);
    debug!(pointer, fetched = nodes.len(), "fetched page");

    if !page.page_info.has_next_page {
      break;
    }
    match page.page_info.end_cursor {
      Some(cursor) => after = Some(cursor),
      None => break,
    }
  }

  if let Some(limit) = limit {
    nodes.truncate(limit);
  }

  Ok(Paginated {
    nodes,
    first_page: first_page.unwrap_or(Value::Null),
  })
}

fn workspace_variables(workspace_id: &str) -> Map<String, Value> {
  let mut variables = Map::new();
  variables.insert("workspaceId".to_string(), json!(workspace_id));
  variables
}

pub async fn fetch_pipelines<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<Vec<PipelineRecord>, ClientError> {
  let page = paginate::<_, ApiPipeline>(
    client,
    queries::WORKSPACE_PIPELINES,
    workspace_variables(workspace_id),
    "/workspace/pipelinesConnection",
    limit,
  )
  .await?;
  Ok(page.nodes.into_iter().map(PipelineRecord::from).collect())
}

pub async fn fetch_epics<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<Vec<EpicRecord>, ClientError> {
  let page = paginate::<_, ApiRoadmapItem>(
    client,
    queries::WORKSPACE_EPICS,
    workspace_variables(workspace_id),
    "/workspace/roadmap/items",
    limit,
  )
  .await?;
  Ok(
    page
      .nodes
      .into_iter()
      .filter_map(ApiRoadmapItem::into_epic)
      .collect(),
  )
}

/// Fetch sprints together with the active, upcoming and previous sprint.
pub async fn fetch_sprints<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<SprintSnapshot, ClientError> {
  let page = paginate::<_, ApiSprint>(
    client,
    queries::WORKSPACE_SPRINTS,
    workspace_variables(workspace_id),
    "/workspace/sprints",
    limit,
  )
  .await?;

  let referents: ApiSprintReferents = if page.first_page.is_null() {
    ApiSprintReferents::default()
  } else {
    decode_at(&page.first_page, "/workspace")?
  };
  Ok(SprintSnapshot {
    sprints: page.nodes.into_iter().map(SprintRecord::from).collect(),
    active: referents.active_sprint.map(SprintRecord::from),
    upcoming: referents.upcoming_sprint.map(SprintRecord::from),
    previous: referents.previous_sprint.map(SprintRecord::from),
  })
}

pub async fn fetch_repositories<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<Vec<RepositoryRecord>, ClientError> {
  let page = paginate::<_, ApiRepository>(
    client,
    queries::WORKSPACE_REPOSITORIES,
    workspace_variables(workspace_id),
    "/workspace/repositoriesConnection",
    limit,
  )
  .await?;
  Ok(page.nodes.into_iter().map(RepositoryRecord::from).collect())
}

pub async fn fetch_labels<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<Vec<LabelRecord>, ClientError> {
  let page = paginate::<_, ApiLabel>(
    client,
    queries::WORKSPACE_LABELS,
    workspace_variables(workspace_id),
    "/workspace/labels",
    limit,
  )
  .await?;
  Ok(page.nodes.into_iter().map(LabelRecord::from).collect())
}

pub async fn fetch_priorities<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<Vec<PriorityRecord>, ClientError> {
  let page = paginate::<_, ApiLabel>(
    client,
    queries::WORKSPACE_PRIORITIES,
    workspace_variables(workspace_id),
    "/workspace/prioritiesConnection",
    limit,
  )
  .await?;
  Ok(page.nodes.into_iter().map(PriorityRecord::from).collect())
}

pub async fn fetch_users<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  limit: Option<usize>,
) -> Result<Vec<UserRecord>, ClientError> {
  let page = paginate::<_, ApiUser>(
    client,
    queries::WORKSPACE_USERS,
    workspace_variables(workspace_id),
    "/workspace/zenhubUsers",
    limit,
  )
  .await?;
  Ok(page.nodes.into_iter().map(UserRecord::from).collect())
}

/// Look up a workspace; `None` when the id names no visible workspace.
pub async fn fetch_workspace_name<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
) -> Result<Option<String>, ClientError> {
  let data = client
    .execute(
      queries::WORKSPACE,
      Value::Object(workspace_variables(workspace_id)),
    )
    .await?;
  let workspace: Option<ApiWorkspace> = decode_at(&data, "/workspace")?;
  Ok(workspace.map(|w| w.name))
}

/// Look up an issue by repository and number; the server is authoritative.
pub async fn fetch_issue_by_number<C: GraphqlExecutor>(
  client: &C,
  repository_gh_id: u64,
  number: u64,
) -> Result<Option<IssueRecord>, ClientError> {
  let data = client
    .execute(
      queries::ISSUE_BY_NUMBER,
      json!({ "repositoryGhId": repository_gh_id, "issueNumber": number }),
    )
    .await?;
  let issue: Option<ApiIssue> = decode_at(&data, "/issueByInfo")?;
  Ok(issue.map(IssueRecord::from))
}

/// Look up an issue by backend id.
pub async fn fetch_issue_by_id<C: GraphqlExecutor>(
  client: &C,
  id: &str,
) -> Result<Option<IssueRecord>, ClientError> {
  let data = client
    .execute(queries::ISSUE_BY_ID, json!({ "id": id }))
    .await?;
  // Non-issue nodes come back as an empty object
  let node = data.get("node").cloned().unwrap_or(Value::Null);
  if node.get("id").is_none() {
    return Ok(None);
  }
  let issue: ApiIssue = decode_at(&data, "/node")?;
  Ok(Some(IssueRecord::from(issue)))
}
