//! Mutations issued by commands that change workspace entities.
//!
//! Callers are responsible for invalidating the affected cache namespace
//! once a mutation succeeds.

use serde_json::json;

use super::api_types::{ApiPipeline, ApiRoadmapItem};
use super::client::{decode_at, ClientError, GraphqlExecutor};
use super::queries;
use super::types::{EpicRecord, PipelineRecord};

pub async fn create_pipeline<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  name: &str,
) -> Result<PipelineRecord, ClientError> {
  let data = client
    .execute(
      queries::CREATE_PIPELINE,
      json!({ "input": { "workspaceId": workspace_id, "name": name } }),
    )
    .await?;
  let pipeline: ApiPipeline = decode_at(&data, "/createPipeline/pipeline")?;
  Ok(pipeline.into())
}

pub async fn rename_pipeline<C: GraphqlExecutor>(
  client: &C,
  pipeline_id: &str,
  name: &str,
) -> Result<PipelineRecord, ClientError> {
  let data = client
    .execute(
      queries::UPDATE_PIPELINE,
      json!({ "input": { "pipelineId": pipeline_id, "name": name } }),
    )
    .await?;
  let pipeline: ApiPipeline = decode_at(&data, "/updatePipeline/pipeline")?;
  Ok(pipeline.into())
}

/// Delete a pipeline, moving its issues into `destination_id`.
pub async fn delete_pipeline<C: GraphqlExecutor>(
  client: &C,
  pipeline_id: &str,
  destination_id: &str,
) -> Result<PipelineRecord, ClientError> {
  let data = client
    .execute(
      queries::DELETE_PIPELINE,
      json!({ "input": {
        "pipelineId": pipeline_id,
        "destinationPipelineId": destination_id
      } }),
    )
    .await?;
  let destination: ApiPipeline = decode_at(&data, "/deletePipeline/destinationPipeline")?;
  Ok(destination.into())
}

pub async fn create_epic<C: GraphqlExecutor>(
  client: &C,
  workspace_id: &str,
  title: &str,
  body: Option<&str>,
) -> Result<EpicRecord, ClientError> {
  let data = client
    .execute(
      queries::CREATE_EPIC,
      json!({ "input": {
        "workspaceId": workspace_id,
        "zenhubEpic": { "title": title, "body": body.unwrap_or_default() }
      } }),
    )
    .await?;
  let mut epic: serde_json::Value = decode_at(&data, "/createZenhubEpic/zenhubEpic")?;
  epic["__typename"] = json!("ZenhubEpic");
  let item: ApiRoadmapItem = serde_json::from_value(epic).map_err(|source| ClientError::Decode {
    path: "/createZenhubEpic/zenhubEpic".to_string(),
    source,
  })?;
  item.into_epic().ok_or(ClientError::EmptyResponse)
}
