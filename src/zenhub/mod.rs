//! ZenHub GraphQL access: client, wire types, lightweight records and fetchers.

pub mod api_types;
pub mod cache;
pub mod client;
pub mod fetch;
#[cfg(test)]
pub mod mock;
pub mod mutations;
pub mod queries;
pub mod types;

pub use client::{ClientError, GraphqlClient, GraphqlExecutor};
pub use types::{
  EpicRecord, IssueRecord, LabelRecord, PipelineRecord, PriorityRecord, RepositoryRecord,
  SprintRecord, UserRecord,
};
