//! GraphQL documents sent to the ZenHub API.
//!
//! Every list query takes `$workspaceId`, `$first` and `$after` and exposes a
//! connection with `nodes` and `pageInfo`.

pub const WORKSPACE_PIPELINES: &str = r#"
query WorkspacePipelines($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    pipelinesConnection(first: $first, after: $after) {
      nodes { id name }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

pub const WORKSPACE_EPICS: &str = r#"
query WorkspaceEpics($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    roadmap {
      items(first: $first, after: $after) {
        nodes {
          __typename
          ... on ZenhubEpic { id title }
          ... on Epic {
            id
            issue { title number repository { name ownerName } }
          }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}
"#;

pub const WORKSPACE_SPRINTS: &str = r#"
query WorkspaceSprints($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    sprints(first: $first, after: $after, orderBy: { field: END_AT, direction: DESC }) {
      nodes { id name generatedName state startAt endAt }
      pageInfo { hasNextPage endCursor }
    }
    activeSprint { id name generatedName state startAt endAt }
    upcomingSprint { id name generatedName state startAt endAt }
    previousSprint { id name generatedName state startAt endAt }
  }
}
"#;

pub const WORKSPACE_REPOSITORIES: &str = r#"
query WorkspaceRepositories($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    repositoriesConnection(first: $first, after: $after) {
      nodes { id ghId name ownerName }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

pub const WORKSPACE_LABELS: &str = r#"
query WorkspaceLabels($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    labels(first: $first, after: $after) {
      nodes { id name color }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

pub const WORKSPACE_PRIORITIES: &str = r#"
query WorkspacePriorities($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    prioritiesConnection(first: $first, after: $after) {
      nodes { id name color }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

pub const WORKSPACE_USERS: &str = r#"
query WorkspaceUsers($workspaceId: ID!, $first: Int!, $after: String) {
  workspace(id: $workspaceId) {
    zenhubUsers(first: $first, after: $after) {
      nodes { id name githubUser { login } }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

pub const WORKSPACE: &str = r#"
query Workspace($workspaceId: ID!) {
  workspace(id: $workspaceId) { id name }
}
"#;

pub const ISSUE_BY_NUMBER: &str = r#"
query IssueByInfo($repositoryGhId: Int!, $issueNumber: Int!) {
  issueByInfo(repositoryGhId: $repositoryGhId, issueNumber: $issueNumber) {
    id number title
    repository { name ownerName }
  }
}
"#;

pub const ISSUE_BY_ID: &str = r#"
query IssueById($id: ID!) {
  node(id: $id) {
    ... on Issue {
      id number title
      repository { name ownerName }
    }
  }
}
"#;

pub const CREATE_PIPELINE: &str = r#"
mutation CreatePipeline($input: CreatePipelineInput!) {
  createPipeline(input: $input) {
    pipeline { id name }
  }
}
"#;

pub const UPDATE_PIPELINE: &str = r#"
mutation UpdatePipeline($input: UpdatePipelineInput!) {
  updatePipeline(input: $input) {
    pipeline { id name }
  }
}
"#;

pub const DELETE_PIPELINE: &str = r#"
mutation DeletePipeline($input: DeletePipelineInput!) {
  deletePipeline(input: $input) {
    destinationPipeline { id name }
  }
}
"#;

pub const CREATE_EPIC: &str = r#"
mutation CreateZenhubEpic($input: CreateZenhubEpicInput!) {
  createZenhubEpic(input: $input) {
    zenhubEpic { id title }
  }
}
"#;

/// Extract the operation name (`WorkspacePipelines`) from a document.
pub fn operation_name(document: &str) -> &str {
  let trimmed = document.trim_start();
  let rest = trimmed
    .strip_prefix("query")
    .or_else(|| trimmed.strip_prefix("mutation"))
    .unwrap_or(trimmed)
    .trim_start();
  let end = rest
    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
    .unwrap_or(rest.len());
  &rest[..end]
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE_INFO: &str = "pageInfo { hasNextPage endCursor }";

  #[test]
  fn test_operation_names() {
    assert_eq!(operation_name(WORKSPACE_PIPELINES), "WorkspacePipelines");
    assert_eq!(operation_name(CREATE_EPIC), "CreateZenhubEpic");
    assert_eq!(operation_name(ISSUE_BY_ID), "IssueById");
    assert_eq!(operation_name("{ viewer { id } }"), "");
  }

  #[test]
  fn test_list_queries_page() {
    for query in [
      WORKSPACE_PIPELINES,
      WORKSPACE_EPICS,
      WORKSPACE_SPRINTS,
      WORKSPACE_REPOSITORIES,
      WORKSPACE_LABELS,
      WORKSPACE_PRIORITIES,
      WORKSPACE_USERS,
    ] {
      assert!(query.contains(PAGE_INFO), "{}", operation_name(query));
      assert!(query.contains("$after: String"));
    }
  }
}
