//! GitHub access, used only to turn a branch name into the issue it closes.

use color_eyre::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{Config, GithubConfig};
use crate::zenhub::client::{decode_at, ClientError, GraphqlClient, GraphqlExecutor};
use crate::zenhub::RepositoryRecord;

const BRANCH_ISSUE: &str = r#"
query BranchIssue($owner: String!, $name: String!, $ref: String!) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $ref) {
      associatedPullRequests(first: 10, orderBy: {field: UPDATED_AT, direction: DESC}) {
        nodes {
          closingIssuesReferences(first: 1) {
            nodes { number }
          }
        }
      }
    }
  }
}
"#;

/// Code host able to map a branch to the issue its pull request closes.
pub trait CodeHost {
  async fn resolve_branch_to_issue(
    &self,
    repo: &RepositoryRecord,
    branch: &str,
  ) -> Result<Option<u64>, ClientError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPullRequest {
  closing_issues_references: ApiNodes<ApiIssueNumber>,
}

#[derive(Debug, Deserialize)]
struct ApiNodes<N> {
  #[serde(default = "Vec::new")]
  nodes: Vec<N>,
}

#[derive(Debug, Deserialize)]
struct ApiIssueNumber {
  number: u64,
}

/// Leading issue number in conventional branch names (`123-fix-login`, `issue/123`).
fn number_from_branch(branch: &str) -> Option<u64> {
  let tail = branch.rsplit('/').next().unwrap_or(branch);
  let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
  let rest = &tail[digits.len()..];
  if !digits.is_empty() && (rest.is_empty() || rest.starts_with('-') || rest.starts_with('_')) {
    digits.parse().ok().filter(|n| *n > 0)
  } else {
    None
  }
}

pub struct GithubClient<C = GraphqlClient> {
  client: C,
}

impl GithubClient {
  /// Client for the configured GitHub endpoint; `None` when GitHub is not configured.
  pub fn from_config(config: &Config) -> Result<Option<Self>> {
    let Some(GithubConfig { url }) = &config.github else {
      return Ok(None);
    };
    let client = GraphqlClient::new(url, Config::get_github_token()?)?;
    Ok(Some(Self { client }))
  }
}

impl<C: GraphqlExecutor> GithubClient<C> {
  #[cfg(test)]
  pub fn with_executor(client: C) -> Self {
    Self { client }
  }
}

impl<C: GraphqlExecutor> CodeHost for GithubClient<C> {
  async fn resolve_branch_to_issue(
    &self,
    repo: &RepositoryRecord,
    branch: &str,
  ) -> Result<Option<u64>, ClientError> {
    let data = self
      .client
      .execute(
        BRANCH_ISSUE,
        json!({
          "owner": repo.owner,
          "name": repo.name,
          "ref": format!("refs/heads/{}", branch),
        }),
      )
      .await?;

    let pulls: Option<ApiNodes<ApiPullRequest>> =
      decode_at(&data, "/repository/ref/associatedPullRequests")?;
    let linked = pulls
      .into_iter()
      .flat_map(|p| p.nodes)
      .flat_map(|p| p.closing_issues_references.nodes)
      .map(|i| i.number)
      .next();

    debug!(repo = %repo.full_name(), branch, ?linked, "branch lookup");
    Ok(linked.or_else(|| number_from_branch(branch)))
  }
}
