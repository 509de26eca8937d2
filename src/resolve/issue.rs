//! Issue references: `owner/repo#n`, `repo#n`, `#n` or `n` with a repository
//! flag, a branch name with a repository flag, or a raw backend id.
//!
//! Only the repository part is matched locally; the issue number goes to the
//! server as typed.

use std::fmt;
use tracing::debug;

use super::{require, Ambiguity, EntityKind, ResolveError, Resolver};
use crate::github::CodeHost;
use crate::zenhub::fetch::{fetch_issue_by_id, fetch_issue_by_number, fetch_repositories};
use crate::zenhub::{GraphqlExecutor, IssueRecord, RepositoryRecord};

/// Repository as typed, with or without its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
  pub owner: Option<String>,
  pub name: String,
}

impl RepoSpec {
  pub fn parse(input: &str) -> Result<Self, ResolveError> {
    let input = input.trim();
    let (owner, name) = match input.split_once('/') {
      Some((owner, name)) => (Some(owner), name),
      None => (None, input),
    };
    let valid = |part: &str| !part.is_empty() && !part.contains(&['/', '#', ' '][..]);
    if !valid(name) || !owner.map_or(true, valid) {
      return Err(ResolveError::usage(format!(
        "invalid repository '{}', expected 'repo' or 'owner/repo'",
        input
      )));
    }
    Ok(Self {
      owner: owner.map(str::to_string),
      name: name.to_string(),
    })
  }

  /// The narrower of two specs naming the same repository, or `None` when
  /// they name different ones.
  fn combine(&self, other: &RepoSpec) -> Option<RepoSpec> {
    if !self.name.eq_ignore_ascii_case(&other.name) {
      return None;
    }
    match (&self.owner, &other.owner) {
      (Some(a), Some(b)) if !a.eq_ignore_ascii_case(b) => None,
      (None, Some(_)) => Some(other.clone()),
      _ => Some(self.clone()),
    }
  }

  fn matches(&self, repo: &RepositoryRecord) -> bool {
    repo.name.eq_ignore_ascii_case(&self.name)
      && self
        .owner
        .as_ref()
        .map_or(true, |owner| repo.owner.eq_ignore_ascii_case(owner))
  }
}

impl fmt::Display for RepoSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.owner {
      Some(owner) => write!(f, "{}/{}", owner, self.name),
      None => f.write_str(&self.name),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueRef {
  Number { repo: RepoSpec, number: u64 },
  Branch { repo: RepoSpec, branch: String },
  Id(String),
}

fn parse_number(text: &str, identifier: &str) -> Result<u64, ResolveError> {
  match text.parse::<u64>() {
    Ok(n) if n > 0 => Ok(n),
    _ => Err(ResolveError::usage(format!(
      "invalid issue number in '{}'",
      identifier
    ))),
  }
}

fn repo_flag_required(
  repo_flag: Option<&str>,
  identifier: &str,
) -> Result<RepoSpec, ResolveError> {
  match repo_flag {
    Some(repo) => RepoSpec::parse(repo),
    None => Err(ResolveError::usage(format!(
      "'{}' needs a repository: use owner/repo#number or pass --repo",
      identifier
    ))),
  }
}

/// Parse an issue identifier; `repo_flag` is the repository given separately.
///
/// When both the identifier and the flag name a repository they must agree,
/// and the one carrying an owner is kept.
pub fn parse_issue_ref(
  identifier: &str,
  repo_flag: Option<&str>,
) -> Result<IssueRef, ResolveError> {
  let identifier = require(EntityKind::Issue, identifier)?;

  if let Some((repo, number)) = identifier.rsplit_once('#') {
    let number = parse_number(number, identifier)?;
    let repo = if repo.is_empty() {
      repo_flag_required(repo_flag, identifier)?
    } else {
      let typed = RepoSpec::parse(repo)?;
      match repo_flag {
        Some(flag) => {
          let flag = RepoSpec::parse(flag)?;
          typed.combine(&flag).ok_or_else(|| {
            ResolveError::usage(format!(
              "'{}' names repository '{}' but --repo is '{}'",
              identifier, typed, flag
            ))
          })?
        }
        None => typed,
      }
    };
    return Ok(IssueRef::Number { repo, number });
  }

  if identifier.chars().all(|c| c.is_ascii_digit()) {
    let number = parse_number(identifier, identifier)?;
    let repo = repo_flag_required(repo_flag, identifier)?;
    return Ok(IssueRef::Number { repo, number });
  }

  match repo_flag {
    Some(repo) => Ok(IssueRef::Branch {
      repo: RepoSpec::parse(repo)?,
      branch: identifier.to_string(),
    }),
    None => Ok(IssueRef::Id(identifier.to_string())),
  }
}

/// Exact name match, narrowed by owner when one was typed.
fn pick_repository(
  candidates: &[RepositoryRecord],
  spec: &RepoSpec,
) -> Result<RepositoryRecord, ResolveError> {
  let matches: Vec<&RepositoryRecord> = candidates.iter().filter(|r| spec.matches(r)).collect();
  match matches.as_slice() {
    [] => Err(ResolveError::not_found(EntityKind::Repo, &spec.to_string())),
    [only] => Ok((*only).clone()),
    _ => Err(ResolveError::Ambiguous(Ambiguity::new(
      &spec.to_string(),
      &matches,
    ))),
  }
}

impl<C: GraphqlExecutor> Resolver<'_, C> {
  pub async fn issue<H: CodeHost>(
    &self,
    identifier: &str,
    repo_flag: Option<&str>,
    code_host: Option<&H>,
  ) -> Result<IssueRecord, ResolveError> {
    let issue_ref = parse_issue_ref(identifier, repo_flag)?;
    debug!(?issue_ref, "resolving issue");

    let found = match &issue_ref {
      IssueRef::Id(id) => fetch_issue_by_id(self.client, id).await?,
      IssueRef::Number { repo, number } => {
        let repo = self.issue_repository(repo).await?;
        fetch_issue_by_number(self.client, repo.gh_id, *number).await?
      }
      IssueRef::Branch { repo, branch } => {
        let code_host = code_host.ok_or_else(|| {
          ResolveError::usage(format!(
            "'{}' looks like a branch name; resolving branches needs a github section in configuration",
            branch
          ))
        })?;
        let repo = self.issue_repository(repo).await?;
        match code_host.resolve_branch_to_issue(&repo, branch).await? {
          Some(number) => fetch_issue_by_number(self.client, repo.gh_id, number).await?,
          None => None,
        }
      }
    };

    found.ok_or_else(|| ResolveError::not_found(EntityKind::Issue, identifier.trim()))
  }

  async fn issue_repository(&self, spec: &RepoSpec) -> Result<RepositoryRecord, ResolveError> {
    self
      .resolve_listed(
        || fetch_repositories(self.client, self.workspace_id, None),
        |candidates| pick_repository(candidates, spec),
      )
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::memory_cache;
  use crate::zenhub::mock::MockExecutor;
  use crate::zenhub::ClientError;
  use serde_json::json;

  fn spec(owner: Option<&str>, name: &str) -> RepoSpec {
    RepoSpec {
      owner: owner.map(str::to_string),
      name: name.to_string(),
    }
  }

  #[test]
  fn test_parse_grammar() {
    assert_eq!(
      parse_issue_ref("acme/api#12", None).unwrap(),
      IssueRef::Number {
        repo: spec(Some("acme"), "api"),
        number: 12
      }
    );
    assert_eq!(
      parse_issue_ref("api#12", Some("acme/api")).unwrap(),
      IssueRef::Number {
        repo: spec(Some("acme"), "api"),
        number: 12
      }
    );
    assert_eq!(
      parse_issue_ref("#7", Some("acme/web")).unwrap(),
      IssueRef::Number {
        repo: spec(Some("acme"), "web"),
        number: 7
      }
    );
    assert_eq!(
      parse_issue_ref("7", Some("web")).unwrap(),
      IssueRef::Number {
        repo: spec(None, "web"),
        number: 7
      }
    );
    assert_eq!(
      parse_issue_ref("42-fix-login", Some("web")).unwrap(),
      IssueRef::Branch {
        repo: spec(None, "web"),
        branch: "42-fix-login".to_string()
      }
    );
    assert_eq!(
      parse_issue_ref("Z2lkOi8vcmFwdG9y", None).unwrap(),
      IssueRef::Id("Z2lkOi8vcmFwdG9y".to_string())
    );
  }

  #[test]
  fn test_parse_usage_errors() {
    for (identifier, repo) in [
      ("12", None),
      ("#12", None),
      ("api#0", None),
      ("api#twelve", None),
      ("acme/#3", None),
      ("", Some("api")),
      ("5", Some("a/b/c")),
      ("api#12", Some("web")),
      ("acme/api#12", Some("globex/api")),
    ] {
      let err = parse_issue_ref(identifier, repo).unwrap_err();
      assert!(
        matches!(err, ResolveError::Usage(_)),
        "{:?} gave {:?}",
        identifier,
        err
      );
      assert_eq!(err.exit_code(), 2);
    }
  }

  fn client() -> MockExecutor {
    MockExecutor::new()
      .respond(
        "WorkspaceRepositories",
        json!({"workspace": {"repositoriesConnection": {
          "nodes": [
            {"id": "r1", "ghId": 101, "name": "api", "ownerName": "acme"},
            {"id": "r2", "ghId": 202, "name": "api", "ownerName": "globex"},
            {"id": "r3", "ghId": 303, "name": "web", "ownerName": "acme"}
          ],
          "pageInfo": {"hasNextPage": false, "endCursor": null}
        }}}),
      )
      .respond(
        "IssueByInfo",
        json!({"issueByInfo": {"id": "i1", "number": 12, "title": "Fix login",
          "repository": {"name": "web", "ownerName": "acme"}}}),
      )
  }

  struct StubHost(Option<u64>);

  impl CodeHost for StubHost {
    async fn resolve_branch_to_issue(
      &self,
      _repo: &RepositoryRecord,
      _branch: &str,
    ) -> Result<Option<u64>, ClientError> {
      Ok(self.0)
    }
  }

  #[tokio::test]
  async fn test_repo_number_passes_through() {
    let client = client();
    let cache = memory_cache();
    let resolver = Resolver::new(&client, &cache, "ws1");

    let issue = resolver
      .issue::<StubHost>("web#12", None, None)
      .await
      .unwrap();
    assert_eq!(issue.id, "i1");
    let vars = client.last_variables("IssueByInfo").unwrap();
    assert_eq!(vars["repositoryGhId"], 303);
    assert_eq!(vars["issueNumber"], 12);
  }

  #[tokio::test]
  async fn test_owner_disambiguates_repository() {
    let client = client();
    let cache = memory_cache();
    let resolver = Resolver::new(&client, &cache, "ws1");

    match resolver.issue::<StubHost>("api#12", None, None).await {
      Err(ResolveError::Ambiguous(a)) => assert_eq!(a.matches.len(), 2),
      other => panic!("expected ambiguity, got {:?}", other),
    }
    resolver
      .issue::<StubHost>("globex/api#12", None, None)
      .await
      .unwrap();
    assert_eq!(
      client.last_variables("IssueByInfo").unwrap()["repositoryGhId"],
      202
    );
  }

  #[tokio::test]
  async fn test_missing_issue_is_not_found() {
    let client = client();
    client.set_response("IssueByInfo", json!({"issueByInfo": null}));
    let cache = memory_cache();
    let resolver = Resolver::new(&client, &cache, "ws1");

    let err = resolver
      .issue::<StubHost>("acme/web#999", None, None)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      ResolveError::NotFound {
        kind: EntityKind::Issue,
        ..
      }
    ));
  }

  #[tokio::test]
  async fn test_branch_uses_code_host() {
    let client = client();
    let cache = memory_cache();
    let resolver = Resolver::new(&client, &cache, "ws1");

    let issue = resolver
      .issue("fix-login", Some("web"), Some(&StubHost(Some(12))))
      .await
      .unwrap();
    assert_eq!(issue.number, 12);

    let err = resolver
      .issue("no-pr-yet", Some("web"), Some(&StubHost(None)))
      .await
      .unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
  }

  #[tokio::test]
  async fn test_branch_without_code_host_is_usage() {
    let client = client();
    let cache = memory_cache();
    let resolver = Resolver::new(&client, &cache, "ws1");
    let err = resolver
      .issue::<StubHost>("fix-login", Some("web"), None)
      .await
      .unwrap_err();
    assert!(matches!(err, ResolveError::Usage(_)));
    assert_eq!(client.total_calls(), 0);
  }

  #[tokio::test]
  async fn test_raw_id() {
    let client = MockExecutor::new().respond(
      "IssueById",
      json!({"node": {"id": "Z2lk", "number": 5, "title": "Typo",
        "repository": {"name": "web", "ownerName": "acme"}}}),
    );
    let cache = memory_cache();
    let resolver = Resolver::new(&client, &cache, "ws1");
    let issue = resolver.issue::<StubHost>("Z2lk", None, None).await.unwrap();
    assert_eq!(issue.number, 5);
    assert_eq!(client.calls("WorkspaceRepositories"), 0);
  }
}
