//! Cache invalidation fired by mutating commands.
//!
//! All hooks are best-effort: a failure to clear is logged, and the stale
//! entry still expires on its own.

use tracing::info;

use crate::cache::{CacheKey, CacheLayer, Namespace};

/// After a pipeline was created, renamed or deleted.
pub fn pipelines_changed(cache: &CacheLayer, workspace_id: &str) {
  info!(workspace_id, "pipelines changed");
  cache.invalidate(&CacheKey::new(Namespace::Pipelines, workspace_id));
}

/// After an epic was created.
pub fn epics_changed(cache: &CacheLayer, workspace_id: &str) {
  info!(workspace_id, "epics changed");
  cache.invalidate(&CacheKey::new(Namespace::Epics, workspace_id));
}

/// After the active workspace changed; drops every namespace of the old one.
pub fn workspace_switched(cache: &CacheLayer, previous: Option<&str>, current: &str) {
  match previous {
    Some(previous) if previous != current => {
      info!(previous, current, "workspace switched");
      cache.invalidate_workspace(previous);
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{memory_cache, CacheLayer, FailingStorage};
  use crate::resolve::{AliasTable, Resolver};
  use crate::zenhub::mock::MockExecutor;
  use crate::zenhub::{LabelRecord, PipelineRecord};
  use serde_json::json;
  use std::sync::Arc;

  fn pipeline(id: &str, name: &str) -> PipelineRecord {
    PipelineRecord {
      id: id.to_string(),
      name: name.to_string(),
    }
  }

  fn label(id: &str) -> LabelRecord {
    LabelRecord {
      id: id.to_string(),
      name: id.to_string(),
      color: String::new(),
    }
  }

  #[tokio::test]
  async fn test_next_resolution_after_invalidation_fetches() {
    let client = MockExecutor::new().respond(
      "WorkspacePipelines",
      json!({"workspace": {"pipelinesConnection": {
        "nodes": [{"id": "p1", "name": "Triage"}],
        "pageInfo": {"hasNextPage": false, "endCursor": null}
      }}}),
    );
    let cache = memory_cache();
    // Pre-mutation list still names p1 "Backlog"
    cache
      .fetch_into_cache(&[pipeline("p1", "Backlog")], "ws1")
      .unwrap();

    pipelines_changed(&cache, "ws1");

    let resolver = Resolver::new(&client, &cache, "ws1");
    let found = resolver.pipeline("p1", &AliasTable::default()).await.unwrap();
    assert_eq!(found.name, "Triage");
    assert_eq!(client.calls("WorkspacePipelines"), 1);
  }

  #[test]
  fn test_epics_changed_leaves_other_namespaces() {
    let cache = memory_cache();
    cache
      .fetch_into_cache(&[pipeline("p1", "Backlog")], "ws1")
      .unwrap();
    epics_changed(&cache, "ws1");
    assert!(cache
      .load::<PipelineRecord>(&CacheKey::new(Namespace::Pipelines, "ws1"))
      .is_some());
  }

  #[test]
  fn test_switch_clears_only_previous_workspace() {
    let cache = memory_cache();
    cache
      .fetch_into_cache(&[pipeline("p1", "Backlog")], "A")
      .unwrap();
    cache.fetch_into_cache(&[label("bug")], "A").unwrap();
    cache
      .fetch_into_cache(&[pipeline("q1", "Backlog")], "B")
      .unwrap();

    workspace_switched(&cache, Some("A"), "B");

    assert!(cache
      .load::<PipelineRecord>(&CacheKey::new(Namespace::Pipelines, "A"))
      .is_none());
    assert!(cache
      .load::<LabelRecord>(&CacheKey::new(Namespace::Labels, "A"))
      .is_none());
    assert!(cache
      .load::<PipelineRecord>(&CacheKey::new(Namespace::Pipelines, "B"))
      .is_some());
  }

  #[test]
  fn test_switch_to_same_workspace_keeps_cache() {
    let cache = memory_cache();
    cache
      .fetch_into_cache(&[pipeline("p1", "Backlog")], "A")
      .unwrap();
    workspace_switched(&cache, Some("A"), "A");
    workspace_switched(&cache, None, "A");
    assert!(cache
      .load::<PipelineRecord>(&CacheKey::new(Namespace::Pipelines, "A"))
      .is_some());
  }

  #[test]
  fn test_hooks_never_fail() {
    let cache = CacheLayer::new(Arc::new(FailingStorage));
    pipelines_changed(&cache, "ws1");
    epics_changed(&cache, "ws1");
    workspace_switched(&cache, Some("ws1"), "ws2");
  }
}
