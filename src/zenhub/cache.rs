//! Caching implementations for ZenHub records.

use crate::cache::{Cacheable, Namespace};

use super::types::{
  EpicRecord, LabelRecord, PipelineRecord, PriorityRecord, RepositoryRecord, SprintRecord,
};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for PipelineRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn namespace() -> Namespace {
    Namespace::Pipelines
  }
}

impl Cacheable for EpicRecord {
  fn cache_key(&self) -> &str {
    self.id()
  }

  fn namespace() -> Namespace {
    Namespace::Epics
  }
}

impl Cacheable for SprintRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn namespace() -> Namespace {
    Namespace::Sprints
  }
}

impl Cacheable for RepositoryRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn namespace() -> Namespace {
    Namespace::Repos
  }
}

impl Cacheable for LabelRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn namespace() -> Namespace {
    Namespace::Labels
  }
}

impl Cacheable for PriorityRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn namespace() -> Namespace {
    Namespace::Priorities
  }
}
