/* src/server/core/rust/src/store.rs */

//! Traits for the external content row store and segment registry.

use async_trait::async_trait;
use mosaic_engine::{ContentRow, RegistryEntry};
use serde::{Deserialize, Serialize};

use crate::errors::MosaicError;

/// Row filter. `language` and `section_key` narrow the page when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowQuery {
  pub page_slug: String,
  pub language: Option<String>,
  pub section_key: Option<String>,
}

impl RowQuery {
  pub fn page(page_slug: impl Into<String>) -> Self {
    Self { page_slug: page_slug.into(), ..Default::default() }
  }

  pub fn language(mut self, language: impl Into<String>) -> Self {
    self.language = Some(language.into());
    self
  }

  pub fn section(mut self, section_key: impl Into<String>) -> Self {
    self.section_key = Some(section_key.into());
    self
  }

  pub fn matches(&self, row: &ContentRow) -> bool {
    row.page_slug == self.page_slug
      && self.language.as_ref().is_none_or(|l| *l == row.language)
      && self.section_key.as_ref().is_none_or(|k| *k == row.section_key)
  }
}

/// Partial update applied to every row a query matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowPatch {
  pub content_type: Option<String>,
  pub value: Option<String>,
  pub updated_by: Option<String>,
}

impl RowPatch {
  pub fn apply(&self, row: &mut ContentRow) {
    if let Some(ct) = &self.content_type {
      row.content_type.clone_from(ct);
    }
    if let Some(v) = &self.value {
      row.value.clone_from(v);
    }
    if let Some(u) = &self.updated_by {
      row.updated_by = Some(u.clone());
    }
  }
}

/// Compare-and-swap precondition for an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteGuard {
  /// Unconditional write.
  Any,
  /// The row must not exist yet.
  Absent,
  /// The stored row must still carry this version.
  Version(u64),
}

impl WriteGuard {
  /// Guard that succeeds only if `current` is still what the caller read.
  pub fn expect(current: Option<&ContentRow>) -> Self {
    current.map_or(Self::Absent, |row| Self::Version(row.version))
  }

  /// Check the guard against the stored version (`None` when absent).
  pub fn check(self, stored: Option<u64>) -> bool {
    match (self, stored) {
      (Self::Any, _) => true,
      (Self::Absent, None) => true,
      (Self::Absent, Some(_)) => false,
      (Self::Version(want), Some(have)) => want == have,
      (Self::Version(_), None) => false,
    }
  }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
  async fn get(&self, query: &RowQuery) -> Result<Vec<ContentRow>, MosaicError>;

  /// Insert or replace the row at its key triple. Returns the stored row with
  /// its new version. Fails with `CONFLICT` when `guard` does not hold.
  async fn upsert(&self, row: ContentRow, guard: WriteGuard) -> Result<ContentRow, MosaicError>;

  /// Patch every matching row. Returns how many rows changed.
  async fn update(&self, query: &RowQuery, patch: &RowPatch) -> Result<usize, MosaicError>;

  /// Snapshot a row's prior value into the backup log.
  async fn backup(&self, row: &ContentRow) -> Result<(), MosaicError>;

  async fn get_row(
    &self,
    page_slug: &str,
    language: &str,
    section_key: &str,
  ) -> Result<Option<ContentRow>, MosaicError> {
    let query = RowQuery::page(page_slug).language(language).section(section_key);
    Ok(self.get(&query).await?.into_iter().next())
  }
}

#[async_trait]
pub trait RegistryStore: Send + Sync {
  async fn list(
    &self,
    page_slug: &str,
    include_deleted: bool,
  ) -> Result<Vec<RegistryEntry>, MosaicError>;
}
