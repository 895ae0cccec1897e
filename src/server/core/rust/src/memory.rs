/* src/server/core/rust/src/memory.rs */

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use mosaic_engine::{ContentRow, RegistryEntry, RowKey};
use tokio::sync::RwLock;

use crate::errors::MosaicError;
use crate::store::{ContentStore, RegistryStore, RowPatch, RowQuery, WriteGuard};

/// In-process content store and registry. Enforces one row per key triple and
/// versioned compare-and-swap writes the same way a database-backed store
/// would.
#[derive(Default)]
pub struct MemoryStore {
  rows: RwLock<BTreeMap<RowKey, ContentRow>>,
  backups: RwLock<Vec<ContentRow>>,
  registry: RwLock<Vec<RegistryEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed rows as if each had been written once.
  pub fn with_rows(rows: impl IntoIterator<Item = ContentRow>) -> Self {
    let map = rows
      .into_iter()
      .map(|mut row| {
        row.version = row.version.max(1);
        (row.key(), row)
      })
      .collect();
    Self { rows: RwLock::new(map), ..Self::default() }
  }

  pub fn with_registry(self, entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
    Self { registry: RwLock::new(entries.into_iter().collect()), ..self }
  }

  pub async fn register(&self, entry: RegistryEntry) {
    self.registry.write().await.push(entry);
  }

  pub async fn row(
    &self,
    page_slug: &str,
    language: &str,
    section_key: &str,
  ) -> Option<ContentRow> {
    self.rows.read().await.get(&RowKey::new(page_slug, language, section_key)).cloned()
  }

  pub async fn backups(&self) -> Vec<ContentRow> {
    self.backups.read().await.clone()
  }

  pub async fn len(&self) -> usize {
    self.rows.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.rows.read().await.is_empty()
  }
}

#[async_trait]
impl ContentStore for MemoryStore {
  async fn get(&self, query: &RowQuery) -> Result<Vec<ContentRow>, MosaicError> {
    let rows = self.rows.read().await;
    Ok(rows.values().filter(|r| query.matches(r)).cloned().collect())
  }

  async fn upsert(
    &self,
    mut row: ContentRow,
    guard: WriteGuard,
  ) -> Result<ContentRow, MosaicError> {
    let key = row.key();
    let mut rows = self.rows.write().await;
    let stored = rows.get(&key).map(|r| r.version);
    if !guard.check(stored) {
      return Err(MosaicError::conflict(format!(
        "{}/{}/{} changed since it was read (expected {guard:?}, found {stored:?})",
        key.page_slug, key.language, key.section_key
      )));
    }
    row.version = stored.unwrap_or(0) + 1;
    row.updated_at = Some(Utc::now());
    rows.insert(key, row.clone());
    Ok(row)
  }

  async fn update(&self, query: &RowQuery, patch: &RowPatch) -> Result<usize, MosaicError> {
    let mut rows = self.rows.write().await;
    let now = Utc::now();
    let mut changed = 0;
    for row in rows.values_mut().filter(|r| query.matches(r)) {
      patch.apply(row);
      row.version += 1;
      row.updated_at = Some(now);
      changed += 1;
    }
    Ok(changed)
  }

  async fn backup(&self, row: &ContentRow) -> Result<(), MosaicError> {
    self.backups.write().await.push(row.clone());
    Ok(())
  }
}

#[async_trait]
impl RegistryStore for MemoryStore {
  async fn list(
    &self,
    page_slug: &str,
    include_deleted: bool,
  ) -> Result<Vec<RegistryEntry>, MosaicError> {
    let registry = self.registry.read().await;
    let mut entries: Vec<RegistryEntry> = registry
      .iter()
      .filter(|e| e.page_slug == page_slug && (include_deleted || !e.deleted))
      .cloned()
      .collect();
    entries.sort_by_key(|e| e.position);
    Ok(entries)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn upsert_bumps_version_and_enforces_guard() {
    let store = MemoryStore::new();
    let first = store
      .upsert(ContentRow::text("home", "en", "hero_title", "Hi"), WriteGuard::Absent)
      .await
      .unwrap();
    assert_eq!(first.version, 1);
    assert!(first.updated_at.is_some());

    let err = store
      .upsert(ContentRow::text("home", "en", "hero_title", "Again"), WriteGuard::Absent)
      .await
      .unwrap_err();
    assert!(err.is_conflict());

    let second = store
      .upsert(ContentRow::text("home", "en", "hero_title", "Hello"), WriteGuard::Version(1))
      .await
      .unwrap();
    assert_eq!(second.version, 2);

    let stale = store
      .upsert(ContentRow::text("home", "en", "hero_title", "Stale"), WriteGuard::Version(1))
      .await;
    assert!(stale.unwrap_err().is_conflict());
    assert_eq!(store.row("home", "en", "hero_title").await.unwrap().value, "Hello");
  }

  #[tokio::test]
  async fn one_row_per_key_triple() {
    let store = MemoryStore::new();
    for value in ["a", "b", "c"] {
      store.upsert(ContentRow::text("home", "en", "k", value), WriteGuard::Any).await.unwrap();
    }
    store.upsert(ContentRow::text("home", "de", "k", "x"), WriteGuard::Any).await.unwrap();
    assert_eq!(store.len().await, 2);
    assert_eq!(store.get(&RowQuery::page("home").language("en")).await.unwrap()[0].value, "c");
  }

  #[tokio::test]
  async fn update_by_filter() {
    let store = MemoryStore::with_rows([
      ContentRow::text("home", "en", "a", "1"),
      ContentRow::text("home", "de", "a", "1"),
      ContentRow::text("home", "en", "b", "1"),
    ]);
    let patch = RowPatch { value: Some("2".into()), ..Default::default() };
    let changed = store.update(&RowQuery::page("home").section("a"), &patch).await.unwrap();
    assert_eq!(changed, 2);
    let row = store.row("home", "de", "a").await.unwrap();
    assert_eq!(row.value, "2");
    assert_eq!(row.version, 2);
    assert_eq!(store.row("home", "en", "b").await.unwrap().value, "1");
  }

  #[tokio::test]
  async fn registry_listing() {
    let mut deleted = RegistryEntry::new("home", "old", 3, "text").at(0);
    deleted.deleted = true;
    let store = MemoryStore::new().with_registry([
      RegistryEntry::new("home", "faq", 2, "faq").at(2),
      RegistryEntry::new("home", "hero_legacy", 1, "hero").at(1),
      RegistryEntry::new("about", "hero_legacy", 9, "hero"),
      deleted,
    ]);
    let live = store.list("home", false).await.unwrap();
    let keys: Vec<&str> = live.iter().map(|e| e.segment_key.as_str()).collect();
    assert_eq!(keys, vec!["hero_legacy", "faq"]);
    assert_eq!(store.list("home", true).await.unwrap().len(), 3);
  }
}
