/* src/server/core/rust/src/editor.rs */

//! Write path. One schema-driven editor serves every segment kind.

mod sync;
mod translate;

use std::collections::HashSet;
use std::sync::Arc;

use mosaic_engine::{
  ContentRow, PAGE_SEGMENTS_KEY, SegmentRecord, TAB_ORDER_KEY, apply_sibling_payload,
  find_duplicate_id, parse_segments, parse_tab_order, schema_for, segment_aliases,
  uses_sibling_row,
};

use crate::config::I18nSection;
use crate::errors::MosaicError;
use crate::store::{ContentStore, RegistryStore, WriteGuard};
use crate::translator::Translator;

pub use sync::{LanguageSyncOutcome, LanguageSyncResult, SyncReport};

/// Result of [`SegmentEditor::commit_segment`].
#[derive(Debug)]
pub struct CommitReport {
  pub row: ContentRow,
  /// Present when the commit happened in the reference language.
  pub sync: Option<SyncReport>,
}

#[derive(Clone)]
pub struct SegmentEditor {
  content: Arc<dyn ContentStore>,
  registry: Option<Arc<dyn RegistryStore>>,
  translator: Option<Arc<dyn Translator>>,
  i18n: I18nSection,
}

impl SegmentEditor {
  pub fn new(content: Arc<dyn ContentStore>, i18n: I18nSection) -> Self {
    Self { content, registry: None, translator: None, i18n }
  }

  /// Registry used to recognise a segment listed in a tab order under its
  /// other id (key or numeric id).
  pub fn with_registry(mut self, registry: Arc<dyn RegistryStore>) -> Self {
    self.registry = Some(registry);
    self
  }

  pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
    self.translator = Some(translator);
    self
  }

  pub fn i18n(&self) -> &I18nSection {
    &self.i18n
  }

  /// Current `page_segments` row and its parsed segments (empty when absent).
  pub async fn load_segments(
    &self,
    page_slug: &str,
    language: &str,
  ) -> Result<(Option<ContentRow>, Vec<SegmentRecord>), MosaicError> {
    let Some(row) = self.content.get_row(page_slug, language, PAGE_SEGMENTS_KEY).await? else {
      return Ok((None, Vec::new()));
    };
    let segments = parse_segments(&row.value).map_err(|e| {
      MosaicError::internal(format!(
        "stored page_segments for {page_slug}/{language} is unreadable: {e}"
      ))
    })?;
    Ok((Some(row), segments))
  }

  /// Like [`Self::load_segments`], but with sibling-row payloads applied the
  /// way the read path applies them, so callers see what readers see.
  pub async fn load_effective_segments(
    &self,
    page_slug: &str,
    language: &str,
  ) -> Result<(Option<ContentRow>, Vec<SegmentRecord>), MosaicError> {
    let (row, mut segments) = self.load_segments(page_slug, language).await?;
    for seg in segments.iter_mut().filter(|s| uses_sibling_row(s)) {
      let Some(sibling) = self.content.get_row(page_slug, language, &seg.id).await? else {
        continue;
      };
      if !apply_sibling_payload(seg, &sibling) {
        tracing::warn!(
          page = page_slug,
          language,
          segment = %seg.id,
          "sibling payload is not a JSON object, using inline data"
        );
      }
    }
    Ok((row, segments))
  }

  /// Ids the registry also knows `segment_id` by. Empty without a registry.
  async fn aliases(&self, page_slug: &str, segment_id: &str) -> Result<Vec<String>, MosaicError> {
    let Some(registry) = &self.registry else {
      return Ok(Vec::new());
    };
    let entries = registry.list(page_slug, false).await?;
    Ok(segment_aliases(&entries, segment_id))
  }

  /// Current `tab_order` row and its ids. An unreadable payload counts as no
  /// tab order, the row is still returned so a rewrite can guard on it.
  pub async fn load_tab_order(
    &self,
    page_slug: &str,
    language: &str,
  ) -> Result<(Option<ContentRow>, Option<Vec<String>>), MosaicError> {
    let row = self.content.get_row(page_slug, language, TAB_ORDER_KEY).await?;
    let ids = row.as_ref().and_then(|r| parse_tab_order(&r.value));
    if row.is_some() && ids.is_none() {
      tracing::warn!(page = page_slug, language, "tab_order row unreadable, treating as absent");
    }
    Ok((row, ids))
  }

  /// Unique non-blank ids plus every schema rule.
  pub fn validate_segments(segments: &[SegmentRecord]) -> Result<(), MosaicError> {
    if let Some(seg) = segments.iter().find(|s| s.id.trim().is_empty()) {
      return Err(MosaicError::validation(format!("segment of type {} has a blank id", seg.kind)));
    }
    if let Some(id) = find_duplicate_id(segments) {
      return Err(MosaicError::validation(format!("duplicate segment id \"{id}\"")));
    }
    let issues: Vec<String> =
      segments.iter().flat_map(|s| schema_for(&s.kind).validate(s)).collect();
    if !issues.is_empty() {
      return Err(MosaicError::validation(issues.join("; ")));
    }
    Ok(())
  }

  /// Snapshot `previous` (if any) and write `row` guarded by `guard`.
  async fn write(
    &self,
    row: ContentRow,
    previous: Option<&ContentRow>,
    guard: WriteGuard,
  ) -> Result<ContentRow, MosaicError> {
    if let Some(prev) = previous {
      self.content.backup(prev).await?;
    }
    self.content.upsert(row, guard).await
  }

  /// Bring an existing sibling row of `seg` in line with its data. Returns
  /// whether a write happened; segments without a sibling row are skipped.
  async fn rewrite_sibling_row(
    &self,
    page_slug: &str,
    language: &str,
    seg: &SegmentRecord,
    user: &str,
  ) -> Result<bool, MosaicError> {
    if !uses_sibling_row(seg) {
      return Ok(false);
    }
    let Some(sibling) = self.content.get_row(page_slug, language, &seg.id).await? else {
      return Ok(false);
    };
    let next = ContentRow::json(page_slug, language, &seg.id, &seg.data).with_author(user);
    if next.value == sibling.value {
      return Ok(false);
    }
    self.write(next, Some(&sibling), WriteGuard::expect(Some(&sibling))).await?;
    tracing::debug!(page = page_slug, language, segment = %seg.id, "sibling row rewritten");
    Ok(true)
  }

  /// Validate and store a language's full segment array.
  ///
  /// Kinds stored as sibling rows also get their sibling row rewritten when
  /// one exists, otherwise the stale sibling would shadow the edit on read.
  pub async fn save_segments(
    &self,
    page_slug: &str,
    language: &str,
    segments: &[SegmentRecord],
    user: &str,
    guard: WriteGuard,
  ) -> Result<ContentRow, MosaicError> {
    Self::validate_segments(segments)?;
    let previous = self.content.get_row(page_slug, language, PAGE_SEGMENTS_KEY).await?;
    let value = serde_json::to_value(segments)?;
    let row = ContentRow::json(page_slug, language, PAGE_SEGMENTS_KEY, &value).with_author(user);
    let stored = self.write(row, previous.as_ref(), guard).await?;

    for seg in segments {
      self.rewrite_sibling_row(page_slug, language, seg, user).await?;
    }

    tracing::info!(
      page = page_slug,
      language,
      segments = segments.len(),
      version = stored.version,
      "page segments saved"
    );
    Ok(stored)
  }

  /// Save the array, make the committed segment visible in this language's
  /// tab order, and when editing the reference language sync the others.
  pub async fn commit_segment(
    &self,
    page_slug: &str,
    language: &str,
    segments: &[SegmentRecord],
    segment_id: &str,
    user: &str,
  ) -> Result<CommitReport, MosaicError> {
    if !segments.iter().any(|s| s.id == segment_id) {
      return Err(MosaicError::not_found(format!("segment \"{segment_id}\" is not in the array")));
    }
    let previous = self.content.get_row(page_slug, language, PAGE_SEGMENTS_KEY).await?;
    let row = self
      .save_segments(page_slug, language, segments, user, WriteGuard::expect(previous.as_ref()))
      .await?;

    // An existing tab order hides anything it does not list.
    let (tab_row, tab) = self.load_tab_order(page_slug, language).await?;
    let aliases = self.aliases(page_slug, segment_id).await?;
    let names_segment = |id: &String| id == segment_id || aliases.contains(id);
    if let Some(current) = tab.filter(|ids| !ids.iter().any(names_segment)) {
      let mut ids = current;
      ids.push(segment_id.to_string());
      self.save_tab_order_guarded(page_slug, language, &ids, user, tab_row.as_ref()).await?;
    }

    let sync = if self.i18n.is_reference(language) {
      Some(self.sync_to_other_languages(page_slug, language, segments, segment_id).await?)
    } else {
      None
    };
    Ok(CommitReport { row, sync })
  }

  /// Drop one segment from a language's array. A sibling row of the segment
  /// stays in the store; readers report it as an orphan instead of a flat
  /// field.
  pub async fn remove_segment(
    &self,
    page_slug: &str,
    language: &str,
    segment_id: &str,
    user: &str,
  ) -> Result<ContentRow, MosaicError> {
    let (previous, mut segments) = self.load_segments(page_slug, language).await?;
    let before = segments.len();
    segments.retain(|s| s.id != segment_id);
    if segments.len() == before {
      return Err(MosaicError::not_found(format!(
        "segment \"{segment_id}\" not found on {page_slug}/{language}"
      )));
    }
    let value = serde_json::to_value(&segments)?;
    let row = ContentRow::json(page_slug, language, PAGE_SEGMENTS_KEY, &value).with_author(user);
    let stored = self.write(row, previous.as_ref(), WriteGuard::expect(previous.as_ref())).await?;
    tracing::info!(page = page_slug, language, segment = segment_id, "segment removed");
    Ok(stored)
  }

  pub async fn save_tab_order(
    &self,
    page_slug: &str,
    language: &str,
    ids: &[String],
    user: &str,
  ) -> Result<ContentRow, MosaicError> {
    let mut seen = HashSet::new();
    for id in ids {
      if id.trim().is_empty() {
        return Err(MosaicError::validation("tab order contains a blank id"));
      }
      if !seen.insert(id.as_str()) {
        return Err(MosaicError::validation(format!("tab order lists \"{id}\" more than once")));
      }
    }
    let previous = self.content.get_row(page_slug, language, TAB_ORDER_KEY).await?;
    self.save_tab_order_guarded(page_slug, language, ids, user, previous.as_ref()).await
  }

  async fn save_tab_order_guarded(
    &self,
    page_slug: &str,
    language: &str,
    ids: &[String],
    user: &str,
    previous: Option<&ContentRow>,
  ) -> Result<ContentRow, MosaicError> {
    let value = serde_json::to_value(ids)?;
    let row = ContentRow::json(page_slug, language, TAB_ORDER_KEY, &value).with_author(user);
    let stored = self.write(row, previous, WriteGuard::expect(previous)).await?;
    tracing::debug!(page = page_slug, language, entries = ids.len(), "tab order saved");
    Ok(stored)
  }
}
