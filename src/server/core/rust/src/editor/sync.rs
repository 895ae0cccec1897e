/* src/server/core/rust/src/editor/sync.rs */

use futures_util::future::join_all;
use mosaic_engine::{
  ContentRow, PAGE_SEGMENTS_KEY, SegmentRecord, SyncAction, TAB_ORDER_KEY, ensure_tab_order,
  plan_language,
};

use super::SegmentEditor;
use crate::errors::MosaicError;
use crate::store::WriteGuard;

/// Author recorded on rows written by language sync.
pub(crate) const SYNC_AUTHOR: &str = "mosaic-sync";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSyncOutcome {
  pub action: SyncAction,
  /// False when the target's `page_segments` already matched the plan.
  pub segments_written: bool,
  pub tab_order_written: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageSyncResult {
  pub language: String,
  pub outcome: Result<LanguageSyncOutcome, MosaicError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
  pub page_slug: String,
  pub segment_id: String,
  pub results: Vec<LanguageSyncResult>,
}

impl SyncReport {
  pub fn result(&self, language: &str) -> Option<&LanguageSyncResult> {
    self.results.iter().find(|r| r.language == language)
  }

  pub fn failures(&self) -> impl Iterator<Item = &LanguageSyncResult> {
    self.results.iter().filter(|r| r.outcome.is_err())
  }

  pub fn is_complete(&self) -> bool {
    self.results.iter().all(|r| r.outcome.is_ok())
  }
}

impl SegmentEditor {
  /// Propagate an edit of `segment_id` in the reference language to every
  /// other configured language. Languages run concurrently and independently:
  /// one failing is recorded in the report and never stops the rest.
  pub async fn sync_to_other_languages(
    &self,
    page_slug: &str,
    reference_language: &str,
    updated_segments: &[SegmentRecord],
    segment_id: &str,
  ) -> Result<SyncReport, MosaicError> {
    if !self.i18n.is_reference(reference_language) {
      return Err(MosaicError::validation(format!(
        "sync must start from the reference language {}, not {reference_language}",
        self.i18n.reference
      )));
    }
    if !updated_segments.iter().any(|s| s.id == segment_id) {
      return Err(MosaicError::not_found(format!(
        "segment \"{segment_id}\" is not in the updated segments"
      )));
    }
    let (_, reference_tab) = self.load_tab_order(page_slug, reference_language).await?;
    let reference_tab = reference_tab.unwrap_or_default();
    let aliases = self.aliases(page_slug, segment_id).await?;

    let tasks = self.i18n.targets().map(|language| {
      let reference_tab = &reference_tab;
      let aliases = &aliases;
      async move {
        let outcome = self
          .sync_language(page_slug, language, updated_segments, segment_id, reference_tab, aliases)
          .await;
        match &outcome {
          Ok(o) => tracing::info!(
            page = page_slug,
            language,
            segment = segment_id,
            action = ?o.action,
            written = o.segments_written,
            "language synced"
          ),
          Err(e) => tracing::warn!(
            page = page_slug,
            language,
            segment = segment_id,
            error = %e,
            "language sync failed"
          ),
        }
        LanguageSyncResult { language: language.to_string(), outcome }
      }
    });
    let results = join_all(tasks).await;

    Ok(SyncReport {
      page_slug: page_slug.to_string(),
      segment_id: segment_id.to_string(),
      results,
    })
  }

  /// Plans against the language's effective segments (sibling rows applied),
  /// so text kept in a sibling row counts as translated and the sibling row
  /// is rewritten along with the array.
  async fn sync_language(
    &self,
    page_slug: &str,
    language: &str,
    reference: &[SegmentRecord],
    segment_id: &str,
    reference_tab: &[String],
    aliases: &[String],
  ) -> Result<LanguageSyncOutcome, MosaicError> {
    let (row, current) = self.load_effective_segments(page_slug, language).await?;
    let target = row.as_ref().map(|_| current.as_slice());
    let plan = plan_language(reference, segment_id, target, &self.i18n.pending_marker)
      .map_err(MosaicError::validation)?;

    if plan.changed {
      let value = serde_json::to_value(&plan.segments)?;
      let next =
        ContentRow::json(page_slug, language, PAGE_SEGMENTS_KEY, &value).with_author(SYNC_AUTHOR);
      self.write(next, row.as_ref(), WriteGuard::expect(row.as_ref())).await?;
      if let Some(seg) = plan.segments.iter().find(|s| s.id == segment_id) {
        self.rewrite_sibling_row(page_slug, language, seg, SYNC_AUTHOR).await?;
      }
    }

    let (tab_row, tab) = self.load_tab_order(page_slug, language).await?;
    let tab_order =
      ensure_tab_order(tab.as_deref(), reference_tab, reference, segment_id, aliases);
    let tab_order_written = tab_order.is_some();
    if let Some(ids) = tab_order {
      let value = serde_json::to_value(&ids)?;
      let next =
        ContentRow::json(page_slug, language, TAB_ORDER_KEY, &value).with_author(SYNC_AUTHOR);
      self.write(next, tab_row.as_ref(), WriteGuard::expect(tab_row.as_ref())).await?;
    }

    Ok(LanguageSyncOutcome {
      action: plan.action,
      segments_written: plan.changed,
      tab_order_written,
    })
  }
}
