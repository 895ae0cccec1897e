/* src/server/core/rust/src/editor/translate.rs */

use mosaic_engine::{ContentRow, PAGE_SEGMENTS_KEY, SegmentRecord, flatten, unflatten};

use super::SegmentEditor;
use crate::errors::MosaicError;
use crate::store::WriteGuard;
use crate::translator::TranslationRequest;

impl SegmentEditor {
  /// Translate every non-blank text slot of `segment` in one batch. Slots the
  /// provider leaves out keep their source text. Any provider error fails the
  /// whole call.
  pub async fn translate(
    &self,
    segment: &SegmentRecord,
    target_language: &str,
  ) -> Result<SegmentRecord, MosaicError> {
    let translator = self
      .translator
      .as_ref()
      .ok_or_else(|| MosaicError::internal("no translator configured"))?;

    let texts = flatten(segment);
    if texts.is_empty() {
      return Ok(segment.clone());
    }
    let sent = texts.len();
    let request = TranslationRequest { texts, target_language: target_language.to_string() };
    let response = translator.translate(request).await.map_err(|e| {
      tracing::warn!(
        segment = %segment.id,
        language = target_language,
        error = %e,
        "translation failed"
      );
      if e.code() == "TRANSLATION_FAILED" {
        e
      } else {
        MosaicError::translation_failed(e.message())
      }
    })?;

    tracing::debug!(
      segment = %segment.id,
      language = target_language,
      sent,
      received = response.translated_texts.len(),
      "segment translated"
    );
    Ok(unflatten(segment, &response.translated_texts))
  }

  /// Translate the reference language's copy of `segment_id` and store it in
  /// `target_language`, replacing that language's copy or appending one.
  /// Both copies are read with sibling rows applied; a sibling row in the
  /// target language is rewritten too so it cannot shadow the translation.
  /// Nothing is written when translation fails.
  pub async fn translate_and_save(
    &self,
    page_slug: &str,
    segment_id: &str,
    target_language: &str,
    user: &str,
  ) -> Result<SegmentRecord, MosaicError> {
    let reference_language = self.i18n.reference.as_str();
    if target_language == reference_language {
      return Err(MosaicError::validation(format!(
        "{target_language} is the reference language and is not a translation target"
      )));
    }
    if !self.i18n.languages.iter().any(|l| l == target_language) {
      return Err(MosaicError::validation(format!(
        "{target_language} is not a configured language"
      )));
    }

    let (_, reference) = self.load_effective_segments(page_slug, reference_language).await?;
    let source = reference.iter().find(|s| s.id == segment_id).ok_or_else(|| {
      MosaicError::not_found(format!(
        "segment \"{segment_id}\" not found on {page_slug}/{reference_language}"
      ))
    })?;
    let translated = self.translate(source, target_language).await?;

    let (row, mut segments) = self.load_effective_segments(page_slug, target_language).await?;
    match segments.iter_mut().find(|s| s.id == segment_id) {
      Some(slot) => slot.clone_from(&translated),
      None => segments.push(translated.clone()),
    }
    let value = serde_json::to_value(&segments)?;
    let next =
      ContentRow::json(page_slug, target_language, PAGE_SEGMENTS_KEY, &value).with_author(user);
    self.write(next, row.as_ref(), WriteGuard::expect(row.as_ref())).await?;
    self.rewrite_sibling_row(page_slug, target_language, &translated, user).await?;

    tracing::info!(
      page = page_slug,
      language = target_language,
      segment = segment_id,
      "translation saved"
    );
    Ok(translated)
  }
}
