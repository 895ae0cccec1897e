/* src/server/engine/wasm/src/lib.rs */

use std::collections::{BTreeMap, HashSet};

use mosaic_engine::{ContentRow, LanguagePlan, RegistryEntry, ResolvedPage, SegmentRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use wasm_bindgen::prelude::*;

fn error_json(msg: impl std::fmt::Display) -> String {
  json!({ "error": msg.to_string() }).to_string()
}

fn parse<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T, String> {
  serde_json::from_str(raw).map_err(|e| format!("invalid {what}: {e}"))
}

fn to_json<T: Serialize>(value: &T) -> String {
  serde_json::to_string(value).unwrap_or_else(error_json)
}

fn respond<T: Serialize>(result: Result<T, String>) -> String {
  match result {
    Ok(value) => to_json(&value),
    Err(e) => error_json(e),
  }
}

/// `null` or an empty string mean "no row".
fn parse_optional<T: DeserializeOwned>(what: &str, raw: &str) -> Result<Option<T>, String> {
  if raw.trim().is_empty() { Ok(None) } else { parse(what, raw) }
}

// --- Read path ---

fn try_resolve(
  page_slug: &str,
  language: &str,
  rows_json: &str,
  registry_json: &str,
) -> Result<ResolvedPage, String> {
  let rows: Vec<ContentRow> = parse("rows", rows_json)?;
  let registry: Vec<RegistryEntry> = parse("registry", registry_json)?;
  Ok(mosaic_engine::resolve(page_slug, language, &rows, &registry))
}

#[wasm_bindgen]
pub fn resolve_page(
  page_slug: &str,
  language: &str,
  rows_json: &str,
  registry_json: &str,
) -> String {
  respond(try_resolve(page_slug, language, rows_json, registry_json))
}

#[wasm_bindgen]
pub fn render_plan(resolved_page_json: &str) -> String {
  respond(
    parse::<ResolvedPage>("resolved page", resolved_page_json)
      .map(|page| mosaic_engine::render_plan(&page)),
  )
}

fn try_reconstruct(
  registry_json: &str,
  flat_fields_json: &str,
  existing_ids_json: &str,
) -> Result<Vec<SegmentRecord>, String> {
  let registry: Vec<RegistryEntry> = parse("registry", registry_json)?;
  let flat: BTreeMap<String, String> = parse("flat fields", flat_fields_json)?;
  let existing: HashSet<String> =
    parse_optional("existing ids", existing_ids_json)?.unwrap_or_default();
  Ok(mosaic_engine::reconstruct(&registry, &flat, &existing))
}

#[wasm_bindgen]
pub fn reconstruct_legacy(
  registry_json: &str,
  flat_fields_json: &str,
  existing_ids_json: &str,
) -> String {
  respond(try_reconstruct(registry_json, flat_fields_json, existing_ids_json))
}

// --- Translation splicing ---

#[wasm_bindgen]
pub fn flatten_translatable(segment_json: &str) -> String {
  respond(parse::<SegmentRecord>("segment", segment_json).map(|s| mosaic_engine::flatten(&s)))
}

fn try_unflatten(segment_json: &str, translated_json: &str) -> Result<SegmentRecord, String> {
  let segment: SegmentRecord = parse("segment", segment_json)?;
  let translated: BTreeMap<String, String> = parse("translated texts", translated_json)?;
  Ok(mosaic_engine::unflatten(&segment, &translated))
}

#[wasm_bindgen]
pub fn unflatten_translated(segment_json: &str, translated_json: &str) -> String {
  respond(try_unflatten(segment_json, translated_json))
}

// --- Language sync ---

fn try_plan(
  reference_json: &str,
  segment_id: &str,
  target_json: &str,
  marker: &str,
) -> Result<LanguagePlan, String> {
  let reference: Vec<SegmentRecord> = parse("reference segments", reference_json)?;
  let target: Option<Vec<SegmentRecord>> = parse_optional("target segments", target_json)?;
  mosaic_engine::plan_language(&reference, segment_id, target.as_deref(), marker)
}

/// An empty `marker` selects the default placeholder.
#[wasm_bindgen]
pub fn plan_language_sync(
  reference_json: &str,
  segment_id: &str,
  target_json: &str,
  marker: &str,
) -> String {
  let marker = if marker.is_empty() { mosaic_engine::DEFAULT_PENDING_MARKER } else { marker };
  respond(try_plan(reference_json, segment_id, target_json, marker))
}

fn try_ensure_tab_order(
  target_json: &str,
  reference_tab_json: &str,
  reference_json: &str,
  segment_id: &str,
  registry_json: &str,
) -> Result<Option<Vec<String>>, String> {
  let target: Option<Vec<String>> = parse_optional("target tab order", target_json)?;
  let reference_tab: Vec<String> =
    parse_optional("reference tab order", reference_tab_json)?.unwrap_or_default();
  let reference: Vec<SegmentRecord> =
    parse_optional("reference segments", reference_json)?.unwrap_or_default();
  let registry: Vec<RegistryEntry> =
    parse_optional("registry", registry_json)?.unwrap_or_default();
  let aliases = mosaic_engine::segment_aliases(&registry, segment_id);
  Ok(mosaic_engine::ensure_tab_order(
    target.as_deref(),
    &reference_tab,
    &reference,
    segment_id,
    &aliases,
  ))
}

/// Returns `null` when the target already lists the segment, by id or by the
/// registry key/numeric id it is known under. `registry_json` may be empty.
#[wasm_bindgen]
pub fn ensure_tab_order(
  target_json: &str,
  reference_tab_json: &str,
  reference_json: &str,
  segment_id: &str,
  registry_json: &str,
) -> String {
  respond(try_ensure_tab_order(
    target_json,
    reference_tab_json,
    reference_json,
    segment_id,
    registry_json,
  ))
}
