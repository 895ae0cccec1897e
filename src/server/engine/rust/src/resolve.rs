/* src/server/engine/rust/src/resolve.rs */

//! Segment resolution: content rows for one (page, language) plus the segment
//! registry become an ordered list of typed segments, a validated tab order,
//! SEO data, and the anchor id map renderers use.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::legacy;
use crate::row::{
  ContentRow, PAGE_SEGMENTS_KEY, RegistryEntry, SEO_DATA_KEY, TAB_ORDER_KEY, is_reserved_key,
};
use crate::schema::{StorageShape, schema_for};
use crate::segment::{SegmentRecord, parse_segments};

/// Everything the read path tolerated instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveDiagnostics {
  /// Section keys whose payload could not be parsed and was treated as absent.
  pub malformed_rows: Vec<String>,
  /// Tab-order ids that matched neither a segment nor a registry entry.
  pub dropped_tab_entries: Vec<String>,
  /// Tab-order ids that matched more than one registry entry (numeric id of
  /// one, key of another). Resolved by first match in registry order.
  pub ambiguous_tab_entries: Vec<String>,
  /// Segment ids whose data was taken from a sibling row.
  pub sibling_payloads: Vec<String>,
  /// JSON object rows named like a segment that is no longer in
  /// `page_segments`, typically left behind by a removed segment. They are
  /// kept out of `flat_fields`.
  pub orphan_sibling_rows: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPage {
  pub page_slug: String,
  pub language: String,
  pub segments: Vec<SegmentRecord>,
  pub tab_order: Vec<String>,
  pub seo_data: Map<String, Value>,
  /// Registry key -> numeric anchor id.
  pub anchor_ids: BTreeMap<String, i64>,
  /// Non-reserved rows not consumed as sibling payloads.
  pub flat_fields: BTreeMap<String, String>,
  pub diagnostics: ResolveDiagnostics,
}

/// How a tab-order id was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabMatch {
  Segment,
  /// Index into the registry slice, by numeric id.
  RegistryId(usize),
  /// Index into the registry slice, by key.
  RegistryKey(usize),
}

/// Match one tab-order id. Segments win over the registry; within the registry
/// the first entry (in the given order) that matches by numeric id or key wins.
/// The flag reports whether a second registry entry also matched.
pub fn match_tab_entry(
  id: &str,
  segment_ids: &HashSet<&str>,
  registry: &[&RegistryEntry],
) -> Option<(TabMatch, bool)> {
  let mut hits = registry.iter().enumerate().filter(|(_, e)| e.matches_id(id));
  let first = hits.next().map(|(idx, e)| {
    if e.segment_id.to_string() == id {
      TabMatch::RegistryId(idx)
    } else {
      TabMatch::RegistryKey(idx)
    }
  });
  let ambiguous = hits.next().is_some();
  if segment_ids.contains(id) {
    return Some((TabMatch::Segment, ambiguous));
  }
  first.map(|m| (m, ambiguous))
}

/// Whether `seg` takes its data from a sibling row named after its id.
pub fn uses_sibling_row(seg: &SegmentRecord) -> bool {
  schema_for(&seg.kind).storage == StorageShape::SiblingRow && !is_reserved_key(&seg.id)
}

/// Replace `seg.data` with the payload of its sibling row. A payload that is
/// not a JSON object leaves the segment untouched and returns false.
pub fn apply_sibling_payload(seg: &mut SegmentRecord, row: &ContentRow) -> bool {
  match row.parse_json() {
    Ok(data @ Value::Object(_)) => {
      seg.data = data;
      true
    }
    Ok(_) | Err(_) => false,
  }
}

/// Resolve a page from its rows and registry.
///
/// A malformed payload in any row is logged and the row is treated as absent;
/// resolution itself never fails.
pub fn resolve(
  page_slug: &str,
  language: &str,
  rows: &[ContentRow],
  registry: &[RegistryEntry],
) -> ResolvedPage {
  let mut diagnostics = ResolveDiagnostics::default();

  let rows_by_key: HashMap<&str, &ContentRow> = rows
    .iter()
    .filter(|r| r.page_slug == page_slug && r.language == language)
    .map(|r| (r.section_key.as_str(), r))
    .collect();

  let mut live: Vec<&RegistryEntry> =
    registry.iter().filter(|e| e.page_slug == page_slug && !e.deleted).collect();
  live.sort_by_key(|e| e.position);

  let anchor_ids: BTreeMap<String, i64> =
    live.iter().map(|e| (e.segment_key.clone(), e.segment_id)).collect();

  // page_segments, with sibling-row payloads attached
  let mut segments = match rows_by_key.get(PAGE_SEGMENTS_KEY) {
    Some(row) => match parse_segments(&row.value) {
      Ok(segs) => segs,
      Err(e) => {
        tracing::warn!(page = page_slug, language, error = %e, "page_segments row unreadable");
        diagnostics.malformed_rows.push(PAGE_SEGMENTS_KEY.to_string());
        Vec::new()
      }
    },
    None => Vec::new(),
  };
  let mut seen = HashSet::new();
  segments.retain(|s| {
    let fresh = seen.insert(s.id.clone());
    if !fresh {
      tracing::warn!(page = page_slug, language, segment = %s.id, "duplicate segment id dropped");
    }
    fresh
  });

  let mut consumed: HashSet<&str> = HashSet::new();
  for seg in &mut segments {
    if !uses_sibling_row(seg) {
      continue;
    }
    let Some(row) = rows_by_key.get(seg.id.as_str()) else { continue };
    consumed.insert(row.section_key.as_str());
    if apply_sibling_payload(seg, row) {
      diagnostics.sibling_payloads.push(seg.id.clone());
    } else {
      tracing::warn!(
        page = page_slug,
        language,
        segment = %seg.id,
        "sibling payload is not a JSON object"
      );
      diagnostics.malformed_rows.push(row.section_key.clone());
    }
  }

  // tab_order, filtered to ids that still resolve
  let segment_ids: HashSet<&str> = segments.iter().map(|s| s.id.as_str()).collect();
  let mut tab_order = Vec::new();
  if let Some(row) = rows_by_key.get(TAB_ORDER_KEY) {
    match parse_tab_order(&row.value) {
      Some(ids) => {
        let mut kept = HashSet::new();
        for id in ids {
          match match_tab_entry(&id, &segment_ids, &live) {
            Some((_, ambiguous)) => {
              if ambiguous {
                tracing::warn!(
                  page = page_slug,
                  language,
                  entry = %id,
                  "tab order entry matches several registry entries"
                );
                diagnostics.ambiguous_tab_entries.push(id.clone());
              }
              if kept.insert(id.clone()) {
                tab_order.push(id);
              }
            }
            None => {
              tracing::debug!(
                page = page_slug,
                language,
                entry = %id,
                "dropping dangling tab order entry"
              );
              diagnostics.dropped_tab_entries.push(id);
            }
          }
        }
      }
      None => {
        tracing::warn!(page = page_slug, language, "tab_order row unreadable");
        diagnostics.malformed_rows.push(TAB_ORDER_KEY.to_string());
      }
    }
  }

  let seo_data = match rows_by_key.get(SEO_DATA_KEY).map(|r| r.parse_json()) {
    Some(Ok(Value::Object(obj))) => obj,
    Some(_) => {
      tracing::warn!(page = page_slug, language, "seo_data row unreadable");
      diagnostics.malformed_rows.push(SEO_DATA_KEY.to_string());
      Map::new()
    }
    None => Map::new(),
  };

  let mut flat_fields = BTreeMap::new();
  for (key, row) in &rows_by_key {
    if is_reserved_key(key) || consumed.contains(*key) {
      continue;
    }
    let orphan = !segment_ids.contains(*key)
      && !legacy::is_source_field(key)
      && matches!(row.parse_json(), Ok(Value::Object(_)));
    if orphan {
      tracing::debug!(page = page_slug, language, row = %key, "sibling row without a segment");
      diagnostics.orphan_sibling_rows.push(key.to_string());
      continue;
    }
    flat_fields.insert(key.to_string(), row.value.clone());
  }

  let existing: HashSet<String> = segments.iter().map(|s| s.id.clone()).collect();
  let registry_owned: Vec<RegistryEntry> = live.iter().map(|e| (*e).clone()).collect();
  let legacy_segments = legacy::reconstruct(&registry_owned, &flat_fields, &existing);
  if !legacy_segments.is_empty() {
    tracing::debug!(
      page = page_slug,
      language,
      count = legacy_segments.len(),
      "reconstructed legacy segments"
    );
  }
  segments.extend(legacy_segments);

  diagnostics.malformed_rows.sort();
  diagnostics.orphan_sibling_rows.sort();
  ResolvedPage {
    page_slug: page_slug.to_string(),
    language: language.to_string(),
    segments,
    tab_order,
    seo_data,
    anchor_ids,
    flat_fields,
    diagnostics,
  }
}

/// Parse a tab-order payload. Numeric entries are accepted and stringified.
pub fn parse_tab_order(raw: &str) -> Option<Vec<String>> {
  let Value::Array(items) = serde_json::from_str::<Value>(raw).ok()? else {
    return None;
  };
  Some(
    items
      .into_iter()
      .filter_map(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
      })
      .collect(),
  )
}

impl ResolvedPage {
  /// Numeric anchor id for a segment when the registry knows its key,
  /// otherwise the segment id itself.
  pub fn anchor_id(&self, segment_id: &str) -> String {
    match self.anchor_ids.get(segment_id) {
      Some(n) => n.to_string(),
      None => segment_id.to_string(),
    }
  }

  /// Find the segment a tab-order id refers to: by segment id first, then via
  /// the registry in both directions (key -> numeric id, numeric id -> key).
  pub fn find_segment(&self, tab_id: &str) -> Option<&SegmentRecord> {
    if let Some(seg) = self.segments.iter().find(|s| s.id == tab_id) {
      return Some(seg);
    }
    let numeric = self.anchor_ids.get(tab_id).map(i64::to_string);
    if let Some(seg) = numeric.and_then(|n| self.segments.iter().find(|s| s.id == n)) {
      return Some(seg);
    }
    let key = self.anchor_ids.iter().find(|(_, n)| n.to_string() == tab_id).map(|(k, _)| k)?;
    self.segments.iter().find(|s| &s.id == key)
  }

  /// Segments in render order. Without a tab order every segment renders in
  /// array order; with one, only the segments it names render.
  pub fn ordered_segments(&self) -> Vec<&SegmentRecord> {
    if self.tab_order.is_empty() {
      return self.segments.iter().collect();
    }
    let mut seen = HashSet::new();
    self
      .tab_order
      .iter()
      .filter_map(|id| self.find_segment(id))
      .filter(|seg| seen.insert(seg.id.as_str()))
      .collect()
  }
}
