/* src/server/engine/rust/src/sync.rs */

//! Language sync planning. Given the reference language's segments after an
//! edit, work out what each other language's `page_segments` and `tab_order`
//! should become. Pure: callers load the rows and write the results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::row::RegistryEntry;
use crate::schema::schema_for;
use crate::segment::SegmentRecord;

/// Placeholder written into text fields that still await translation.
pub const DEFAULT_PENDING_MARKER: &str = "[translation pending]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
  /// The language had no `page_segments` row; one was created.
  CreatedRow,
  /// The row existed without the segment; a placeholder copy was appended.
  Appended,
  /// The segment carries translator work: text kept, structure mirrored.
  Mirrored,
  /// The segment held only empty or placeholder text and was replaced.
  Refreshed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagePlan {
  pub action: SyncAction,
  pub segments: Vec<SegmentRecord>,
  /// False when the planned array equals what is already stored.
  pub changed: bool,
}

/// Copy of `segment` with every non-blank text slot replaced by `marker`.
pub fn marker_copy(segment: &SegmentRecord, marker: &str) -> SegmentRecord {
  let mut out = segment.clone();
  schema_for(&segment.kind).map_text(&mut out.data, |_, _, _, value| {
    if value.trim().is_empty() { value.to_string() } else { marker.to_string() }
  });
  out
}

/// True when any text slot holds something other than blank or `marker`.
pub fn has_translated_text(segment: &SegmentRecord, marker: &str) -> bool {
  let mut found = false;
  schema_for(&segment.kind).for_each_text(&segment.data, |_, _, _, value| {
    let v = value.trim();
    if !v.is_empty() && v != marker {
      found = true;
    }
  });
  found
}

/// Reference structure with the target's text. Every non-text field comes from
/// `reference`; each text slot keeps the target's value when the target has
/// one at the same position (list items match by index), otherwise it gets
/// the marker (or stays blank when the reference is blank).
pub fn mirror_structure(
  reference: &SegmentRecord,
  target: &SegmentRecord,
  marker: &str,
) -> SegmentRecord {
  let mut out = reference.clone();
  schema_for(&reference.kind).map_text(&mut out.data, |list, index, field, value| {
    let slot = match list {
      None => target.data.get(field),
      Some(l) => {
        target.data.get(l.field).and_then(|items| items.get(index)).and_then(|i| i.get(field))
      }
    };
    match slot.and_then(Value::as_str) {
      Some(existing) => existing.to_string(),
      None if value.trim().is_empty() => value.to_string(),
      None => marker.to_string(),
    }
  });
  out
}

/// Plan one target language. `target` is `None` when that language has no
/// `page_segments` row. Errors only when `segment_id` is not among the
/// reference segments.
pub fn plan_language(
  reference: &[SegmentRecord],
  segment_id: &str,
  target: Option<&[SegmentRecord]>,
  marker: &str,
) -> Result<LanguagePlan, String> {
  let edited = reference
    .iter()
    .find(|s| s.id == segment_id)
    .ok_or_else(|| format!("segment '{segment_id}' is not in the reference language"))?;

  let Some(current) = target else {
    let segments = reference
      .iter()
      .map(|s| if s.id == segment_id { marker_copy(s, marker) } else { s.clone() })
      .collect();
    return Ok(LanguagePlan { action: SyncAction::CreatedRow, segments, changed: true });
  };

  let mut segments = current.to_vec();
  let Some(pos) = segments.iter().position(|s| s.id == segment_id) else {
    segments.push(marker_copy(edited, marker));
    return Ok(LanguagePlan { action: SyncAction::Appended, segments, changed: true });
  };

  let existing = &segments[pos];
  let (action, next) = if has_translated_text(existing, marker) {
    (SyncAction::Mirrored, mirror_structure(edited, existing, marker))
  } else {
    (SyncAction::Refreshed, marker_copy(edited, marker))
  };
  let changed = next != *existing;
  segments[pos] = next;
  Ok(LanguagePlan { action, segments, changed })
}

/// Other ids the registry knows `segment_id` by: the numeric id of a key and
/// the key of a numeric id. Deleted entries are skipped.
pub fn segment_aliases(registry: &[RegistryEntry], segment_id: &str) -> Vec<String> {
  let mut aliases = Vec::new();
  for entry in registry.iter().filter(|e| !e.deleted && e.matches_id(segment_id)) {
    for id in [entry.segment_key.clone(), entry.segment_id.to_string()] {
      if id != segment_id && !aliases.contains(&id) {
        aliases.push(id);
      }
    }
  }
  aliases
}

/// Make sure `segment_id` appears in a language's tab order. Returns the new
/// order when something must be written, `None` when `target` already lists
/// the segment, either by `segment_id` or by one of its `aliases`.
///
/// A missing tab order is cloned from the reference; when the reference has
/// none either, the reference segment order is used so that adding the row
/// does not hide the other segments.
pub fn ensure_tab_order(
  target: Option<&[String]>,
  reference_tab: &[String],
  reference_segments: &[SegmentRecord],
  segment_id: &str,
  aliases: &[String],
) -> Option<Vec<String>> {
  let names_segment = |id: &String| id == segment_id || aliases.contains(id);

  let Some(current) = target else {
    let mut order: Vec<String> = if reference_tab.is_empty() {
      reference_segments.iter().map(|s| s.id.clone()).collect()
    } else {
      reference_tab.to_vec()
    };
    if !order.iter().any(names_segment) {
      order.push(segment_id.to_string());
    }
    return Some(order);
  };

  if current.iter().any(names_segment) {
    return None;
  }
  let mut order = current.to_vec();
  let predecessor = reference_tab
    .iter()
    .position(names_segment)
    .and_then(|idx| reference_tab[..idx].iter().rev().find(|id| current.contains(id)));
  match predecessor.and_then(|p| order.iter().position(|id| id == p)) {
    Some(at) => order.insert(at + 1, segment_id.to_string()),
    None if reference_tab.first().is_some_and(names_segment) => {
      order.insert(0, segment_id.to_string());
    }
    None => order.push(segment_id.to_string()),
  }
  Some(order)
}

#[cfg(test)]
mod tests;
