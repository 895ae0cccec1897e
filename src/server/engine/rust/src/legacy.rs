/* src/server/engine/rust/src/legacy.rs */

//! Reconstruct segments that predate the `page_segments` array from the flat
//! keyed fields they were saved as. Each supported type declares a mapping
//! from flat field names to its structured data shape.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::row::RegistryEntry;
use crate::segment::{SegmentKind, SegmentRecord};

#[derive(Debug, Clone, Copy)]
enum Source {
  /// Copied verbatim when non-blank.
  Text,
  /// JSON array; unparseable or absent yields an empty list.
  JsonList,
  /// Integer with a fallback used when the field is absent or unparseable.
  Number(i64),
}

#[derive(Debug, Clone, Copy)]
struct FieldMap {
  target: &'static str,
  source: &'static str,
  kind: Source,
}

const fn text(target: &'static str, source: &'static str) -> FieldMap {
  FieldMap { target, source, kind: Source::Text }
}

const fn list(target: &'static str, source: &'static str) -> FieldMap {
  FieldMap { target, source, kind: Source::JsonList }
}

const fn number(target: &'static str, source: &'static str, default: i64) -> FieldMap {
  FieldMap { target, source, kind: Source::Number(default) }
}

const HERO_FIELDS: &[FieldMap] = &[
  text("title", "hero_title"),
  text("subtitle", "hero_subtitle"),
  text("description", "hero_description"),
  text("imageUrl", "hero_image_url"),
  text("imagePosition", "hero_image_position"),
  text("layoutRatio", "hero_layout_ratio"),
  text("topSpacing", "hero_top_spacing"),
  text("ctaText", "hero_cta_text"),
  text("ctaLink", "hero_cta_link"),
  text("ctaStyle", "hero_cta_style"),
];

const TILES_FIELDS: &[FieldMap] = &[
  text("title", "tiles_title"),
  text("subtitle", "tiles_subtitle"),
  list("items", "tiles_items"),
  number("columns", "tiles_columns", 3),
];

const BANNER_FIELDS: &[FieldMap] = &[
  text("sectionTitle", "banner_section_title"),
  text("sectionDescription", "banner_section_description"),
  list("bannerImages", "banner_images"),
  text("bannerButtonText", "banner_button_text"),
  text("bannerButtonLink", "banner_button_link"),
  text("bannerButtonStyle", "banner_button_style"),
];

const SOLUTIONS_FIELDS: &[FieldMap] = &[
  text("title", "solutions_title"),
  text("description", "solutions_description"),
  text("layout", "solutions_layout"),
  list("solutionsItems", "solutions_items"),
];

fn mapping_for(kind: &SegmentKind) -> Option<&'static [FieldMap]> {
  match kind {
    SegmentKind::Hero => Some(HERO_FIELDS),
    SegmentKind::Tiles => Some(TILES_FIELDS),
    SegmentKind::Banner => Some(BANNER_FIELDS),
    SegmentKind::Solutions => Some(SOLUTIONS_FIELDS),
    _ => None,
  }
}

/// Flat field names consumed by the legacy mapping of `kind`.
pub fn legacy_source_fields(kind: &SegmentKind) -> Vec<&'static str> {
  mapping_for(kind).map(|m| m.iter().map(|f| f.source).collect()).unwrap_or_default()
}

/// Whether `key` is read by any legacy mapping.
pub fn is_source_field(key: &str) -> bool {
  [HERO_FIELDS, TILES_FIELDS, BANNER_FIELDS, SOLUTIONS_FIELDS]
    .iter()
    .any(|fields| fields.iter().any(|f| f.source == key))
}

/// Build segments for registry entries not yet present in `page_segments`.
///
/// Deleted entries, footer entries, types without a mapping, and entries whose
/// mapped fields are all empty produce nothing. Output follows registry
/// position order and uses the registry key as segment id. The inputs are
/// never modified.
pub fn reconstruct(
  registry: &[RegistryEntry],
  flat_fields: &BTreeMap<String, String>,
  existing_ids: &HashSet<String>,
) -> Vec<SegmentRecord> {
  let mut entries: Vec<&RegistryEntry> = registry
    .iter()
    .filter(|e| !e.deleted && !existing_ids.contains(&e.segment_key))
    .collect();
  entries.sort_by_key(|e| e.position);

  let mut emitted: HashSet<&str> = HashSet::new();
  let mut out = Vec::new();
  for entry in entries {
    let kind = SegmentKind::from(entry.segment_type.as_str());
    if kind == SegmentKind::Footer {
      continue;
    }
    let Some(mapping) = mapping_for(&kind) else {
      tracing::debug!(segment = %entry.segment_key, kind = %kind, "no legacy mapping");
      continue;
    };
    // Duplicate keys can only come from a registry that broke its own
    // uniqueness rule; first one wins.
    if !emitted.insert(entry.segment_key.as_str()) {
      continue;
    }
    if let Some(data) = map_fields(mapping, flat_fields) {
      out.push(SegmentRecord { id: entry.segment_key.clone(), kind, data });
    }
  }
  out
}

fn map_fields(mapping: &[FieldMap], flat: &BTreeMap<String, String>) -> Option<Value> {
  let mut data = Map::new();
  let mut any_content = false;
  for field in mapping {
    let raw = flat.get(field.source).map(|s| s.trim()).filter(|s| !s.is_empty());
    let value = match field.kind {
      Source::Text => match raw {
        Some(s) => {
          any_content = true;
          Value::String(s.to_string())
        }
        None => Value::String(String::new()),
      },
      Source::JsonList => {
        let items = raw.map(parse_list).unwrap_or_default();
        if !items.is_empty() {
          any_content = true;
        }
        Value::Array(items)
      }
      Source::Number(default) => match raw.and_then(|s| s.parse::<i64>().ok()) {
        Some(n) => {
          any_content = true;
          Value::from(n)
        }
        None => Value::from(default),
      },
    };
    data.insert(field.target.to_string(), value);
  }
  any_content.then_some(Value::Object(data))
}

fn parse_list(raw: &str) -> Vec<Value> {
  match serde_json::from_str::<Value>(raw) {
    Ok(Value::Array(items)) => items,
    Ok(_) => Vec::new(),
    Err(e) => {
      tracing::warn!(error = %e, "legacy list field is not valid JSON");
      Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn flat(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  fn registry() -> Vec<RegistryEntry> {
    vec![
      RegistryEntry::new("home", "hero_legacy", 1, "hero").at(0),
      RegistryEntry::new("home", "tiles_legacy", 2, "tiles").at(1),
      RegistryEntry::new("home", "site_footer", 3, "footer").at(2),
    ]
  }

  #[test]
  fn hero_from_flat_fields() {
    let fields = flat(&[("hero_title", "Welcome"), ("hero_cta_link", "/start")]);
    let segs = reconstruct(&registry(), &fields, &HashSet::new());
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].id, "hero_legacy");
    assert_eq!(segs[0].kind, SegmentKind::Hero);
    assert_eq!(segs[0].data["title"], "Welcome");
    assert_eq!(segs[0].data["ctaLink"], "/start");
    assert_eq!(segs[0].data["subtitle"], "");
  }

  #[test]
  fn empty_fields_emit_nothing() {
    let fields = flat(&[("hero_title", "  "), ("tiles_items", "[]"), ("tiles_columns", "")]);
    assert!(reconstruct(&registry(), &fields, &HashSet::new()).is_empty());
  }

  #[test]
  fn tiles_list_and_default_columns() {
    let fields = flat(&[("tiles_items", r#"[{"title":"A"}]"#)]);
    let segs = reconstruct(&registry(), &fields, &HashSet::new());
    assert_eq!(segs[0].data, json!({"title": "", "subtitle": "", "items": [{"title": "A"}], "columns": 3}));
  }

  #[test]
  fn malformed_list_defaults_to_empty() {
    let fields = flat(&[("tiles_title", "Tiles"), ("tiles_items", "[{broken")]);
    let segs = reconstruct(&registry(), &fields, &HashSet::new());
    assert_eq!(segs[0].data["items"], json!([]));
    assert_eq!(segs[0].data["title"], "Tiles");
  }

  #[test]
  fn existing_ids_and_footer_skipped() {
    let fields = flat(&[("hero_title", "Welcome"), ("tiles_title", "T")]);
    let existing: HashSet<String> = ["hero_legacy".to_string()].into_iter().collect();
    let segs = reconstruct(&registry(), &fields, &existing);
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].id, "tiles_legacy");
  }

  #[test]
  fn deleted_entries_skipped() {
    let mut reg = registry();
    reg[0].deleted = true;
    let fields = flat(&[("hero_title", "Welcome")]);
    assert!(reconstruct(&reg, &fields, &HashSet::new()).is_empty());
  }

  #[test]
  fn banner_and_solutions_mappings() {
    let reg = vec![
      RegistryEntry::new("home", "banner_a", 4, "banner"),
      RegistryEntry::new("home", "solutions_a", 5, "solutions").at(1),
    ];
    let fields = flat(&[
      ("banner_section_title", "Partners"),
      ("banner_images", r#"[{"url":"a.png"}]"#),
      ("solutions_items", r#"[{"title":"S"}]"#),
    ]);
    let segs = reconstruct(&reg, &fields, &HashSet::new());
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].data["sectionTitle"], "Partners");
    assert_eq!(segs[0].data["bannerImages"], json!([{"url": "a.png"}]));
    assert_eq!(segs[1].data["solutionsItems"], json!([{"title": "S"}]));
  }

  #[test]
  fn reconstruction_is_idempotent() {
    let fields = flat(&[("hero_title", "Welcome"), ("tiles_items", r#"[{"title":"A"}]"#)]);
    let snapshot = fields.clone();
    let first = reconstruct(&registry(), &fields, &HashSet::new());
    let second = reconstruct(&registry(), &fields, &HashSet::new());
    assert_eq!(first, second);
    assert_eq!(fields, snapshot);

    // Feeding the output back as existing ids adds nothing.
    let ids: HashSet<String> = first.iter().map(|s| s.id.clone()).collect();
    assert!(reconstruct(&registry(), &fields, &ids).is_empty());
  }
}
