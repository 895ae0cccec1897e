/* src/server/engine/rust/src/translate.rs */

//! Translation splicing: flatten a segment's translatable strings into one
//! batch and splice a (possibly partial) response back into the same shape.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::schema::{ItemList, SegmentSchema, schema_for};
use crate::segment::SegmentRecord;

static LIST_KEY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([A-Za-z][A-Za-z0-9]*)_(\d+)_([A-Za-z][A-Za-z0-9]*)$").expect("static regex")
});

/// A parsed flat key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatKey {
  Field(String),
  /// `list` is `"item"` for the primary list, otherwise the list field name.
  Item { list: String, index: usize, field: String },
}

/// Parse a flat key produced by [`flatten`].
pub fn parse_flat_key(key: &str) -> FlatKey {
  if let Some(caps) = LIST_KEY.captures(key) {
    if let Ok(index) = caps[2].parse::<usize>() {
      return FlatKey::Item { list: caps[1].to_string(), index, field: caps[3].to_string() };
    }
  }
  FlatKey::Field(key.to_string())
}

/// The item list whose entries are keyed `item_<index>_<field>`: the first
/// declared list present in `data`.
fn primary_list<'s>(schema: &'s SegmentSchema, data: &Value) -> Option<&'s str> {
  schema.item_lists.iter().find(|l| data.get(l.field).is_some_and(Value::is_array)).map(|l| l.field)
}

fn slot_key(list: Option<&ItemList>, primary: Option<&str>, index: usize, field: &str) -> String {
  match list {
    None => field.to_string(),
    Some(l) if Some(l.field) == primary => format!("item_{index}_{field}"),
    Some(l) => format!("{}_{index}_{field}", l.field),
  }
}

/// Collect every non-blank translatable string of `segment`. Non-text fields
/// are never included.
pub fn flatten(segment: &SegmentRecord) -> BTreeMap<String, String> {
  let schema = schema_for(&segment.kind);
  let primary = primary_list(schema, &segment.data);
  let mut texts = BTreeMap::new();
  schema.for_each_text(&segment.data, |list, index, field, value| {
    if !value.trim().is_empty() {
      texts.insert(slot_key(list, primary, index, field), value.to_string());
    }
  });
  texts
}

/// Splice `translated` back into a copy of `source`. Slots missing from the
/// response keep their source value; keys that name no slot are ignored.
pub fn unflatten(source: &SegmentRecord, translated: &BTreeMap<String, String>) -> SegmentRecord {
  let schema = schema_for(&source.kind);
  let primary = primary_list(schema, &source.data);
  let mut out = source.clone();
  let mut used = 0usize;
  schema.map_text(&mut out.data, |list, index, field, value| {
    match translated.get(&slot_key(list, primary, index, field)) {
      Some(t) => {
        used += 1;
        t.clone()
      }
      None => value.to_string(),
    }
  });
  if used < translated.len() {
    let known = slot_keys(schema, primary, &source.data);
    let stray: Vec<FlatKey> = translated
      .keys()
      .filter(|k| !known.contains(k.as_str()))
      .map(|k| parse_flat_key(k))
      .collect();
    tracing::debug!(segment = %source.id, ?stray, "translation returned keys with no slot");
  }
  out
}

fn slot_keys(schema: &SegmentSchema, primary: Option<&str>, data: &Value) -> HashSet<String> {
  let mut keys = HashSet::new();
  schema.for_each_text(data, |list, index, field, _| {
    keys.insert(slot_key(list, primary, index, field));
  });
  keys
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn flatten_nested_items() {
    let seg = SegmentRecord::new(
      "t",
      "tiles",
      json!({
        "title": "Our work",
        "subtitle": "",
        "columns": 3,
        "items": [
          {"title": "Fast", "description": "Very", "icon": "bolt"},
          {"title": "Safe", "link": "/safe"}
        ]
      }),
    );
    let flat = flatten(&seg);
    let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["item_0_description", "item_0_title", "item_1_title", "title"]);
    assert_eq!(flat["item_1_title"], "Safe");
  }

  #[test]
  fn missing_keys_fall_back_to_source() {
    let seg = SegmentRecord::new("h", "hero", json!({"title": "Hello", "subtitle": ""}));
    let flat = flatten(&seg);
    assert_eq!(flat.len(), 1);

    let response: BTreeMap<String, String> = [("title".to_string(), "Hallo".to_string())].into();
    let out = unflatten(&seg, &response);
    assert_eq!(out.data, json!({"title": "Hallo", "subtitle": ""}));
  }

  #[test]
  fn identity_round_trip_preserves_structure() {
    let seg = SegmentRecord::new(
      "s",
      "solutions",
      json!({
        "title": "Solutions",
        "layout": "grid",
        "items": [{"title": "A", "description": "a", "image": "a.png"}],
        "solutionsItems": [{"title": "Old", "description": "o"}]
      }),
    );
    let flat = flatten(&seg);
    assert!(flat.contains_key("item_0_title"));
    assert!(flat.contains_key("solutionsItems_0_title"));
    assert_eq!(unflatten(&seg, &flat), seg);
  }

  #[test]
  fn non_text_fields_never_flattened() {
    let seg = SegmentRecord::new(
      "b",
      "banner",
      json!({"title": "Hi", "buttonLink": "/a", "bannerImages": [{"url": "x.png", "alt": "X"}]}),
    );
    let flat = flatten(&seg);
    assert!(flat.values().all(|v| v != "/a" && v != "x.png"));
    assert_eq!(flat["item_0_alt"], "X");
  }

  #[test]
  fn stray_keys_ignored() {
    let seg = SegmentRecord::new("x", "text", json!({"title": "T"}));
    let response: BTreeMap<String, String> =
      [("title".to_string(), "Titel".to_string()), ("bogus".to_string(), "?".to_string())].into();
    let out = unflatten(&seg, &response);
    assert_eq!(out.data, json!({"title": "Titel"}));
  }

  #[test]
  fn flat_key_parsing() {
    assert_eq!(
      parse_flat_key("item_3_title"),
      FlatKey::Item { list: "item".into(), index: 3, field: "title".into() }
    );
    assert_eq!(
      parse_flat_key("bannerImages_0_alt"),
      FlatKey::Item { list: "bannerImages".into(), index: 0, field: "alt".into() }
    );
    assert_eq!(parse_flat_key("ctaText"), FlatKey::Field("ctaText".into()));
  }
}
