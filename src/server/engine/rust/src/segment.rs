/* src/server/engine/rust/src/segment.rs */

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Segment type tag. Unrecognised tags are preserved verbatim so that a
/// round trip through the engine never rewrites content it does not know.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SegmentKind {
  Hero,
  Tiles,
  Banner,
  Solutions,
  Table,
  Faq,
  Text,
  Cta,
  Image,
  Footer,
  Other(String),
}

impl SegmentKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Hero => "hero",
      Self::Tiles => "tiles",
      Self::Banner => "banner",
      Self::Solutions => "solutions",
      Self::Table => "table",
      Self::Faq => "faq",
      Self::Text => "text",
      Self::Cta => "cta",
      Self::Image => "image",
      Self::Footer => "footer",
      Self::Other(s) => s,
    }
  }

  pub fn is_known(&self) -> bool {
    !matches!(self, Self::Other(_))
  }
}

impl From<&str> for SegmentKind {
  fn from(s: &str) -> Self {
    match s {
      "hero" => Self::Hero,
      "tiles" => Self::Tiles,
      "banner" => Self::Banner,
      "solutions" => Self::Solutions,
      "table" => Self::Table,
      "faq" => Self::Faq,
      "text" => Self::Text,
      "cta" => Self::Cta,
      "image" => Self::Image,
      "footer" => Self::Footer,
      other => Self::Other(other.to_string()),
    }
  }
}

impl From<String> for SegmentKind {
  fn from(s: String) -> Self {
    Self::from(s.as_str())
  }
}

impl From<SegmentKind> for String {
  fn from(kind: SegmentKind) -> Self {
    kind.as_str().to_string()
  }
}

impl fmt::Display for SegmentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One entry of a `page_segments` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: SegmentKind,
  #[serde(default = "empty_object")]
  pub data: Value,
}

fn empty_object() -> Value {
  Value::Object(serde_json::Map::new())
}

impl SegmentRecord {
  pub fn new(id: impl Into<String>, kind: impl Into<SegmentKind>, data: Value) -> Self {
    Self { id: id.into(), kind: kind.into(), data }
  }

  pub fn field(&self, name: &str) -> Option<&Value> {
    self.data.get(name)
  }

  pub fn str_field(&self, name: &str) -> Option<&str> {
    self.data.get(name).and_then(Value::as_str)
  }

  /// True when `data` carries no renderable content: null, an empty object,
  /// or an object whose every value is empty.
  pub fn is_empty(&self) -> bool {
    is_empty_value(&self.data)
  }
}

/// Emptiness as the editors understand it: blank strings, empty arrays and
/// objects, and null are empty. Numbers and booleans never are.
pub fn is_empty_value(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    Value::Array(items) => items.is_empty(),
    Value::Object(obj) => obj.values().all(is_empty_value),
    Value::Bool(_) | Value::Number(_) => false,
  }
}

/// Returns the id of the first duplicated segment, if any.
pub fn find_duplicate_id(segments: &[SegmentRecord]) -> Option<&str> {
  let mut seen = std::collections::HashSet::new();
  segments.iter().map(|s| s.id.as_str()).find(|id| !seen.insert(*id))
}

/// Parse a `page_segments` payload. Entries that are not segment-shaped are
/// skipped individually; only a payload that is not a JSON array fails.
pub fn parse_segments(raw: &str) -> Result<Vec<SegmentRecord>, String> {
  let value: Value = serde_json::from_str(raw).map_err(|e| format!("parse page_segments: {e}"))?;
  let Value::Array(items) = value else {
    return Err("parse page_segments: expected a JSON array".to_string());
  };
  let mut segments = Vec::with_capacity(items.len());
  for item in items {
    match serde_json::from_value::<SegmentRecord>(item) {
      Ok(seg) => segments.push(seg),
      Err(e) => tracing::warn!(error = %e, "skipping malformed segment entry"),
    }
  }
  Ok(segments)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn kind_round_trips_known_and_unknown() {
    let seg: SegmentRecord =
      serde_json::from_value(json!({"id": "1", "type": "banner", "data": {}})).unwrap();
    assert_eq!(seg.kind, SegmentKind::Banner);

    let seg: SegmentRecord =
      serde_json::from_value(json!({"id": "2", "type": "timeline", "data": {}})).unwrap();
    assert_eq!(seg.kind, SegmentKind::Other("timeline".into()));
    assert_eq!(serde_json::to_value(&seg).unwrap()["type"], "timeline");
  }

  #[test]
  fn missing_data_defaults_to_object() {
    let seg: SegmentRecord = serde_json::from_value(json!({"id": "1", "type": "hero"})).unwrap();
    assert_eq!(seg.data, json!({}));
    assert!(seg.is_empty());
  }

  #[test]
  fn emptiness_rules() {
    assert!(is_empty_value(&json!({"title": "", "items": []})));
    assert!(is_empty_value(&json!({"title": "   "})));
    assert!(!is_empty_value(&json!({"columns": 3})));
    assert!(!is_empty_value(&json!({"title": "Hi"})));
  }

  #[test]
  fn duplicate_ids_detected() {
    let segs = vec![
      SegmentRecord::new("a", "hero", json!({})),
      SegmentRecord::new("b", "text", json!({})),
      SegmentRecord::new("a", "tiles", json!({})),
    ];
    assert_eq!(find_duplicate_id(&segs), Some("a"));
    assert_eq!(find_duplicate_id(&segs[..2]), None);
  }

  #[test]
  fn parse_segments_skips_bad_entries() {
    let raw = r#"[{"id":"1","type":"hero","data":{}}, {"nope": true}, {"id":"2","type":"faq"}]"#;
    let segs = parse_segments(raw).unwrap();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[1].id, "2");
  }

  #[test]
  fn parse_segments_rejects_non_array() {
    assert!(parse_segments(r#"{"id":"1"}"#).is_err());
    assert!(parse_segments("not json").is_err());
  }
}
