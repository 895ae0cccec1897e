/* src/server/engine/rust/src/row.rs */

//! Storage-level records: content rows addressed by (page, language, section)
//! and segment registry entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Section key holding the JSON array of segment records.
pub const PAGE_SEGMENTS_KEY: &str = "page_segments";
/// Section key holding the JSON array of segment ids in render order.
pub const TAB_ORDER_KEY: &str = "tab_order";
/// Section key holding the page-level SEO object.
pub const SEO_DATA_KEY: &str = "seo_data";

pub const CONTENT_TYPE_JSON: &str = "json";
pub const CONTENT_TYPE_TEXT: &str = "text";

/// Returns true for the section keys that carry structured JSON rather than a
/// flat legacy field.
pub fn is_reserved_key(section_key: &str) -> bool {
  matches!(section_key, PAGE_SEGMENTS_KEY | TAB_ORDER_KEY | SEO_DATA_KEY)
}

/// Unique address of a content row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
  pub page_slug: String,
  pub language: String,
  pub section_key: String,
}

impl RowKey {
  pub fn new(
    page_slug: impl Into<String>,
    language: impl Into<String>,
    section_key: impl Into<String>,
  ) -> Self {
    Self { page_slug: page_slug.into(), language: language.into(), section_key: section_key.into() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
  pub page_slug: String,
  pub language: String,
  pub section_key: String,
  #[serde(default = "default_content_type")]
  pub content_type: String,
  /// Opaque payload; JSON-encoded for reserved keys and structured fields.
  pub value: String,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_by: Option<String>,
  /// Write counter maintained by the store, starts at 1 on first insert.
  #[serde(default)]
  pub version: u64,
}

fn default_content_type() -> String {
  CONTENT_TYPE_TEXT.to_string()
}

impl ContentRow {
  pub fn new(
    page_slug: impl Into<String>,
    language: impl Into<String>,
    section_key: impl Into<String>,
    content_type: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    Self {
      page_slug: page_slug.into(),
      language: language.into(),
      section_key: section_key.into(),
      content_type: content_type.into(),
      value: value.into(),
      updated_at: None,
      updated_by: None,
      version: 0,
    }
  }

  /// Plain text row, used for legacy flat fields.
  pub fn text(
    page_slug: impl Into<String>,
    language: impl Into<String>,
    section_key: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    Self::new(page_slug, language, section_key, CONTENT_TYPE_TEXT, value)
  }

  /// JSON row; the value is serialized here so callers never hand-encode.
  pub fn json(
    page_slug: impl Into<String>,
    language: impl Into<String>,
    section_key: impl Into<String>,
    value: &serde_json::Value,
  ) -> Self {
    Self::new(page_slug, language, section_key, CONTENT_TYPE_JSON, value.to_string())
  }

  pub fn key(&self) -> RowKey {
    RowKey::new(&self.page_slug, &self.language, &self.section_key)
  }

  pub fn parse_json(&self) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(&self.value)
  }

  pub fn with_author(mut self, user: impl Into<String>) -> Self {
    self.updated_by = Some(user.into());
    self
  }
}

/// Side-table entry mapping a stable segment key to its numeric anchor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
  pub page_slug: String,
  pub segment_key: String,
  pub segment_id: i64,
  pub segment_type: String,
  #[serde(default)]
  pub position: i32,
  #[serde(default)]
  pub is_static: bool,
  #[serde(default)]
  pub deleted: bool,
}

impl RegistryEntry {
  pub fn new(
    page_slug: impl Into<String>,
    segment_key: impl Into<String>,
    segment_id: i64,
    segment_type: impl Into<String>,
  ) -> Self {
    Self {
      page_slug: page_slug.into(),
      segment_key: segment_key.into(),
      segment_id,
      segment_type: segment_type.into(),
      position: 0,
      is_static: false,
      deleted: false,
    }
  }

  pub fn at(mut self, position: i32) -> Self {
    self.position = position;
    self
  }

  /// True when a tab-order or segment id names this entry, either by its
  /// numeric id rendered as a string or by its key.
  pub fn matches_id(&self, id: &str) -> bool {
    self.segment_key == id || self.segment_id.to_string() == id
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn reserved_keys() {
    assert!(is_reserved_key("page_segments"));
    assert!(is_reserved_key("tab_order"));
    assert!(is_reserved_key("seo_data"));
    assert!(!is_reserved_key("hero_title"));
  }

  #[test]
  fn json_row_encodes_value() {
    let row = ContentRow::json("home", "en", "seo_data", &json!({"title": "Home"}));
    assert_eq!(row.content_type, "json");
    assert_eq!(row.parse_json().unwrap(), json!({"title": "Home"}));
  }

  #[test]
  fn row_deserializes_with_defaults() {
    let row: ContentRow = serde_json::from_value(json!({
      "page_slug": "home",
      "language": "en",
      "section_key": "hero_title",
      "value": "Welcome"
    }))
    .unwrap();
    assert_eq!(row.content_type, "text");
    assert_eq!(row.version, 0);
    assert!(row.updated_at.is_none());
  }

  #[test]
  fn registry_matches_numeric_and_key() {
    let entry = RegistryEntry::new("home", "hero_legacy", 7, "hero");
    assert!(entry.matches_id("7"));
    assert!(entry.matches_id("hero_legacy"));
    assert!(!entry.matches_id("8"));
  }
}
