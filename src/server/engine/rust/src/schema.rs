/* src/server/engine/rust/src/schema.rs */

//! Per-type field schemas. Everything that used to be hard-coded in one editor
//! per segment type (which fields are translatable, where the payload lives,
//! what a valid value looks like) is declared here as data.

use serde_json::Value;

use crate::segment::{SegmentKind, SegmentRecord, is_empty_value};

/// Where a segment's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageShape {
  /// `data` lives inside the `page_segments` entry.
  Inline,
  /// `data` may be superseded by a sibling row keyed by the segment id.
  SiblingRow,
}

/// A list of items inside segment data, with the per-item text fields.
#[derive(Debug, Clone, Copy)]
pub struct ItemList {
  pub field: &'static str,
  pub text_fields: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
  Required(&'static str),
  OneOf(&'static str, &'static [&'static str]),
  Range(&'static str, i64, i64),
  MaxItems(&'static str, usize),
}

#[derive(Debug)]
pub struct SegmentSchema {
  pub name: &'static str,
  pub version: u32,
  pub storage: StorageShape,
  pub text_fields: &'static [&'static str],
  /// Item lists in priority order; the first one present in the data is the
  /// primary list for translation keys.
  pub item_lists: &'static [ItemList],
  pub rules: &'static [Rule],
}

const BUTTON_STYLES: &[&str] = &["primary", "secondary", "outline", "link"];

static HERO: SegmentSchema = SegmentSchema {
  name: "hero",
  version: 2,
  storage: StorageShape::Inline,
  text_fields: &["title", "subtitle", "description", "ctaText"],
  item_lists: &[],
  rules: &[
    Rule::OneOf("imagePosition", &["left", "right", "background"]),
    Rule::OneOf("layoutRatio", &["50-50", "60-40", "40-60"]),
    Rule::OneOf("ctaStyle", BUTTON_STYLES),
  ],
};

static TILES: SegmentSchema = SegmentSchema {
  name: "tiles",
  version: 2,
  storage: StorageShape::SiblingRow,
  text_fields: &["title", "subtitle"],
  item_lists: &[
    ItemList { field: "tiles", text_fields: &["title", "description", "linkText"] },
    ItemList { field: "items", text_fields: &["title", "description", "linkText"] },
  ],
  rules: &[
    Rule::Range("columns", 1, 6),
    Rule::MaxItems("tiles", 24),
    Rule::MaxItems("items", 24),
  ],
};

static BANNER: SegmentSchema = SegmentSchema {
  name: "banner",
  version: 2,
  storage: StorageShape::SiblingRow,
  text_fields: &[
    "title",
    "subtitle",
    "description",
    "buttonText",
    "sectionTitle",
    "sectionDescription",
    "bannerButtonText",
  ],
  item_lists: &[ItemList { field: "bannerImages", text_fields: &["alt", "caption"] }],
  rules: &[
    Rule::OneOf("buttonStyle", BUTTON_STYLES),
    Rule::OneOf("bannerButtonStyle", BUTTON_STYLES),
    Rule::MaxItems("bannerImages", 12),
  ],
};

static SOLUTIONS: SegmentSchema = SegmentSchema {
  name: "solutions",
  version: 2,
  storage: StorageShape::SiblingRow,
  text_fields: &["title", "description"],
  item_lists: &[
    ItemList { field: "items", text_fields: &["title", "description", "linkText"] },
    ItemList { field: "solutionsItems", text_fields: &["title", "description"] },
  ],
  rules: &[Rule::OneOf("layout", &["grid", "list", "carousel"])],
};

static TABLE: SegmentSchema = SegmentSchema {
  name: "table",
  version: 1,
  storage: StorageShape::SiblingRow,
  text_fields: &["title", "caption"],
  item_lists: &[ItemList { field: "rows", text_fields: &["label", "value", "note"] }],
  rules: &[Rule::MaxItems("rows", 200)],
};

static FAQ: SegmentSchema = SegmentSchema {
  name: "faq",
  version: 1,
  storage: StorageShape::SiblingRow,
  text_fields: &["title", "subtitle"],
  item_lists: &[ItemList { field: "items", text_fields: &["question", "answer"] }],
  rules: &[Rule::MaxItems("items", 50)],
};

static TEXT: SegmentSchema = SegmentSchema {
  name: "text",
  version: 1,
  storage: StorageShape::SiblingRow,
  text_fields: &["title", "content"],
  item_lists: &[],
  rules: &[],
};

static CTA: SegmentSchema = SegmentSchema {
  name: "cta",
  version: 1,
  storage: StorageShape::SiblingRow,
  text_fields: &["title", "description", "buttonText"],
  item_lists: &[],
  rules: &[Rule::Required("buttonLink"), Rule::OneOf("buttonStyle", BUTTON_STYLES)],
};

static IMAGE: SegmentSchema = SegmentSchema {
  name: "image",
  version: 1,
  storage: StorageShape::SiblingRow,
  text_fields: &["alt", "caption"],
  item_lists: &[],
  rules: &[Rule::Required("imageUrl")],
};

static FOOTER: SegmentSchema = SegmentSchema {
  name: "footer",
  version: 1,
  storage: StorageShape::SiblingRow,
  text_fields: &["tagline", "copyright"],
  item_lists: &[ItemList { field: "links", text_fields: &["label"] }],
  rules: &[],
};

/// Fallback for segment types this build does not know: common text-ish field
/// names are treated as translatable, everything else passes through.
static GENERIC: SegmentSchema = SegmentSchema {
  name: "generic",
  version: 0,
  storage: StorageShape::SiblingRow,
  text_fields: &[
    "title",
    "subtitle",
    "heading",
    "description",
    "content",
    "text",
    "caption",
    "label",
    "buttonText",
    "ctaText",
  ],
  item_lists: &[ItemList {
    field: "items",
    text_fields: &[
      "title",
      "subtitle",
      "description",
      "content",
      "text",
      "label",
      "caption",
      "question",
      "answer",
      "buttonText",
    ],
  }],
  rules: &[],
};

pub fn schema_for(kind: &SegmentKind) -> &'static SegmentSchema {
  match kind {
    SegmentKind::Hero => &HERO,
    SegmentKind::Tiles => &TILES,
    SegmentKind::Banner => &BANNER,
    SegmentKind::Solutions => &SOLUTIONS,
    SegmentKind::Table => &TABLE,
    SegmentKind::Faq => &FAQ,
    SegmentKind::Text => &TEXT,
    SegmentKind::Cta => &CTA,
    SegmentKind::Image => &IMAGE,
    SegmentKind::Footer => &FOOTER,
    SegmentKind::Other(_) => &GENERIC,
  }
}

impl SegmentSchema {
  pub fn is_text_field(&self, name: &str) -> bool {
    self.text_fields.contains(&name)
  }

  pub fn item_list(&self, field: &str) -> Option<&ItemList> {
    self.item_lists.iter().find(|l| l.field == field)
  }

  /// Visit every translatable string slot in `data`: top-level text fields
  /// first, then item list fields in list order. The callback receives the
  /// list (if any), the item index, the field name, and the current value.
  pub fn for_each_text<'a>(
    &self,
    data: &'a Value,
    mut f: impl FnMut(Option<&ItemList>, usize, &str, &'a str),
  ) {
    for field in self.text_fields {
      if let Some(s) = data.get(*field).and_then(Value::as_str) {
        f(None, 0, *field, s);
      }
    }
    for list in self.item_lists {
      let Some(items) = data.get(list.field).and_then(Value::as_array) else {
        continue;
      };
      for (idx, item) in items.iter().enumerate() {
        for field in list.text_fields {
          if let Some(s) = item.get(*field).and_then(Value::as_str) {
            f(Some(list), idx, *field, s);
          }
        }
      }
    }
  }

  /// Apply `f` to every translatable string slot in `data` in place.
  pub fn map_text(
    &self,
    data: &mut Value,
    mut f: impl FnMut(Option<&ItemList>, usize, &str, &str) -> String,
  ) {
    let Some(obj) = data.as_object_mut() else { return };
    for field in self.text_fields {
      if let Some(Value::String(s)) = obj.get_mut(*field) {
        *s = f(None, 0, field, s.as_str());
      }
    }
    for list in self.item_lists {
      let Some(Value::Array(items)) = obj.get_mut(list.field) else {
        continue;
      };
      for (idx, item) in items.iter_mut().enumerate() {
        let Some(item_obj) = item.as_object_mut() else { continue };
        for field in list.text_fields {
          if let Some(Value::String(s)) = item_obj.get_mut(*field) {
            *s = f(Some(list), idx, field, s.as_str());
          }
        }
      }
    }
  }

  /// Check `segment` against the declared rules. Returns one message per
  /// violation; an empty vector means valid.
  pub fn validate(&self, segment: &SegmentRecord) -> Vec<String> {
    let mut issues = Vec::new();
    for rule in self.rules {
      match *rule {
        Rule::Required(field) => {
          if segment.field(field).is_none_or(is_empty_value) {
            issues.push(format!("{}.{field} is required", segment.id));
          }
        }
        Rule::OneOf(field, allowed) => {
          if let Some(v) = segment.str_field(field) {
            if !v.is_empty() && !allowed.contains(&v) {
              issues.push(format!("{}.{field} must be one of {allowed:?}, got \"{v}\"", segment.id));
            }
          }
        }
        Rule::Range(field, min, max) => {
          if let Some(v) = segment.field(field) {
            let n = v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()));
            match n {
              Some(n) if (min..=max).contains(&n) => {}
              _ => issues.push(format!("{}.{field} must be between {min} and {max}", segment.id)),
            }
          }
        }
        Rule::MaxItems(field, max) => {
          if let Some(items) = segment.field(field).and_then(Value::as_array) {
            if items.len() > max {
              issues.push(format!("{}.{field} allows at most {max} items", segment.id));
            }
          }
        }
      }
    }
    issues
  }
}
