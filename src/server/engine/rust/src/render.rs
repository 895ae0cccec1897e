/* src/server/engine/rust/src/render.rs */

//! Render dispatch. Presentational components live outside this crate; this
//! module decides which component (and which of its shapes) a segment maps
//! to, plus the layout class tables those components share.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolve::ResolvedPage;
use crate::segment::{SegmentKind, SegmentRecord};

/// Which data layout a component should expect. Decided from the fields
/// present in `data`, never from a version flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
  Current,
  Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
  /// DOM anchor id; numeric when the registry knows the segment.
  pub anchor_id: String,
  pub segment_id: String,
  pub component: String,
  pub shape: Shape,
  pub layout_class: String,
  pub data: Value,
}

// -- Layout tables --

const HERO_RATIOS: &[(&str, &str)] = &[
  ("50-50", "grid-cols-1 md:grid-cols-2"),
  ("60-40", "grid-cols-1 md:grid-cols-[3fr_2fr]"),
  ("40-60", "grid-cols-1 md:grid-cols-[2fr_3fr]"),
];

const TILE_COLUMNS: &[(i64, &str)] = &[
  (1, "grid-cols-1"),
  (2, "grid-cols-1 md:grid-cols-2"),
  (3, "grid-cols-1 md:grid-cols-3"),
  (4, "grid-cols-2 md:grid-cols-4"),
  (5, "grid-cols-2 md:grid-cols-5"),
  (6, "grid-cols-3 md:grid-cols-6"),
];

const SOLUTION_LAYOUTS: &[(&str, &str)] = &[
  ("grid", "grid gap-6 md:grid-cols-3"),
  ("list", "flex flex-col gap-4"),
  ("carousel", "flex overflow-x-auto"),
];

const BUTTON_STYLES: &[(&str, &str)] = &[
  ("primary", "btn btn-primary"),
  ("secondary", "btn btn-secondary"),
  ("outline", "btn btn-outline"),
  ("link", "btn-link"),
];

fn lookup<'a>(table: &[(&str, &'a str)], key: Option<&str>, fallback: &'a str) -> &'a str {
  key.and_then(|k| table.iter().find(|(name, _)| *name == k)).map_or(fallback, |(_, class)| *class)
}

pub fn hero_layout_class(ratio: Option<&str>) -> &'static str {
  lookup(HERO_RATIOS, ratio, "grid-cols-1 md:grid-cols-2")
}

pub fn tiles_column_class(columns: Option<i64>) -> &'static str {
  columns
    .and_then(|c| TILE_COLUMNS.iter().find(|(n, _)| *n == c))
    .map_or("grid-cols-1 md:grid-cols-3", |(_, class)| *class)
}

pub fn button_class(style: Option<&str>) -> &'static str {
  lookup(BUTTON_STYLES, style, "btn btn-primary")
}

fn has_any(data: &Value, fields: &[&str]) -> bool {
  fields.iter().any(|f| data.get(*f).is_some())
}

fn str_field<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
  data.get(field).and_then(Value::as_str)
}

fn number_field(data: &Value, field: &str) -> Option<i64> {
  let v = data.get(field)?;
  v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Map one segment to a render node. Unknown kinds, page chrome, and segments
/// with nothing to show yield `None`.
pub fn dispatch(segment: &SegmentRecord, anchor_id: &str) -> Option<RenderNode> {
  if segment.is_empty() {
    return None;
  }
  let data = &segment.data;

  let (shape, layout_class) = match &segment.kind {
    SegmentKind::Hero => (Shape::Current, hero_layout_class(str_field(data, "layoutRatio"))),
    SegmentKind::Tiles => {
      let legacy = has_any(data, &["items"]) && !has_any(data, &["tiles"]);
      let shape = if legacy { Shape::Legacy } else { Shape::Current };
      (shape, tiles_column_class(number_field(data, "columns")))
    }
    SegmentKind::Banner => {
      if has_any(data, &["bannerImages", "bannerButtonText"]) {
        (Shape::Legacy, button_class(str_field(data, "bannerButtonStyle")))
      } else {
        (Shape::Current, button_class(str_field(data, "buttonStyle")))
      }
    }
    SegmentKind::Solutions => {
      let shape = if has_any(data, &["solutionsItems"]) { Shape::Legacy } else { Shape::Current };
      (shape, lookup(SOLUTION_LAYOUTS, str_field(data, "layout"), "grid gap-6 md:grid-cols-3"))
    }
    SegmentKind::Cta => (Shape::Current, button_class(str_field(data, "buttonStyle"))),
    SegmentKind::Table | SegmentKind::Faq | SegmentKind::Text | SegmentKind::Image => {
      (Shape::Current, "")
    }
    SegmentKind::Footer | SegmentKind::Other(_) => return None,
  };

  Some(RenderNode {
    anchor_id: anchor_id.to_string(),
    segment_id: segment.id.clone(),
    component: segment.kind.to_string(),
    shape,
    layout_class: layout_class.to_string(),
    data: data.clone(),
  })
}

/// Render nodes for a resolved page, in tab order.
pub fn render_plan(page: &ResolvedPage) -> Vec<RenderNode> {
  page
    .ordered_segments()
    .into_iter()
    .filter_map(|seg| dispatch(seg, &page.anchor_id(&seg.id)))
    .collect()
}
