/* src/server/engine/rust/src/lib.rs */

pub mod legacy;
pub mod render;
pub mod resolve;
pub mod row;
pub mod schema;
pub mod segment;
pub mod sync;
pub mod translate;

// Public API re-exports
pub use legacy::{legacy_source_fields, reconstruct};
pub use render::{RenderNode, Shape, dispatch, render_plan};
pub use resolve::{
  ResolveDiagnostics, ResolvedPage, apply_sibling_payload, parse_tab_order, resolve,
  uses_sibling_row,
};
pub use row::{
  CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, ContentRow, PAGE_SEGMENTS_KEY, RegistryEntry, RowKey,
  SEO_DATA_KEY, TAB_ORDER_KEY, is_reserved_key,
};
pub use schema::{ItemList, Rule, SegmentSchema, StorageShape, schema_for};
pub use segment::{SegmentKind, SegmentRecord, find_duplicate_id, is_empty_value, parse_segments};
pub use sync::{
  DEFAULT_PENDING_MARKER, LanguagePlan, SyncAction, ensure_tab_order, has_translated_text,
  marker_copy, mirror_structure, plan_language, segment_aliases,
};
pub use translate::{FlatKey, flatten, parse_flat_key, unflatten};
