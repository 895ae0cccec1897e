/* src/server/engine/rust/src/sync/tests.rs */

use serde_json::json;

use super::*;
use crate::row::RegistryEntry;

const M: &str = DEFAULT_PENDING_MARKER;

fn banner(id: &str, data: serde_json::Value) -> SegmentRecord {
  SegmentRecord::new(id, "banner", data)
}

fn reference() -> Vec<SegmentRecord> {
  vec![
    SegmentRecord::new("1", "hero", json!({"title": "Welcome", "imageUrl": "/hero.png"})),
    banner("5", json!({"title": "Hi", "subtitle": "", "buttonLink": "/a", "buttonStyle": "primary"})),
  ]
}

#[test]
fn missing_row_is_created_from_reference() {
  let plan = plan_language(&reference(), "5", None, M).unwrap();
  assert_eq!(plan.action, SyncAction::CreatedRow);
  assert!(plan.changed);
  assert_eq!(plan.segments.len(), 2);
  // untouched segments are copied as-is, the edited one is marker-ized
  assert_eq!(plan.segments[0], reference()[0]);
  assert_eq!(plan.segments[1].data["title"], M);
  assert_eq!(plan.segments[1].data["subtitle"], "");
  assert_eq!(plan.segments[1].data["buttonLink"], "/a");
}

#[test]
fn missing_segment_is_appended() {
  let target = vec![SegmentRecord::new("1", "hero", json!({"title": "Willkommen"}))];
  let plan = plan_language(&reference(), "5", Some(&target), M).unwrap();
  assert_eq!(plan.action, SyncAction::Appended);
  assert_eq!(plan.segments.len(), 2);
  assert_eq!(plan.segments[0], target[0]);
  assert_eq!(plan.segments[1].id, "5");
  assert_eq!(plan.segments[1].data["title"], M);
}

#[test]
fn translated_text_kept_and_structure_mirrored() {
  let target = vec![banner("5", json!({"title": "Hallo", "buttonLink": "/old"}))];
  let plan = plan_language(&reference(), "5", Some(&target), M).unwrap();
  assert_eq!(plan.action, SyncAction::Mirrored);
  assert!(plan.changed);
  let seg = &plan.segments[0];
  assert_eq!(seg.data["title"], "Hallo");
  assert_eq!(seg.data["buttonLink"], "/a");
  assert_eq!(seg.data["buttonStyle"], "primary");
  assert_eq!(seg.data["subtitle"], "");
}

#[test]
fn mirroring_twice_is_stable() {
  let target = vec![banner("5", json!({"title": "Hallo", "buttonLink": "/old"}))];
  let first = plan_language(&reference(), "5", Some(&target), M).unwrap();
  let second = plan_language(&reference(), "5", Some(&first.segments), M).unwrap();
  assert_eq!(second.action, SyncAction::Mirrored);
  assert!(!second.changed);
  assert_eq!(second.segments, first.segments);
}

#[test]
fn placeholder_only_segment_is_refreshed() {
  let target = vec![banner("5", json!({"title": M, "subtitle": "", "buttonLink": "/old"}))];
  let plan = plan_language(&reference(), "5", Some(&target), M).unwrap();
  assert_eq!(plan.action, SyncAction::Refreshed);
  assert_eq!(plan.segments[0], marker_copy(&reference()[1], M));
}

#[test]
fn other_segments_text_untouched() {
  // Editing "5" must leave the translated hero byte-identical.
  let target = vec![
    SegmentRecord::new("1", "hero", json!({"title": "Willkommen", "imageUrl": "/alt.png"})),
    banner("5", json!({"title": "Hallo"})),
  ];
  let plan = plan_language(&reference(), "5", Some(&target), M).unwrap();
  assert_eq!(plan.segments[0], target[0]);
}

#[test]
fn mirrored_list_items_match_by_index() {
  let reference = vec![SegmentRecord::new(
    "f",
    "faq",
    json!({"title": "FAQ", "items": [
      {"question": "Why?", "answer": "Because", "open": true},
      {"question": "New?", "answer": "Yes"}
    ]}),
  )];
  let target = vec![SegmentRecord::new(
    "f",
    "faq",
    json!({"title": "FAQ DE", "items": [{"question": "Warum?", "answer": "Darum", "open": false}]}),
  )];
  let plan = plan_language(&reference, "f", Some(&target), M).unwrap();
  assert_eq!(
    plan.segments[0].data,
    json!({"title": "FAQ DE", "items": [
      {"question": "Warum?", "answer": "Darum", "open": true},
      {"question": M, "answer": M}
    ]})
  );
}

#[test]
fn unknown_segment_id_is_an_error() {
  assert!(plan_language(&reference(), "nope", None, M).is_err());
}

#[test]
fn translated_text_detection() {
  assert!(!has_translated_text(&banner("x", json!({"title": "", "buttonLink": "/a"})), M));
  assert!(!has_translated_text(&banner("x", json!({"title": M})), M));
  assert!(has_translated_text(&banner("x", json!({"bannerImages": [{"alt": "Logo"}]})), M));
}

#[test]
fn tab_order_cloned_when_absent() {
  let reference_tab = vec!["1".to_string(), "5".to_string()];
  let order = ensure_tab_order(None, &reference_tab, &reference(), "5", &[]).unwrap();
  assert_eq!(order, vec!["1", "5"]);

  // no reference tab order: fall back to reference segment order
  let order = ensure_tab_order(None, &[], &reference(), "5", &[]).unwrap();
  assert_eq!(order, vec!["1", "5"]);
}

#[test]
fn tab_order_insertion_position() {
  let reference_tab: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
  let target: Vec<String> = ["a", "c"].iter().map(|s| s.to_string()).collect();
  let order = ensure_tab_order(Some(&target), &reference_tab, &[], "b", &[]);
  assert_eq!(order.unwrap(), vec!["a", "b", "c"]);

  let target: Vec<String> = vec!["c".to_string()];
  let order = ensure_tab_order(Some(&target), &reference_tab, &[], "a", &[]);
  assert_eq!(order.unwrap(), vec!["a", "c"]);
  let order = ensure_tab_order(Some(&target), &reference_tab, &[], "z", &[]);
  assert_eq!(order.unwrap(), vec!["c", "z"]);
  assert_eq!(ensure_tab_order(Some(&target), &reference_tab, &[], "c", &[]), None);
}

#[test]
fn tab_order_matches_registry_aliases() {
  let registry = vec![
    RegistryEntry::new("home", "promo", 42, "banner"),
    RegistryEntry::new("home", "intro", 7, "text").at(1),
  ];
  assert_eq!(segment_aliases(&registry, "promo"), vec!["42"]);
  assert_eq!(segment_aliases(&registry, "42"), vec!["promo"]);
  assert!(segment_aliases(&registry, "unknown").is_empty());

  // listed by numeric id, synced by key: nothing to add
  let target = vec!["7".to_string(), "42".to_string()];
  let aliases = segment_aliases(&registry, "promo");
  assert_eq!(ensure_tab_order(Some(&target), &[], &[], "promo", &aliases), None);

  // the reference lists it by numeric id, the insertion still follows it
  let reference_tab = vec!["intro".to_string(), "42".to_string()];
  let target = vec!["intro".to_string()];
  let order = ensure_tab_order(Some(&target), &reference_tab, &[], "promo", &aliases);
  assert_eq!(order.unwrap(), vec!["intro", "promo"]);
}
