use glam::Vec3;

use super::*;

#[test]
fn empty_box_has_zero_size_and_contains_nothing() {
  let b = BoundingBox::Empty;
  assert!(b.is_empty());
  assert_eq!(b.size(), Vec3::ZERO);
  assert!(!b.contains_point(Vec3::ZERO));
}

#[test]
fn expand_to_point_grows_an_empty_box_to_a_single_point() {
  let b = BoundingBox::Empty.expand_to_point(Vec3::new(1.0, 2.0, 3.0));
  assert_eq!(b.as_box(), (Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn expand_to_bounds_grows_to_the_union() {
  let a = BoundingBox::new_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
  let b = BoundingBox::new_box(Vec3::new(2.0, -1.0, 0.5), Vec3::new(3.0, 0.5, 2.0));
  let union = a.expand_to_bounds(&b);
  assert_eq!(union.as_box(), (Vec3::new(0.0, -1.0, 0.0), Vec3::new(3.0, 1.0, 2.0)));
}

#[test]
fn contains_bounds_is_true_only_for_a_strict_subset() {
  let outer = BoundingBox::new_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
  let inner = BoundingBox::new_box(Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0));
  let overlapping = BoundingBox::new_box(Vec3::new(5.0, 5.0, 5.0), Vec3::new(15.0, 15.0, 15.0));
  assert!(outer.contains_bounds(&inner));
  assert!(!outer.contains_bounds(&overlapping));
  assert!(outer.intersects_bounds(&overlapping));
}

#[test]
fn transform_apply_and_apply_inverse_round_trip() {
  let transform = Transform { translation: Vec3::new(3.0, 0.0, -2.0), rotation: std::f32::consts::FRAC_PI_2 };
  let point = Vec3::new(1.0, 0.0, 0.0);
  let moved = transform.apply(point);
  let back = transform.apply_inverse(moved);
  assert!((back - point).length() < 1e-4);
}

#[test]
fn bounding_box_hierarchy_query_finds_only_overlapping_leaves() {
  let mut values = vec![
    (BoundingBox::new_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)), Some("a")),
    (BoundingBox::new_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(11.0, 1.0, 1.0)), Some("b")),
    (BoundingBox::new_box(Vec3::new(20.0, 0.0, 0.0), Vec3::new(21.0, 1.0, 1.0)), Some("c")),
  ];
  let hierarchy = BoundingBoxHierarchy::new(&mut values);
  assert!(hierarchy.depth() >= 2);

  let hits = hierarchy.query_box(BoundingBox::new_box(Vec3::new(9.5, 0.0, 0.0), Vec3::new(10.5, 1.0, 1.0)));
  assert_eq!(hits, vec![&"b"]);
}

#[test]
fn bounding_box_hierarchy_of_one_value_is_a_single_leaf() {
  let mut values = vec![(BoundingBox::new_box(Vec3::ZERO, Vec3::ONE), Some("only"))];
  let hierarchy = BoundingBoxHierarchy::new(&mut values);
  assert_eq!(hierarchy.depth(), 1);
}
