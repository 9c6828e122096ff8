use glam::Vec3;

use super::*;
use crate::nav_mesh::ValidatedNavMesh;
use crate::path_node_graph::{MeshId, PathNodeGraph};
use crate::util::Transform;

fn three_poly_line() -> (PathNodeGraph, Vec<NodeId>) {
  let polys = vec![
    vec![
      Vec3::new(0.0, 0.0, 0.0),
      Vec3::new(2.0, 0.0, 0.0),
      Vec3::new(2.0, 0.0, 2.0),
      Vec3::new(0.0, 0.0, 2.0),
    ],
    vec![
      Vec3::new(2.0, 0.0, 0.0),
      Vec3::new(4.0, 0.0, 0.0),
      Vec3::new(4.0, 0.0, 2.0),
      Vec3::new(2.0, 0.0, 2.0),
    ],
    vec![
      Vec3::new(4.0, 0.0, 0.0),
      Vec3::new(6.0, 0.0, 0.0),
      Vec3::new(6.0, 0.0, 2.0),
      Vec3::new(4.0, 0.0, 2.0),
    ],
  ];
  let mesh = ValidatedNavMesh::new(polys, Transform::default());
  let mut ids: slotmap::SlotMap<MeshId, ()> = slotmap::SlotMap::with_key();
  let mesh_id = ids.insert(());
  let mut graph = PathNodeGraph::new(64, 64);
  let nodes = graph.add_mesh(mesh_id, &mesh).unwrap();
  (graph, nodes)
}

#[test]
fn build_path_rejects_an_empty_node_path() {
  let (graph, _) = three_poly_line();
  let cost_fn = DistanceCost;
  let params = BuildPathParams::new(&cost_fn);
  let result = build_path(&graph, &[], &params, &[], None);
  assert!(matches!(result, Err(BuildError::GoalNotVisited)));
}

#[test]
fn build_path_none_mode_returns_raw_node_positions() {
  let (graph, nodes) = three_poly_line();
  let cost_fn = DistanceCost;
  let mut params = BuildPathParams::new(&cost_fn);
  params.smoothing = SmoothingMode::None;
  let waypoints = build_path(&graph, &nodes, &params, &[], None).unwrap();
  assert_eq!(waypoints.steps.len(), nodes.len());
}

#[test]
fn build_path_full_smoothing_collapses_a_straight_corridor() {
  let (graph, nodes) = three_poly_line();
  let cost_fn = DistanceCost;
  let mut params = BuildPathParams::new(&cost_fn);
  params.smoothing = SmoothingMode::Full;
  let waypoints = build_path(&graph, &nodes, &params, &[], None).unwrap();
  // A straight corridor should funnel down to exactly a start and an end.
  assert_eq!(waypoints.steps.len(), 2);
  assert!((waypoints.length - 4.0).abs() < 1e-3);
}

#[test]
fn build_path_approximate_smoothing_also_collapses_a_straight_corridor() {
  let (graph, nodes) = three_poly_line();
  let cost_fn = DistanceCost;
  let mut params = BuildPathParams::new(&cost_fn);
  params.smoothing = SmoothingMode::Approximate;
  let waypoints = build_path(&graph, &nodes, &params, &[], None).unwrap();
  assert!(waypoints.steps.len() <= 3);
}

#[test]
fn build_path_reverse_flips_the_waypoint_order() {
  let (graph, nodes) = three_poly_line();
  let cost_fn = DistanceCost;
  let mut params = BuildPathParams::new(&cost_fn);
  params.smoothing = SmoothingMode::None;
  params.reverse = true;
  let waypoints = build_path(&graph, &nodes, &params, &[], None).unwrap();
  let expected_first = graph.node(*nodes.last().unwrap()).unwrap().position_ps;
  assert_eq!(waypoints.steps.first().unwrap().position_ps, expected_first);
}

#[test]
fn build_path_with_dangling_node_fails_validation() {
  let (graph, nodes) = three_poly_line();
  let mut bogus = nodes.clone();
  bogus.push(NodeId(9999));
  let cost_fn = DistanceCost;
  let params = BuildPathParams::new(&cost_fn);
  let result = build_path(&graph, &bogus, &params, &[], None);
  assert!(matches!(result, Err(BuildError::DanglingNode)));
}
