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
fn find_single_path_reaches_the_far_end() {
  let (graph, nodes) = three_poly_line();
  let start_pos = graph.node(nodes[0]).unwrap().position_ps;
  let goal_pos = graph.node(nodes[2]).unwrap().position_ps;
  let params = PathFindParams {
    starts: vec![SearchPoint { node: nodes[0], position_ps: start_pos }],
    goals: vec![SearchPoint { node: nodes[2], position_ps: goal_pos }],
    ..Default::default()
  };

  let outcome = find_single_path(&graph, &params).unwrap();
  assert_eq!(outcome.goal_nodes, vec![nodes[2]]);
  assert_eq!(outcome.node_path, vec![nodes[0], nodes[1], nodes[2]]);
  assert!(!outcome.overflowed_closed_list);
}

#[test]
fn find_single_path_with_no_starts_errors() {
  let (graph, _) = three_poly_line();
  let params = PathFindParams::default();
  assert!(matches!(find_single_path(&graph, &params), Err(SearchError::NoStarts)));
}

#[test]
fn impassable_player_blockage_returns_no_path_without_erroring() {
  let (graph, nodes) = three_poly_line();
  let params = PathFindParams {
    starts: vec![SearchPoint { node: nodes[0], position_ps: Vec3::ZERO }],
    goals: vec![SearchPoint { node: nodes[2], position_ps: Vec3::ZERO }],
    player_blockage_cost: PlayerBlockageCost::Impassable,
    ..Default::default()
  };
  let outcome = find_single_path(&graph, &params).unwrap();
  assert!(outcome.goal_nodes.is_empty());
}

#[test]
fn find_undirected_paths_settles_every_goal() {
  let (graph, nodes) = three_poly_line();
  let params = PathFindParams {
    starts: vec![SearchPoint { node: nodes[0], position_ps: Vec3::ZERO }],
    goals: vec![
      SearchPoint { node: nodes[1], position_ps: Vec3::ZERO },
      SearchPoint { node: nodes[2], position_ps: Vec3::ZERO },
    ],
    ..Default::default()
  };
  let outcome = find_undirected_paths(&graph, &params).unwrap();
  assert_eq!(outcome.reached_goals, vec![true, true]);
  assert_eq!(outcome.goal_nodes.len(), 2);
}

#[test]
fn closed_list_overflow_stops_the_search_before_the_goal_is_reached() {
  let (graph, nodes) = three_poly_line();
  let start_pos = graph.node(nodes[0]).unwrap().position_ps;
  let goal_pos = graph.node(nodes[2]).unwrap().position_ps;
  let params = PathFindParams {
    starts: vec![SearchPoint { node: nodes[0], position_ps: start_pos }],
    goals: vec![SearchPoint { node: nodes[2], position_ps: goal_pos }],
    max_visited: 0,
    ..Default::default()
  };
  let outcome = find_single_path(&graph, &params).unwrap();
  assert!(outcome.overflowed_closed_list);
  assert!(outcome.goal_nodes.is_empty());
  assert!(outcome.reached_goals.iter().all(|&r| !r));
}
