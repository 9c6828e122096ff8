use glam::Vec3;

use super::*;
use crate::nav_mesh::ValidatedNavMesh;
use crate::path_node_graph::MeshId;
use crate::search::SearchPoint;
use crate::util::Transform;

fn two_poly_graph() -> (PathNodeGraph, Vec<NodeId>) {
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
  ];
  let mesh = ValidatedNavMesh::new(polys, Transform::default());
  let mut ids: slotmap::SlotMap<MeshId, ()> = slotmap::SlotMap::with_key();
  let mesh_id = ids.insert(());
  let mut graph = PathNodeGraph::new(64, 64);
  let nodes = graph.add_mesh(mesh_id, &mesh).unwrap();
  (graph, nodes)
}

fn params(nodes: &[NodeId], graph: &PathNodeGraph) -> PathFindParams {
  PathFindParams {
    starts: vec![SearchPoint { node: nodes[0], position_ps: graph.node(nodes[0]).unwrap().position_ps }],
    goals: vec![SearchPoint { node: nodes[1], position_ps: graph.node(nodes[1]).unwrap().position_ps }],
    ..Default::default()
  }
}

#[test]
fn static_request_is_serviced_and_visible_only_after_flip() {
  let (graph, nodes) = two_poly_graph();
  let manager = RequestManager::new(8.0, 4.0, 1.3);
  let handle = manager.add_static_request("test", UserId(1), params(&nodes, &graph), true, true);

  manager.update(&graph, 0.0).unwrap();
  // Published into the inactive slot, but not visible until flip_buffers.
  assert!(manager.get_results(handle).unwrap().is_none());

  manager.flip_buffers();
  let results = manager.get_results(handle).unwrap().unwrap();
  assert_eq!(results.goal_nodes, vec![nodes[1]]);
}

#[test]
fn priority_gate_blocks_service_before_the_minimum_interval() {
  let (graph, nodes) = two_poly_graph();
  let manager = RequestManager::new(8.0, 4.0, 1.3);
  let handle = manager.add_static_request("test", UserId(1), params(&nodes, &graph), true, false);

  manager.update(&graph, 0.0).unwrap();
  manager.flip_buffers();
  assert!(manager.get_results(handle).unwrap().is_some());

  // Immediately re-ticking well inside the normal-priority minimum
  // interval (1/4.0s) should be a no-op for this request, not a panic, and
  // the published result should remain readable.
  manager.update(&graph, 0.01).unwrap();
  manager.flip_buffers();
  assert!(manager.get_results(handle).unwrap().is_some());
}

#[test]
fn cache_request_snapshots_the_source_request() {
  let (graph, nodes) = two_poly_graph();
  let manager = RequestManager::new(8.0, 4.0, 1.3);
  let source = manager.add_undirected_request("source", UserId(1), params(&nodes, &graph), true, true, false);
  manager.update(&graph, 0.0).unwrap();
  manager.flip_buffers();

  let cache = manager.cache_request("cache", UserId(1), source).unwrap();
  manager.update(&graph, 10.0).unwrap();
  manager.flip_buffers();

  let cached = manager.get_results(cache).unwrap().unwrap();
  assert!(cached.reached_goals.iter().all(|&r| r));
}

#[test]
fn remove_request_frees_it_on_the_next_update() {
  let (graph, nodes) = two_poly_graph();
  let manager = RequestManager::new(8.0, 4.0, 1.3);
  let handle = manager.add_static_request("test", UserId(1), params(&nodes, &graph), true, true);
  manager.remove_request(handle).unwrap();
  manager.update(&graph, 0.0).unwrap();
  assert!(manager.get_results(handle).is_err());
}

#[test]
fn can_path_to_and_approx_distance_reflect_the_latest_results() {
  let (graph, nodes) = two_poly_graph();
  let manager = RequestManager::new(8.0, 4.0, 1.3);
  let handle = manager.add_static_request("test", UserId(1), params(&nodes, &graph), true, true);
  manager.update(&graph, 0.0).unwrap();
  manager.flip_buffers();

  assert!(manager.can_path_to(handle, nodes[1]).unwrap());
  let dist = manager.get_approx_path_distance(handle, Vec3::ZERO, &graph).unwrap();
  assert!(dist.is_some());
}
