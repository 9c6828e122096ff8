use glam::Vec3;
use slotmap::SlotMap;

use super::*;
use crate::nav_mesh::ValidatedNavMesh;
use crate::util::Transform;

fn two_poly_mesh() -> ValidatedNavMesh {
  let poly0 = vec![
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(2.0, 0.0, 0.0),
    Vec3::new(2.0, 0.0, 2.0),
    Vec3::new(0.0, 0.0, 2.0),
  ];
  let poly1 = vec![
    Vec3::new(2.0, 0.0, 0.0),
    Vec3::new(4.0, 0.0, 0.0),
    Vec3::new(4.0, 0.0, 2.0),
    Vec3::new(2.0, 0.0, 2.0),
  ];
  ValidatedNavMesh::new(vec![poly0, poly1], Transform::default())
}

#[test]
fn add_mesh_links_adjacent_polys_bidirectionally() {
  let mesh = two_poly_mesh();
  let mut ids: SlotMap<MeshId, ()> = SlotMap::with_key();
  let mesh_id = ids.insert(());
  let mut graph = PathNodeGraph::new(64, 64);

  let nodes = graph.add_mesh(mesh_id, &mesh).unwrap();
  assert_eq!(nodes.len(), 2);
  assert_eq!(graph.node_count(), 2);

  let out0: Vec<_> = graph.outgoing_links(nodes[0]).collect();
  let out1: Vec<_> = graph.outgoing_links(nodes[1]).collect();
  assert_eq!(out0.len(), 1);
  assert_eq!(out1.len(), 1);
  assert_eq!(out0[0].dest, nodes[1]);
  assert_eq!(out1[0].dest, nodes[0]);
  assert_eq!(out0[0].kind, LinkKind::Bidirectional);

  graph.validate().expect("graph should be internally consistent");
}

#[test]
fn invariant_every_link_has_matching_reverse() {
  let mesh = two_poly_mesh();
  let mut ids: SlotMap<MeshId, ()> = SlotMap::with_key();
  let mesh_id = ids.insert(());
  let mut graph = PathNodeGraph::new(64, 64);
  let nodes = graph.add_mesh(mesh_id, &mesh).unwrap();

  let sources: Vec<NodeId> = graph.reverse_sources(nodes[1]).collect();
  assert_eq!(sources, vec![nodes[0]]);
}

#[test]
fn add_mesh_then_remove_mesh_restores_allocation_counters() {
  let mesh = two_poly_mesh();
  let mut ids: SlotMap<MeshId, ()> = SlotMap::with_key();
  let mesh_id = ids.insert(());
  let mut graph = PathNodeGraph::new(64, 64);

  graph.add_mesh(mesh_id, &mesh).unwrap();
  assert_eq!(graph.node_count(), 2);
  assert_eq!(graph.link_count(), 2);

  graph.remove_mesh(mesh_id);
  assert_eq!(graph.node_count(), 0);
  assert_eq!(graph.link_count(), 0);
}

#[test]
fn node_allocation_fails_gracefully_when_exhausted() {
  let mut graph = PathNodeGraph::new(1, 64);
  let mesh = two_poly_mesh();
  let mut ids: SlotMap<MeshId, ()> = SlotMap::with_key();
  let mesh_id = ids.insert(());

  let result = graph.add_mesh(mesh_id, &mesh);
  assert!(result.is_err());
  // The whole call rolled back: no nodes or links left over.
  assert_eq!(graph.node_count(), 0);
  assert_eq!(graph.link_count(), 0);
  assert_eq!(graph.node_alloc_failures, 1);
}

#[test]
fn remove_link_unlinks_both_sides() {
  let mesh = two_poly_mesh();
  let mut ids: SlotMap<MeshId, ()> = SlotMap::with_key();
  let mesh_id = ids.insert(());
  let mut graph = PathNodeGraph::new(64, 64);
  let nodes = graph.add_mesh(mesh_id, &mesh).unwrap();

  assert!(graph.remove_link(nodes[0], nodes[1]));
  assert_eq!(graph.outgoing_links(nodes[0]).count(), 0);
  assert_eq!(graph.reverse_sources(nodes[1]).count(), 0);
}
