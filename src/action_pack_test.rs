use glam::Vec3;

use super::*;
use crate::path_node_graph::PathNodeGraph;
use crate::util::Transform;

struct TwoPolyLocator {
  a: NodeId,
  b: NodeId,
}

impl PolyLocator for TwoPolyLocator {
  fn locate(&self, pos_ps: Vec3) -> Option<NodeId> {
    if pos_ps.x < 2.0 {
      Some(self.a)
    } else {
      Some(self.b)
    }
  }
}

fn two_node_graph() -> (PathNodeGraph, TwoPolyLocator) {
  let mut graph = PathNodeGraph::new(64, 64);
  let a = graph
    .add_mesh_independent_node(
      PathNodeKind::Poly {
        mgr_id: crate::path_node_graph::NavManagerId {
          mesh_id: slotmap::SlotMap::<crate::path_node_graph::MeshId, ()>::with_key().insert(()),
          polygon_index: 0,
          sub_polygon_index: None,
        },
      },
      Vec3::new(1.0, 0.0, 1.0),
      0,
    )
    .unwrap();
  let b = graph
    .add_mesh_independent_node(
      PathNodeKind::Poly {
        mgr_id: crate::path_node_graph::NavManagerId {
          mesh_id: slotmap::SlotMap::<crate::path_node_graph::MeshId, ()>::with_key().insert(()),
          polygon_index: 1,
          sub_polygon_index: None,
        },
      },
      Vec3::new(3.0, 0.0, 1.0),
      0,
    )
    .unwrap();
  (graph, TwoPolyLocator { a, b })
}

#[test]
fn login_then_register_attaches_enter_and_exit_nodes() {
  let (mut graph, locator) = two_node_graph();
  let mut registry = ActionPackRegistry::new(16, 4);
  let pack = ActionPack::new(
    "jump_0",
    Transform::default(),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(3.0, 0.0, 1.0),
  );
  let id = registry.login(pack).unwrap();
  registry.request_registration(id);
  registry.update(&mut graph, &locator, &|_| true);

  let pack = registry.lookup_registered(id).expect("should be registered");
  assert!(pack.enter_node.is_some());
  assert!(pack.exit_node.is_some());
  graph.validate().expect("graph stays consistent after registration");
}

#[test]
fn logout_unregisters_and_frees_nodes() {
  let (mut graph, locator) = two_node_graph();
  let mut registry = ActionPackRegistry::new(16, 4);
  let pack = ActionPack::new("jump_0", Transform::default(), Vec3::new(1.0, 0.0, 1.0), Vec3::new(3.0, 0.0, 1.0));
  let id = registry.login(pack).unwrap();
  registry.request_registration(id);
  registry.update(&mut graph, &locator, &|_| true);

  let before = graph.node_count();
  registry.request_unregistration(id);
  registry.update(&mut graph, &locator, &|_| true);
  assert!(graph.node_count() < before);

  registry.logout(id);
  assert!(registry.lookup_logged_in(id).is_none());
}

#[test]
fn registration_fails_gracefully_off_mesh() {
  struct EmptyLocator;
  impl PolyLocator for EmptyLocator {
    fn locate(&self, _pos_ps: Vec3) -> Option<NodeId> {
      None
    }
  }
  let mut graph = PathNodeGraph::new(64, 64);
  let mut registry = ActionPackRegistry::new(16, 4);
  let pack = ActionPack::new("jump_0", Transform::default(), Vec3::ZERO, Vec3::new(3.0, 0.0, 1.0));
  let id = registry.login(pack).unwrap();
  registry.request_registration(id);
  registry.update(&mut graph, &EmptyLocator, &|_| true);

  assert!(registry.lookup_registered(id).is_none());
  assert_eq!(graph.node_count(), 0);
}

#[test]
fn mutex_arbitrates_two_owners() {
  let mut registry = ActionPackRegistry::new(16, 4);
  let mutex_id = registry.create_mutex(1);

  let mut pack_a = ActionPack::new("a_to_b", Transform::default(), Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
  pack_a.mutex_id = Some(mutex_id);
  let mut pack_b = ActionPack::new("b_to_a", Transform::default(), Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
  pack_b.mutex_id = Some(mutex_id);

  let id_a = registry.login(pack_a).unwrap();
  let id_b = registry.login(pack_b).unwrap();

  let user = UserId(1);
  let other = UserId(2);

  assert!(registry.is_available(id_a, user));
  registry.reserve(id_a, user).expect("first reservation should succeed");
  assert!(registry.begin_use(id_a, user));

  // The opposing half of the mutex is now blocked while `id_a` has an
  // active user.
  assert!(!registry.is_available(id_b, other));
  assert!(registry.reserve(id_b, other).is_err());

  registry.end_use(id_a, user);
  registry.release(id_a, user);

  // Once `id_a` drains its users, `id_b` may take over.
  assert!(registry.is_available(id_b, other));
  registry.reserve(id_b, other).expect("should succeed once mutex drains");
}

#[test]
fn a_bare_reservation_blocks_the_opposing_pack_before_begin_use() {
  let mut registry = ActionPackRegistry::new(16, 4);
  let mutex_id = registry.create_mutex(2);

  let mut pack_a = ActionPack::new("a_to_b", Transform::default(), Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
  pack_a.mutex_id = Some(mutex_id);
  let mut pack_b = ActionPack::new("b_to_a", Transform::default(), Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
  pack_b.mutex_id = Some(mutex_id);

  let id_a = registry.login(pack_a).unwrap();
  let id_b = registry.login(pack_b).unwrap();

  let p1 = UserId(1);
  let p2 = UserId(2);

  // P1 only reserves `a_to_b` — never calls `begin_use`.
  registry.reserve(id_a, p1).expect("reservation should succeed");

  // `b_to_a` must already be unavailable: a reservation holds the slot even
  // without an active user.
  assert!(!registry.is_available(id_b, p2));
  assert!(registry.reserve(id_b, p2).is_err());

  registry.release(id_a, p1);
  assert!(registry.is_available(id_b, p2));
}

#[test]
fn find_by_type_in_radius_filters_by_mask_and_distance() {
  let mut registry = ActionPackRegistry::new(16, 4);
  let mut near = ActionPack::new("near", Transform::default(), Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
  near.skill_mask = 0b01;
  let mut far = ActionPack::new("far", Transform::default(), Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);
  far.skill_mask = 0b01;
  let mut wrong_type = ActionPack::new("wrong_type", Transform::default(), Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
  wrong_type.skill_mask = 0b10;

  let id_near = registry.login(near).unwrap();
  registry.login(far).unwrap();
  registry.login(wrong_type).unwrap();

  let found = registry.find_by_type_in_radius(0b01, Vec3::ZERO, 5.0);
  assert_eq!(found, vec![id_near]);
}
