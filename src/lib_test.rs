use glam::Vec3;

use super::*;

struct AlwaysAliveLocator;
impl PolyLocator for AlwaysAliveLocator {
  fn locate(&self, _pos_ps: Vec3) -> Option<NodeId> {
    None
  }
}

fn always_alive(_user: UserId) -> bool {
  true
}

fn two_poly_mesh() -> (MeshId, ValidatedNavMesh) {
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
  let mut ids: slotmap::SlotMap<MeshId, ()> = slotmap::SlotMap::with_key();
  let mesh_id = ids.insert(());
  (mesh_id, ValidatedNavMesh::new(polys, Transform::default()))
}

#[test]
fn add_mesh_then_search_then_build_a_path() {
  let mut core = NavCore::<XYZ>::new(NavCoreConfig::default());
  let (mesh_id, mesh) = two_poly_mesh();
  let nodes = core.add_mesh(mesh_id, &mesh).unwrap();

  let params = PathFindParams {
    starts: vec![SearchPoint { node: nodes[0], position_ps: core.graph().node(nodes[0]).unwrap().position_ps }],
    goals: vec![SearchPoint { node: nodes[1], position_ps: core.graph().node(nodes[1]).unwrap().position_ps }],
    ..Default::default()
  };
  let handle = core.requests().add_static_request("goto", UserId(1), params, false, true);

  core.update(0.0, &AlwaysAliveLocator, &always_alive).unwrap();
  core.requests().flip_buffers();

  let results = core.requests().get_results(handle).unwrap().unwrap();
  assert_eq!(results.goal_nodes, vec![nodes[1]]);

  let cost_fn = DistanceCost;
  let build_params = BuildPathParams::new(&cost_fn);
  let waypoints = core.requests().build_path(handle, core.graph(), &build_params, &[]).unwrap();
  assert!(!waypoints.is_empty());
}

#[test]
fn debug_validate_is_a_noop_when_disabled() {
  let mut config = NavCoreConfig::default();
  config.validate_graph = false;
  let mut core = NavCore::<XYZ>::new(config);
  assert!(core.debug_validate().is_ok());
}

#[test]
fn coordinate_round_trip_is_identity_for_xyz() {
  let p = Vec3::new(1.0, 2.0, 3.0);
  let standard = NavCore::<XYZ>::to_standard(&p);
  assert_eq!(standard, p);
  assert_eq!(NavCore::<XYZ>::from_standard(&standard), p);
}
