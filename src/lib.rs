#![doc = include_str!("../README.md")]

mod action_pack;
mod astar;
mod config;
mod coords;
mod error;
mod geometry;
mod nav_mesh;
mod path_builder;
mod path_node_graph;
mod radial;
mod request_manager;
mod search;
mod util;

use glam::Vec3;

pub use action_pack::{
  ActionPack, ActionPackId, ActionPackMutexId, ActionPackMutexState,
  ActionPackObservers, ActionPackRegistry, PolyLocator, UserId,
};
pub use config::NavCoreConfig;
pub use coords::{CoordinateSystem, XYZ};
pub use error::{ActionPackError, BuildError, GraphError, RequestError, SearchError};
pub use nav_mesh::{NavMeshSource, PolyEdge, ProbeResult, SubPolygon, ValidatedNavMesh};
pub use path_builder::{
  BuildPathParams, ClearanceProbe, CostFn, DistanceCost, LegKind, NavPortal,
  PathWaypoints, SmoothingMode, StraightPathStep,
};
pub use path_node_graph::{
  LinkIdPub, LinkKind, LinkView, MeshId, NavManagerId, NodeId, PathNode,
  PathNodeGraph, PathNodeKind,
};
pub use radial::ObstacleEdge;
pub use request_manager::{Priority, RequestId, RequestKind, RequestManager, SearchOutcomeSnapshot};
pub use search::{CostMode, NavNodeKey, PathFindParams, PlayerBlockageCost, SearchOutcome, SearchPoint};
pub use util::{BoundingBox, Transform};

/// The navigation core facade: owns the path-node graph (C1), the
/// action-pack registry (C2), and the path request manager (C6), threading
/// a single [`NavCoreConfig`] through all three. `CS` is the host's own
/// coordinate system (spec.md §1's "external collaborators" boundary); all
/// positions crossing this facade are converted to/from the crate's
/// standard [`XYZ`] space at the edge, exactly as the teacher's
/// `Archipelago<CS>` converts at its own boundary.
pub struct NavCore<CS: CoordinateSystem> {
  config: NavCoreConfig,
  graph: PathNodeGraph,
  action_packs: ActionPackRegistry,
  requests: RequestManager,
  _coords: std::marker::PhantomData<CS>,
}

impl<CS: CoordinateSystem> NavCore<CS> {
  pub fn new(config: NavCoreConfig) -> Self {
    let graph = PathNodeGraph::new(config.max_nodes, config.max_links);
    let action_packs = ActionPackRegistry::new(config.max_registrations_per_tick, config.max_path_nodes_per_side);
    let requests = RequestManager::new(config.high_priority_hz, config.normal_priority_hz, config.low_priority_hz);
    Self { config, graph, action_packs, requests, _coords: std::marker::PhantomData }
  }

  pub fn config(&self) -> &NavCoreConfig {
    &self.config
  }

  pub fn graph(&self) -> &PathNodeGraph {
    &self.graph
  }

  pub fn graph_mut(&mut self) -> &mut PathNodeGraph {
    &mut self.graph
  }

  pub fn action_packs(&self) -> &ActionPackRegistry {
    &self.action_packs
  }

  pub fn action_packs_mut(&mut self) -> &mut ActionPackRegistry {
    &mut self.action_packs
  }

  pub fn requests(&self) -> &RequestManager {
    &self.requests
  }

  /// Registers a mesh's polygons into the path-node graph, returning the
  /// allocated node per polygon (same order as the mesh's own polygon
  /// indices).
  pub fn add_mesh(&mut self, mesh_id: MeshId, mesh: &dyn NavMeshSource) -> Result<Vec<NodeId>, GraphError> {
    self.graph.add_mesh(mesh_id, mesh)
  }

  pub fn remove_mesh(&mut self, mesh_id: MeshId) {
    self.graph.remove_mesh(mesh_id);
  }

  /// One tick of the whole core: drains the action-pack registry's pending
  /// login/logout queue (C2), then services one path request (C6).
  /// `now` is the caller's own clock in seconds — `navcore` has no wall
  /// clock of its own, matching the teacher's explicit `delta_time`
  /// parameter on `Archipelago::update`. `locator` bridges C2's
  /// registration step to a position->node lookup (supplied by the host,
  /// since the navmesh library itself is out of scope, spec.md §1);
  /// `owner_alive` lets a `dynamic` pack auto-log-out when its owner
  /// process has died (spec.md §3 `ActionPack` "Lifecycle").
  pub fn update(&mut self, now: f32, locator: &dyn PolyLocator, owner_alive: &dyn Fn(UserId) -> bool) -> Result<(), SearchError> {
    self.action_packs.update(&mut self.graph, locator, owner_alive);
    self.requests.update(&self.graph, now)?;
    Ok(())
  }

  /// Converts a host-space point into the crate's standard coordinate
  /// space, for callers building [`SearchPoint`]s or [`ActionPack`]s from
  /// their own coordinate system.
  pub fn to_standard(point: &CS::Coordinate) -> Vec3 {
    CS::to_standard(point)
  }

  /// Converts a standard-space point back into the host's coordinate
  /// system, for callers reading back a built [`PathWaypoints`].
  pub fn from_standard(point: &Vec3) -> CS::Coordinate {
    CS::from_standard(point)
  }

  /// Runs dev-mode structural validation over the graph and registry, per
  /// [`NavCoreConfig::validate_graph`] (spec.md §4.1 "Validation").
  pub fn debug_validate(&mut self) -> Result<(), String> {
    if !self.config.validate_graph {
      return Ok(());
    }
    self.graph.update(true)?;
    self.action_packs.debug_check_for_corruption(&self.graph)
  }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
