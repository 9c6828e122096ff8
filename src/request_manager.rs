//! C6 — the Path Request Manager: the public surface a host engine drives.
//! Stores per-request params and double-buffered results, schedules one A*
//! per tick by a priority/age score, and caches undirected-search results on
//! request. Grounded in `examples/original_source/nd-backup/gameplay/nav/
//! pathfind-manager.cpp`'s `Update`/`ProcessRequest`/`ProcessCacheRequest`/
//! `FlipRequestDoubleBuffers`/`GetResults`/`BuildPath`/`CanPathTo`/
//! `GetApproxPathDistance`/`RemoveRequest`/`UpdateRequest`.

use std::collections::VecDeque;

use glam::Vec3;
use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::{
  action_pack::{ActionPackId, UserId},
  error::{BuildError, RequestError, SearchError},
  path_builder::{self, BuildPathParams, PathWaypoints},
  path_node_graph::{NodeId, PathNodeGraph},
  radial::ObstacleEdge,
  search::{self, PathFindParams, SearchOutcome},
};

new_key_type! {
  /// A live request's stable id, handed back to the caller on
  /// `add_*_request`.
  pub struct RequestId;
}

/// Service-rate tier (`PathfindRequestPriority` in the original). The
/// concrete Hz values live in [`crate::config::NavCoreConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
  High,
  Normal,
  Low,
}

/// What kind of search a request runs (spec.md §4.6 "Public surface").
pub enum RequestKind {
  /// A* to a fixed goal set.
  Static,
  /// A* until a target distance is reached, not a geographic goal
  /// (`add_distance_request`). Serviced the same way as [`Self::Static`] —
  /// the early-stop-at-distance variant of the search itself isn't
  /// exposed by C3's `find_single_path`, so this currently runs to the
  /// same completion a static search would and relies on the caller to
  /// read `target_distance` back out against the built path's length.
  Distance { target_distance: f32 },
  /// Undirected Dijkstra, settling every requested goal.
  Undirected,
  /// Snapshots another undirected request's latest results on each service
  /// tick, rather than running its own search.
  Cache { source: RequestId },
}

struct ResultSlots {
  slots: [Option<SearchOutcome>; 2],
  current: usize,
  pending: Option<usize>,
}

impl ResultSlots {
  fn new() -> Self {
    Self { slots: [None, None], current: 0, pending: None }
  }

  fn inactive_slot(&self) -> usize {
    (self.current + 1) % 2
  }

  /// Writer fills the inactive slot and marks it pending; the swap to
  /// `current` only happens on [`RequestManager::flip_buffers`] (spec.md
  /// §4.6 "Double buffering").
  fn publish(&mut self, outcome: SearchOutcome) {
    let slot = self.inactive_slot();
    self.slots[slot] = Some(outcome);
    self.pending = Some(slot);
  }

  fn flip(&mut self) {
    if let Some(slot) = self.pending.take() {
      self.current = slot;
    }
  }

  fn current(&self) -> Option<&SearchOutcome> {
    self.slots[self.current].as_ref()
  }
}

struct PathRequest {
  name: String,
  owner: UserId,
  kind: RequestKind,
  params: PathFindParams,
  ongoing: bool,
  priority: Priority,
  /// Time (seconds, caller-supplied clock) this request was last serviced.
  last_service_time: f32,
  pending_deletion: bool,
  results: ResultSlots,
}

/// The manager's public surface (spec.md §4.6). A reader/writer lock on the
/// manager plus a per-request lock (here, each slot in `requests` is itself
/// an `RwLock`) matches spec.md §5's concurrency model.
pub struct RequestManager {
  requests: RwLock<SlotMap<RequestId, RwLock<PathRequest>>>,
  pending_cache: RwLock<VecDeque<RequestId>>,
  pending_removal: RwLock<VecDeque<RequestId>>,
  high_priority_interval: f32,
  normal_priority_interval: f32,
  low_priority_interval: f32,
}

impl RequestManager {
  pub fn new(high_priority_hz: f32, normal_priority_hz: f32, low_priority_hz: f32) -> Self {
    Self {
      requests: RwLock::new(SlotMap::with_key()),
      pending_cache: RwLock::new(VecDeque::new()),
      pending_removal: RwLock::new(VecDeque::new()),
      high_priority_interval: 1.0 / high_priority_hz.max(1e-3),
      normal_priority_interval: 1.0 / normal_priority_hz.max(1e-3),
      low_priority_interval: 1.0 / low_priority_hz.max(1e-3),
    }
  }

  fn min_interval(&self, priority: Priority) -> f32 {
    match priority {
      Priority::High => self.high_priority_interval,
      Priority::Normal => self.normal_priority_interval,
      Priority::Low => self.low_priority_interval,
    }
  }

  fn add_request(&self, name: &str, owner: UserId, params: PathFindParams, ongoing: bool, priority: Priority, kind: RequestKind) -> RequestId {
    let request = PathRequest {
      name: name.to_string(),
      owner,
      kind,
      params,
      ongoing,
      priority,
      last_service_time: f32::NEG_INFINITY,
      pending_deletion: false,
      results: ResultSlots::new(),
    };
    self.requests.write().insert(RwLock::new(request))
  }

  pub fn add_static_request(&self, name: &str, owner: UserId, params: PathFindParams, ongoing: bool, high_priority: bool) -> RequestId {
    let priority = if high_priority { Priority::High } else { Priority::Normal };
    self.add_request(name, owner, params, ongoing, priority, RequestKind::Static)
  }

  pub fn add_distance_request(&self, name: &str, owner: UserId, params: PathFindParams, ongoing: bool, target_distance: f32) -> RequestId {
    self.add_request(name, owner, params, ongoing, Priority::Normal, RequestKind::Distance { target_distance })
  }

  pub fn add_undirected_request(&self, name: &str, owner: UserId, params: PathFindParams, ongoing: bool, high_priority: bool, low_priority: bool) -> RequestId {
    let priority = if high_priority {
      Priority::High
    } else if low_priority {
      Priority::Low
    } else {
      Priority::Normal
    };
    self.add_request(name, owner, params, ongoing, priority, RequestKind::Undirected)
  }

  /// `cache_request`: allocates a handle that snapshots `source`'s latest
  /// results every tick, without running its own search.
  pub fn cache_request(&self, name: &str, owner: UserId, source: RequestId) -> Result<RequestId, RequestError> {
    if !self.requests.read().contains_key(source) {
      return Err(RequestError::StaleHandle);
    }
    let id = self.add_request(name, owner, PathFindParams::default(), true, Priority::Low, RequestKind::Cache { source });
    self.pending_cache.write().push_back(id);
    Ok(id)
  }

  pub fn update_request(&self, handle: RequestId, new_params: PathFindParams) -> Result<(), RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let mut request = slot.write();
    if request.pending_deletion {
      return Err(RequestError::PendingDeletion);
    }
    request.params = new_params;
    Ok(())
  }

  /// `get_params`: round-trips the params struct by value under the
  /// per-request lock (SPEC_FULL.md §4.6 supplement).
  pub fn get_params(&self, handle: RequestId) -> Result<PathFindParams, RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let request = slot.read();
    Ok(PathFindParams {
      starts: request.params.starts.clone(),
      goals: request.params.goals.clone(),
      cost_mode: request.params.cost_mode,
      preferred: request.params.preferred.clone(),
      traversal_skill_mask: request.params.traversal_skill_mask,
      faction_mask: request.params.faction_mask,
      player_blockage_cost: request.params.player_blockage_cost,
      max_visited: request.params.max_visited,
    })
  }

  pub fn remove_request(&self, handle: RequestId) -> Result<(), RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    slot.write().pending_deletion = true;
    drop(requests);
    self.pending_removal.write().push_back(handle);
    Ok(())
  }

  /// Picks the highest-scoring non-cache, non-pending-deletion request due
  /// for service (spec.md §4.6 "Scheduling", step 1).
  fn pick_request_to_service(&self, now: f32) -> Option<RequestId> {
    let requests = self.requests.read();
    let mut best: Option<(RequestId, f32)> = None;
    for (id, slot) in requests.iter() {
      let request = slot.read();
      if request.pending_deletion || matches!(request.kind, RequestKind::Cache { .. }) {
        continue;
      }
      if !request.ongoing && request.results.current().is_some() {
        continue;
      }
      let min_interval = self.min_interval(request.priority);
      let age = now - request.last_service_time;
      if age < min_interval {
        continue;
      }
      let frequency_boost = match request.priority {
        Priority::High => 3.0,
        Priority::Normal => 2.0,
        Priority::Low => 1.0,
      };
      let score = frequency_boost * age;
      if best.map(|(_, s)| score > s).unwrap_or(true) {
        best = Some((id, score));
      }
    }
    best.map(|(id, _)| id)
  }

  /// Runs one service tick (spec.md §4.6 "Scheduling"): services at most one
  /// non-cache request, processes all pending cache snapshots, then frees
  /// requests marked for deletion. `now` is the caller's own clock — the
  /// fixed-size thread pool that would drive this off the main thread is
  /// out of scope (spec.md §1's "path find manager wrapper" exclusion;
  /// DESIGN.md Open Question (d)).
  pub fn update(&self, graph: &PathNodeGraph, now: f32) -> Result<(), SearchError> {
    if let Some(id) = self.pick_request_to_service(now) {
      let params_copy = {
        let requests = self.requests.read();
        let slot = requests.get(id).expect("id just selected from this table");
        let request = slot.read();
        PathFindParams {
          starts: request.params.starts.clone(),
          goals: request.params.goals.clone(),
          cost_mode: request.params.cost_mode,
          preferred: request.params.preferred.clone(),
          traversal_skill_mask: request.params.traversal_skill_mask,
          faction_mask: request.params.faction_mask,
          player_blockage_cost: request.params.player_blockage_cost,
          max_visited: request.params.max_visited,
        }
      };

      let kind_is_undirected = {
        let requests = self.requests.read();
        matches!(requests.get(id).unwrap().read().kind, RequestKind::Undirected)
      };
      let outcome = if kind_is_undirected {
        search::find_undirected_paths(graph, &params_copy)?
      } else {
        search::find_single_path(graph, &params_copy)?
      };

      let requests = self.requests.read();
      let slot = requests.get(id).expect("id just selected from this table");
      let mut request = slot.write();
      request.results.publish(outcome);
      request.last_service_time = now;
    }

    self.process_pending_cache_requests();
    self.free_pending_deletions();
    Ok(())
  }

  fn process_pending_cache_requests(&self) {
    let pending: Vec<RequestId> = self.pending_cache.read().iter().copied().collect();
    for id in pending {
      let snapshot = {
        let requests = self.requests.read();
        let Some(slot) = requests.get(id) else { continue };
        let RequestKind::Cache { source } = slot.read().kind else { continue };
        let Some(source_slot) = requests.get(source) else { continue };
        source_slot.read().results.current().map(|o| SearchOutcome {
          goal_nodes: o.goal_nodes.clone(),
          reached_goals: o.reached_goals.clone(),
          overflowed_closed_list: o.overflowed_closed_list,
          node_path: o.node_path.clone(),
          explored_nodes: o.explored_nodes,
        })
      };
      if let Some(outcome) = snapshot {
        let requests = self.requests.read();
        if let Some(slot) = requests.get(id) {
          slot.write().results.publish(outcome);
        }
      }
    }
  }

  fn free_pending_deletions(&self) {
    let to_remove: Vec<RequestId> = self.pending_removal.write().drain(..).collect();
    let mut requests = self.requests.write();
    for id in to_remove {
      requests.remove(id);
    }
  }

  /// `flip_buffers`: swaps every request's result slot whose new value is
  /// present, called once per frame by the caller (spec.md §4.6 "Double
  /// buffering"). Separate from [`Self::update`] so the writer thread can
  /// publish freely while the main thread controls exactly when readers see
  /// the new result.
  pub fn flip_buffers(&self) {
    for (_, slot) in self.requests.read().iter() {
      slot.write().results.flip();
    }
  }

  pub fn get_results(&self, handle: RequestId) -> Result<Option<SearchOutcomeSnapshot>, RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let request = slot.read();
    Ok(request.results.current().map(SearchOutcomeSnapshot::from))
  }

  pub fn build_path(
    &self,
    handle: RequestId,
    graph: &PathNodeGraph,
    build_params: &BuildPathParams,
    obstacle_edges: &[ObstacleEdge],
  ) -> Result<PathWaypoints, RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let request = slot.read();
    let outcome = request.results.current().ok_or(RequestError::StaleHandle)?;
    path_builder::build_path(graph, &outcome.node_path, build_params, obstacle_edges, None)
      .map_err(|_: BuildError| RequestError::StaleHandle)
  }

  /// `can_path_to`: whether the request's latest results settled `node`.
  pub fn can_path_to(&self, handle: RequestId, node: NodeId) -> Result<bool, RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let request = slot.read();
    Ok(request.results.current().map(|o| o.goal_nodes.contains(&node)).unwrap_or(false))
  }

  /// `get_approx_path_distance`: straight-line distance from `loc` to the
  /// nearest settled goal node's recorded position, for a quick distance
  /// estimate without rebuilding the full path.
  pub fn get_approx_path_distance(&self, handle: RequestId, loc: Vec3, graph: &PathNodeGraph) -> Result<Option<f32>, RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let request = slot.read();
    let Some(outcome) = request.results.current() else { return Ok(None) };
    let dist = outcome
      .goal_nodes
      .iter()
      .filter_map(|&n| graph.node(n))
      .map(|n| n.position_ps.distance(loc))
      .fold(f32::INFINITY, f32::min);
    Ok(if dist.is_finite() { Some(dist) } else { None })
  }

  /// `ApproxPathUsesTap`-style query (SPEC_FULL.md §4.6 supplement): does
  /// the request's cached path pass through the given action-pack's enter
  /// or exit node.
  pub fn uses_action_pack(&self, handle: RequestId, graph: &PathNodeGraph, pack: ActionPackId) -> Result<bool, RequestError> {
    use crate::path_node_graph::PathNodeKind;
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    let request = slot.read();
    let Some(outcome) = request.results.current() else { return Ok(false) };
    Ok(outcome.node_path.iter().any(|&n| match graph.node(n).map(|p| p.kind) {
      Some(PathNodeKind::ActionPackEnter { pack: p }) | Some(PathNodeKind::ActionPackExit { pack: p }) => p == pack,
      _ => false,
    }))
  }

  pub fn request_count(&self) -> usize {
    self.requests.read().len()
  }

  pub fn request_name(&self, handle: RequestId) -> Result<String, RequestError> {
    let requests = self.requests.read();
    let slot = requests.get(handle).ok_or(RequestError::StaleHandle)?;
    Ok(slot.read().name.clone())
  }
}

/// An owned snapshot of [`SearchOutcome`], handed back by [`RequestManager::get_results`]
/// so the caller isn't holding the manager's internal lock.
#[derive(Debug, Clone)]
pub struct SearchOutcomeSnapshot {
  pub goal_nodes: Vec<NodeId>,
  pub reached_goals: Vec<bool>,
  pub overflowed_closed_list: bool,
  pub node_path: Vec<NodeId>,
  pub explored_nodes: u32,
}

impl From<&SearchOutcome> for SearchOutcomeSnapshot {
  fn from(o: &SearchOutcome) -> Self {
    Self {
      goal_nodes: o.goal_nodes.clone(),
      reached_goals: o.reached_goals.clone(),
      overflowed_closed_list: o.overflowed_closed_list,
      node_path: o.node_path.clone(),
      explored_nodes: o.explored_nodes,
    }
  }
}

#[cfg(test)]
#[path = "request_manager_test.rs"]
mod test;
