//! C4 — the Path Builder: turns a visited-node table produced by C3 into a
//! smoothed [`PathWaypoints`] sequence. Pipeline stages mirror
//! `examples/original_source/nd-backup/gameplay/nav/nav-path-build.cpp`'s
//! gather/prune/validate/depenetrate/portal-construct/smooth/reverse/
//! radial-expand/finalize-probe/truncate/post-process staging; the funnel
//! math in the "Full" smoothing mode is reimplemented here from the
//! teacher's `crates/landmass/src/path.rs::find_next_point_in_straight_path`
//! (kept as an inert reference file on disk, not compiled) rather than
//! reusing its Island-based types, which don't exist in this graph model.

use glam::Vec3;

use crate::error::BuildError;
use crate::path_node_graph::{LinkKind, NodeId, PathNodeGraph};
use crate::radial;

/// How aggressively consecutive nodes are smoothed into straight legs
/// (spec.md §4.4 step 6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmoothingMode {
  /// Waypoints are the raw node positions plus the true goal.
  None,
  /// Single-pass M-between-P-and-Q funnel, O(N), commits a waypoint only
  /// when forced by an edge the line of sight can't clear.
  Approximate,
  /// Standard portal funnel with a tracked left/right frustum.
  Full,
}

/// The kind of leg between two consecutive waypoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegKind {
  Ground,
  ActionPack,
}

/// One step of a built path.
#[derive(Clone, Copy, Debug)]
pub struct StraightPathStep {
  pub position_ps: Vec3,
  pub node: Option<NodeId>,
}

/// Output of the path builder (spec.md §3 `PathWaypoints`).
#[derive(Clone, Debug, Default)]
pub struct PathWaypoints {
  pub steps: Vec<StraightPathStep>,
  pub leg_kinds: Vec<LegKind>,
  pub length: f32,
  pub combat_vector_cost: f32,
  pub initial_direction: Option<Vec3>,
  pub final_direction: Option<Vec3>,
  pub tap_used: bool,
}

impl PathWaypoints {
  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

/// Portal between two consecutive nodes on the raw path (spec.md §4.4 step
/// 5). `left`/`right` are in parent space; a singular portal has
/// `left == right`.
#[derive(Clone, Copy, Debug)]
pub struct NavPortal {
  pub left: Vec3,
  pub right: Vec3,
  pub singular: bool,
}

/// Per-segment combat-vector weighting (spec.md §4.4 closing paragraph).
/// Supplied by the caller; `navcore` has no notion of "the combat vector"
/// itself (that lives in the excluded character-controller layer).
pub trait CostFn {
  /// Weight applied to `segment_length` when walking `from -> to` over
  /// `link`. `1.0` is neutral; the original's `CostFuncCombatVector`
  /// penalizes motion against the combat vector, and
  /// `CostFuncCombatVectorWithStealthGrass` additionally discounts
  /// stealth-grass polygons.
  fn weight(&self, from: NodeId, to: NodeId) -> f32;
}

/// Neutral cost function: every segment weighs 1.0 (`CostFuncDistance`).
pub struct DistanceCost;
impl CostFn for DistanceCost {
  fn weight(&self, _from: NodeId, _to: NodeId) -> f32 {
    1.0
  }
}

/// Parameters threaded through the build pipeline (spec.md §4.4, §6;
/// SPEC_FULL.md §4.4 supplement).
pub struct BuildPathParams<'a> {
  pub smoothing: SmoothingMode,
  pub agent_radius: f32,
  pub reverse: bool,
  /// Up to 8 polygons biased toward during finalize-probe (`m_preferredPolys`).
  pub preferred_polys: &'a [NodeId],
  /// Stop after the Nth action pack, if any (spec.md §4.4 step 10).
  pub truncate_after_nth_pack: Option<u32>,
  pub cost_fn: &'a dyn CostFn,
}

impl<'a> BuildPathParams<'a> {
  pub fn new(cost_fn: &'a dyn CostFn) -> Self {
    Self {
      smoothing: SmoothingMode::Full,
      agent_radius: 0.0,
      reverse: false,
      preferred_polys: &[],
      truncate_after_nth_pack: None,
      cost_fn,
    }
  }
}

/// Step 1: gather. The caller already has the raw node chain from C3 (a
/// search's `node_path`); this just validates it's non-empty.
fn gather(node_path: &[NodeId]) -> Result<Vec<NodeId>, BuildError> {
  if node_path.is_empty() {
    return Err(BuildError::GoalNotVisited);
  }
  Ok(node_path.to_vec())
}

/// Step 2: prune. Drop a node if it's collinear with its neighbours in the
/// graph sense — here, if it's an `ActionPackExit` immediately followed by
/// a node belonging to the same mesh as the node after it (spec.md §4.4
/// step 2's "ap-exit immediately followed by a node on the same mesh").
fn prune(graph: &PathNodeGraph, path: Vec<NodeId>) -> Vec<NodeId> {
  use crate::path_node_graph::PathNodeKind;
  let mut out = Vec::with_capacity(path.len());
  for (i, &node) in path.iter().enumerate() {
    if i > 0 {
      if let Some(prev_node) = graph.node(path[i - 1]) {
        if matches!(prev_node.kind, PathNodeKind::ActionPackExit { .. }) {
          if let (Some(cur), Some(next)) = (graph.node(node), path.get(i + 1).and_then(|&n| graph.node(n))) {
            if same_mesh(&cur.kind, &next.kind) {
              continue;
            }
          }
        }
      }
    }
    out.push(node);
  }
  out
}

fn same_mesh(a: &crate::path_node_graph::PathNodeKind, b: &crate::path_node_graph::PathNodeKind) -> bool {
  use crate::path_node_graph::PathNodeKind::*;
  match (a, b) {
    (Poly { mgr_id: m1 }, Poly { mgr_id: m2 }) => m1.mesh_id == m2.mesh_id,
    (PolyEx { mgr_id: m1, .. }, PolyEx { mgr_id: m2, .. }) => m1.mesh_id == m2.mesh_id,
    _ => false,
  }
}

/// Step 3: validate. Every node handle in the path must still resolve.
fn validate(graph: &PathNodeGraph, path: &[NodeId]) -> Result<(), BuildError> {
  for &node in path {
    if graph.node(node).is_none() {
      return Err(BuildError::DanglingNode);
    }
  }
  Ok(())
}

/// Step 4: depenetrate action-pack nodes. A full projection back onto the
/// navmesh by the agent's radius needs the navmesh library's point-in-poly
/// query, which is out of scope (spec.md §1); this clamps to the node's
/// own recorded position, which is already on a legal poly or AP anchor,
/// leaving the hook for a host-supplied probe to refine later via
/// finalize-probes (step 9).
fn depenetrate(graph: &PathNodeGraph, path: &[NodeId]) -> Vec<Vec3> {
  path.iter().map(|&n| graph.node(n).map(|node| node.position_ps).unwrap_or(Vec3::ZERO)).collect()
}

/// Step 5: portal construction. For each consecutive pair, find the link
/// between them (if any) and build its [`NavPortal`]; falls back to a
/// singular (degenerate) portal at the destination position if no edge
/// link carries portal geometry (e.g. entering an action pack).
fn build_portals(graph: &PathNodeGraph, path: &[NodeId]) -> Vec<NavPortal> {
  let mut portals = Vec::with_capacity(path.len().saturating_sub(1));
  for pair in path.windows(2) {
    let (from, to) = (pair[0], pair[1]);
    let link = graph.outgoing_links(from).find(|l| l.dest == to);
    match link {
      Some(l) if l.kind != LinkKind::Incoming => {
        let singular = l.portal.0.distance_squared(l.portal.1) < 1e-10;
        portals.push(NavPortal { left: l.portal.0, right: l.portal.1, singular });
      }
      _ => {
        let pos = graph.node(to).map(|n| n.position_ps).unwrap_or(Vec3::ZERO);
        portals.push(NavPortal { left: pos, right: pos, singular: true });
      }
    }
  }
  portals
}

fn triangle_area_2(a: Vec3, b: Vec3, c: Vec3) -> f32 {
  (b.x - a.x) * (c.z - a.z) - (c.x - a.x) * (b.z - a.z)
}

/// Step 6, smoothing mode "None": waypoints are the raw node positions
/// plus the true goal.
fn smooth_none(positions: &[Vec3], nodes: &[NodeId]) -> Vec<StraightPathStep> {
  positions
    .iter()
    .zip(nodes.iter())
    .map(|(&p, &n)| StraightPathStep { position_ps: p, node: Some(n) })
    .collect()
}

/// Step 6, smoothing mode "Approximate": a single-pass funnel that only
/// commits a waypoint when the straight line from the last commit would
/// cross outside the current portal.
fn smooth_approximate(positions: &[Vec3], portals: &[NavPortal], nodes: &[NodeId]) -> Vec<StraightPathStep> {
  if positions.is_empty() {
    return Vec::new();
  }
  let mut out = vec![StraightPathStep { position_ps: positions[0], node: Some(nodes[0]) }];
  let mut apex = positions[0];
  for (i, portal) in portals.iter().enumerate() {
    if portal.singular {
      out.push(StraightPathStep { position_ps: portal.left, node: Some(nodes[i + 1]) });
      apex = portal.left;
      continue;
    }
    let to_left = portal.left - apex;
    let to_right = portal.right - apex;
    if triangle_area_2(apex, to_left + apex, to_right + apex).abs() < 1e-8 {
      continue;
    }
    let next_pos = positions.get(i + 1).copied().unwrap_or(portal.left);
    let crosses_left = triangle_area_2(apex, portal.left, next_pos) < 0.0;
    let crosses_right = triangle_area_2(apex, portal.right, next_pos) > 0.0;
    if crosses_left || crosses_right {
      let commit = if crosses_left { portal.left } else { portal.right };
      out.push(StraightPathStep { position_ps: commit, node: Some(nodes[i + 1]) });
      apex = commit;
    }
  }
  if let Some(&last) = positions.last() {
    if out.last().map(|s| s.position_ps) != Some(last) {
      out.push(StraightPathStep { position_ps: last, node: nodes.last().copied() });
    }
  }
  out
}

/// Step 6, smoothing mode "Full": the standard portal funnel. `frustum[0]`
/// is the right edge, `frustum[1]` the left edge, tracked unnormalized,
/// grounded in the teacher's `find_next_point_in_straight_path`.
fn smooth_full(positions: &[Vec3], portals: &[NavPortal], nodes: &[NodeId]) -> Vec<StraightPathStep> {
  if positions.is_empty() {
    return Vec::new();
  }
  let mut out = Vec::new();
  let mut apex = positions[0];
  let mut apex_node = Some(nodes[0]);
  out.push(StraightPathStep { position_ps: apex, node: apex_node });

  let mut right = portals.first().map(|p| p.right - apex).unwrap_or(Vec3::ZERO);
  let mut left = portals.first().map(|p| p.left - apex).unwrap_or(Vec3::ZERO);
  let mut right_index = 0usize;
  let mut left_index = 0usize;

  let mut i = 1usize;
  while i < portals.len() {
    let portal = &portals[i];
    if portal.singular {
      out.push(StraightPathStep { position_ps: portal.left, node: Some(nodes[i + 1]) });
      apex = portal.left;
      apex_node = Some(nodes[i + 1]);
      right = portals.get(i + 1).map(|p| p.right - apex).unwrap_or(Vec3::ZERO);
      left = portals.get(i + 1).map(|p| p.left - apex).unwrap_or(Vec3::ZERO);
      right_index = i + 1;
      left_index = i + 1;
      i += 2;
      continue;
    }

    let new_right = portal.right - apex;
    let new_left = portal.left - apex;

    if triangle_area_2(Vec3::ZERO, right, new_right) <= 0.0 {
      if triangle_area_2(Vec3::ZERO, left, new_right) >= 0.0 {
        right = new_right;
        right_index = i;
      } else {
        out.push(StraightPathStep { position_ps: apex + left, node: Some(nodes[left_index + 1]) });
        apex += left;
        apex_node = Some(nodes[left_index + 1]);
        i = left_index;
        right = portals.get(i + 1).map(|p| p.right - apex).unwrap_or(Vec3::ZERO);
        left = portals.get(i + 1).map(|p| p.left - apex).unwrap_or(Vec3::ZERO);
        right_index = i + 1;
        left_index = i + 1;
        i += 1;
        continue;
      }
    }

    if triangle_area_2(Vec3::ZERO, left, new_left) >= 0.0 {
      if triangle_area_2(Vec3::ZERO, right, new_left) <= 0.0 {
        left = new_left;
        left_index = i;
      } else {
        out.push(StraightPathStep { position_ps: apex + right, node: Some(nodes[right_index + 1]) });
        apex += right;
        apex_node = Some(nodes[right_index + 1]);
        i = right_index;
        right = portals.get(i + 1).map(|p| p.right - apex).unwrap_or(Vec3::ZERO);
        left = portals.get(i + 1).map(|p| p.left - apex).unwrap_or(Vec3::ZERO);
        right_index = i + 1;
        left_index = i + 1;
        i += 1;
        continue;
      }
    }
    i += 1;
  }

  if let Some(&goal) = positions.last() {
    if out.last().map(|s| s.position_ps) != Some(goal) {
      out.push(StraightPathStep { position_ps: goal, node: nodes.last().copied() });
    }
  }
  let _ = apex_node;
  out
}

/// Step 9: finalize probes. Greedily try to collapse `steps[i..j]` into a
/// single straight leg. `probe` is a host-supplied radius-aware
/// line-of-sight test against the navmesh library (out of scope for
/// `navcore` itself, spec.md §1); without a probe this step is a no-op.
pub trait ClearanceProbe {
  fn is_clear(&self, from: Vec3, to: Vec3, radius: f32) -> bool;
}

fn finalize_probes(steps: Vec<StraightPathStep>, radius: f32, probe: Option<&dyn ClearanceProbe>, min_dist: f32, max_dist: f32) -> Vec<StraightPathStep> {
  let Some(probe) = probe else { return steps };
  if steps.len() < 3 {
    return steps;
  }
  let mut out = vec![steps[0]];
  let mut i = 0usize;
  while i < steps.len() - 1 {
    let mut j = i + 1;
    while j + 1 < steps.len() {
      let candidate = steps[j + 1];
      let dist = out.last().unwrap().position_ps.distance(candidate.position_ps);
      if dist < min_dist || dist > max_dist {
        break;
      }
      if probe.is_clear(out.last().unwrap().position_ps, candidate.position_ps, radius) {
        j += 1;
      } else {
        break;
      }
    }
    out.push(steps[j]);
    i = j;
  }
  out
}

/// Step 10: truncation. Stop after the Nth action-pack leg.
fn truncate(steps: Vec<StraightPathStep>, leg_kinds: Vec<LegKind>, after_nth_pack: Option<u32>) -> (Vec<StraightPathStep>, Vec<LegKind>) {
  let Some(n) = after_nth_pack else { return (steps, leg_kinds) };
  let mut packs_seen = 0u32;
  for (i, kind) in leg_kinds.iter().enumerate() {
    if *kind == LegKind::ActionPack {
      packs_seen += 1;
      if packs_seen == n.max(1) {
        return (steps[..=i + 1].to_vec(), leg_kinds[..=i].to_vec());
      }
    }
  }
  (steps, leg_kinds)
}

fn classify_legs(graph: &PathNodeGraph, nodes: &[NodeId]) -> Vec<LegKind> {
  use crate::path_node_graph::PathNodeKind;
  nodes
    .windows(2)
    .map(|pair| match graph.node(pair[0]).map(|n| n.kind) {
      Some(PathNodeKind::ActionPackEnter { .. }) | Some(PathNodeKind::ActionPackExit { .. }) => LegKind::ActionPack,
      _ => LegKind::Ground,
    })
    .collect()
}

/// Step 11: post-processing metrics (length, combat-vector cost, initial
/// and final direction; threat/friend-distance and exposure are omitted —
/// they depend on character-controller state outside `navcore`'s scope).
fn post_process(steps: &[StraightPathStep], nodes: &[NodeId], cost_fn: &dyn CostFn) -> (f32, f32, Option<Vec3>, Option<Vec3>) {
  let mut length = 0.0;
  let mut cost = 0.0;
  for (i, pair) in steps.windows(2).enumerate() {
    let seg_len = pair[0].position_ps.distance(pair[1].position_ps);
    length += seg_len;
    if let (Some(&from), Some(&to)) = (nodes.get(i), nodes.get(i + 1)) {
      cost += cost_fn.weight(from, to) * seg_len;
    }
  }
  let initial_direction = steps.get(1).map(|s1| (s1.position_ps - steps[0].position_ps).normalize_or_zero());
  let final_direction = if steps.len() >= 2 {
    let last = steps.len() - 1;
    Some((steps[last].position_ps - steps[last - 1].position_ps).normalize_or_zero())
  } else {
    None
  };
  (length, cost, initial_direction, final_direction)
}

/// Runs the full C4 pipeline over a raw node chain from C3, producing a
/// smoothed [`PathWaypoints`].
pub fn build_path(
  graph: &PathNodeGraph,
  node_path: &[NodeId],
  params: &BuildPathParams,
  obstacle_edges: &[radial::ObstacleEdge],
  probe: Option<&dyn ClearanceProbe>,
) -> Result<PathWaypoints, BuildError> {
  let gathered = gather(node_path)?;
  let pruned = prune(graph, gathered);
  validate(graph, &pruned)?;
  let positions = depenetrate(graph, &pruned);
  let portals = build_portals(graph, &pruned);

  let mut steps = match params.smoothing {
    SmoothingMode::None => smooth_none(&positions, &pruned),
    SmoothingMode::Approximate => smooth_approximate(&positions, &portals, &pruned),
    SmoothingMode::Full => smooth_full(&positions, &portals, &pruned),
  };

  if params.reverse {
    steps.reverse();
  }

  if params.agent_radius > f32::EPSILON && !obstacle_edges.is_empty() {
    steps = radial::push_path(steps, obstacle_edges, params.agent_radius);
  }

  steps = finalize_probes(steps, params.agent_radius, probe, 0.1, 8.0);

  let mut leg_kinds = classify_legs(graph, &pruned);
  if leg_kinds.len() + 1 < steps.len() {
    leg_kinds.resize(steps.len().saturating_sub(1), LegKind::Ground);
  }
  let (steps, leg_kinds) = truncate(steps, leg_kinds, params.truncate_after_nth_pack);

  let (length, combat_vector_cost, initial_direction, final_direction) = post_process(&steps, &pruned, params.cost_fn);
  let tap_used = leg_kinds.iter().any(|k| *k == LegKind::ActionPack);

  Ok(PathWaypoints { steps, leg_kinds, length, combat_vector_cost, initial_direction, final_direction, tap_used })
}

#[cfg(test)]
#[path = "path_builder_test.rs"]
mod test;
