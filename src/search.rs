//! C3 — the A* engine: wires [`crate::astar`]'s generic best-first search
//! onto the path-node graph, with multi-start/multi-goal support, a
//! should-expand filter stack, and a Dijkstra-style undirected variant for
//! distance queries. Grounded in
//! `examples/original_source/nd-backup/gameplay/nav/nav-path-find.h`.

use std::{cmp::Reverse, collections::BinaryHeap};

use glam::Vec3;

use crate::{
  astar::{self, AStarProblem},
  error::SearchError,
  path_node_graph::{LinkKind, NodeId, PathNodeGraph, PathNodeKind},
};

/// Maximum simultaneous start positions a single search may fan out from
/// (`kMaxStartPositions` in the original source).
pub const MAX_START_POSITIONS: usize = 4;
/// Maximum goal nodes a single search may report reaching.
pub const MAX_GOALS: usize = 64;

/// Packs a path-node index and a 16-bit partition tag into one key, used by
/// C6 to recognize a previously-answered search without re-running it
/// (`NavNodeKey` in `nav-node-table.h`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NavNodeKey(u32);

impl NavNodeKey {
  pub fn new(node: NodeId, partition: u16) -> Self {
    debug_assert!(node.0 <= u16::MAX as u32, "node index does not fit in a NavNodeKey");
    Self(((node.0 & 0xffff) << 16) | partition as u32)
  }

  pub fn node_index(self) -> u16 {
    (self.0 >> 16) as u16
  }

  pub fn partition(self) -> u16 {
    (self.0 & 0xffff) as u16
  }
}

/// How aggressively the heuristic steers expansion (`PathFindParams::CostMode`
/// in the original). The original names referred to the *open-list data
/// structure* the search ran over (linear-scan vs. a hashed Robin Hood open
/// list vs. a size-switching hybrid) — this search only ever uses a binary
/// heap (see [`astar`]), so that axis doesn't exist here. The variant names
/// are kept (so a reader moving between the original tool and this one
/// recognizes the knob), but they're now a pure heuristic-weight dial:
/// `Exhaustive` disables the heuristic outright, trading speed for a
/// guaranteed-optimal exhaustive search; `Balanced` only partly trusts it;
/// `Greedy` is the normal, fully-trusting case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostMode {
  /// No heuristic guidance — exhaustive, cost-optimal, slowest.
  Exhaustive,
  /// Heuristic fully trusted (weight 1.0) — fastest, still admissible here
  /// since the heuristic itself never overestimates.
  Greedy,
  /// Heuristic half-trusted (weight 0.5) — a middle ground.
  Balanced,
}

impl CostMode {
  fn heuristic_weight(self) -> f32 {
    match self {
      CostMode::Exhaustive => 0.0,
      CostMode::Greedy => 1.0,
      CostMode::Balanced => 0.5,
    }
  }
}

/// How a link's traversal cost is affected by player presence
/// (`PlayerBlockageCost` in the original).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerBlockageCost {
  Free,
  Cheap,
  Expensive,
  Impassable,
}

impl PlayerBlockageCost {
  fn multiplier(self) -> Option<f32> {
    match self {
      PlayerBlockageCost::Free => Some(1.0),
      PlayerBlockageCost::Cheap => Some(1.5),
      PlayerBlockageCost::Expensive => Some(8.0),
      PlayerBlockageCost::Impassable => None,
    }
  }
}

/// A single search origin or destination.
#[derive(Clone, Copy, Debug)]
pub struct SearchPoint {
  pub node: NodeId,
  pub position_ps: Vec3,
}

/// Parameters common to both a single-target and an undirected search
/// (`PathFindParams` in the original).
pub struct PathFindParams {
  pub starts: Vec<SearchPoint>,
  pub goals: Vec<SearchPoint>,
  pub cost_mode: CostMode,
  pub preferred: Vec<NodeId>,
  pub traversal_skill_mask: u32,
  pub faction_mask: u32,
  pub player_blockage_cost: PlayerBlockageCost,
  /// Nodes visited beyond this count still complete the search, but flag
  /// [`SearchOutcome::overflowed_closed_list`] (spec.md §7: reported
  /// non-fatally, not as an `Err`).
  pub max_visited: u32,
}

impl Default for PathFindParams {
  fn default() -> Self {
    Self {
      starts: Vec::new(),
      goals: Vec::new(),
      cost_mode: CostMode::Greedy,
      preferred: Vec::new(),
      traversal_skill_mask: u32::MAX,
      faction_mask: u32::MAX,
      player_blockage_cost: PlayerBlockageCost::Free,
      max_visited: 2048,
    }
  }
}

/// The result of a search (`PathFindResults` in the original).
#[derive(Debug, Default)]
pub struct SearchOutcome {
  /// The goal(s) actually reached, in the order they were settled.
  pub goal_nodes: Vec<NodeId>,
  /// Per requested goal, whether it was reached.
  pub reached_goals: Vec<bool>,
  /// `true` if the search explored more nodes than `max_visited` — the
  /// result is still complete and usable, this is purely informational.
  pub overflowed_closed_list: bool,
  /// The recovered node path to the best (lowest-cost) reached goal, for a
  /// single-target search. Empty for an undirected search.
  pub node_path: Vec<NodeId>,
  pub explored_nodes: u32,
}

#[derive(Clone, Eq, PartialEq, Hash)]
enum SearchState {
  Root,
  Node(NavNodeKey),
}

#[derive(Clone)]
struct Step {
  to: NodeId,
}

/// Derives the partition-id component of a node's [`NavNodeKey`] (spec.md
/// §4.3 "Partitioning"). A [`PathNodeKind::PolyEx`] sub-poly is a gap carved
/// out of a base polygon by a blocker (spec.md glossary); its `shadows`
/// field already names which base node it's a gap of, so it doubles as the
/// "nearby gap hash" the key wants — two different gaps over the same base
/// polygon get different partitions and are never folded into one search
/// state, even if a future graph edit ever reused a node slot across them.
/// Every other node kind isn't gap-carved, so it only ever has partition 0.
fn partition_of(kind: PathNodeKind) -> u16 {
  match kind {
    PathNodeKind::PolyEx { shadows, .. } => {
      (shadows.0 ^ (shadows.0 >> 16)) as u16
    }
    PathNodeKind::Poly { .. }
    | PathNodeKind::ActionPackEnter { .. }
    | PathNodeKind::ActionPackExit { .. } => 0,
  }
}

/// A bare `f32` ordering wrapper for the open-list heap below, following the
/// same "unwrap `partial_cmp`" idiom `astar.rs`'s `NodeRef` uses for its own
/// non-`Ord` cost field.
#[derive(Clone, Copy, PartialEq)]
struct Cost(f32);

impl Eq for Cost {}

impl PartialOrd for Cost {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    self.0.partial_cmp(&other.0)
  }
}

impl Ord for Cost {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.partial_cmp(other).unwrap()
  }
}

struct GraphSearchProblem<'a> {
  graph: &'a PathNodeGraph,
  params: &'a PathFindParams,
}

impl<'a> AStarProblem for GraphSearchProblem<'a> {
  type ActionType = Step;
  type StateType = SearchState;

  fn initial_state(&self) -> Self::StateType {
    SearchState::Root
  }

  fn successors(&self, state: &Self::StateType) -> Vec<(f32, Self::ActionType, Self::StateType)> {
    match state {
      SearchState::Root => self
        .params
        .starts
        .iter()
        .take(MAX_START_POSITIONS)
        .filter_map(|start| {
          let kind = self.graph.node(start.node)?.kind;
          let key = NavNodeKey::new(start.node, partition_of(kind));
          Some((0.0, Step { to: start.node }, SearchState::Node(key)))
        })
        .collect(),
      SearchState::Node(key) => {
        let node = NodeId(key.node_index() as u32);
        let Some(from) = self.graph.node(node) else { return Vec::new() };
        self
          .graph
          .outgoing_links(node)
          .filter(|link| link.kind != LinkKind::Incoming)
          .filter_map(|link| {
            let Some(to_node) = self.graph.node(link.dest) else { return None };
            if to_node.static_blockage_mask != 0
              && (to_node.static_blockage_mask as u32 & self.params.traversal_skill_mask) == 0
            {
              return None;
            }
            let base = link.portal.0.distance(link.portal.1).max(from.position_ps.distance(to_node.position_ps));
            let mut cost = base + to_node.extra_cost as f32;
            if self.params.preferred.contains(&link.dest) {
              cost *= 0.5;
            }
            cost *= self.params.player_blockage_cost.multiplier().unwrap_or(1.0);
            let to_key = NavNodeKey::new(link.dest, partition_of(to_node.kind));
            Some((cost.max(0.0), Step { to: link.dest }, SearchState::Node(to_key)))
          })
          .collect()
      }
    }
  }

  fn heuristic(&self, state: &Self::StateType) -> f32 {
    let SearchState::Node(key) = state else { return 0.0 };
    let node = NodeId(key.node_index() as u32);
    let Some(pos) = self.graph.node(node).map(|n| n.position_ps) else { return 0.0 };
    let min_dist = self
      .params
      .goals
      .iter()
      .map(|g| pos.distance(g.position_ps))
      .fold(f32::INFINITY, f32::min);
    if min_dist.is_finite() {
      min_dist * self.params.cost_mode.heuristic_weight()
    } else {
      0.0
    }
  }

  fn is_goal_state(&self, state: &Self::StateType) -> bool {
    match state {
      SearchState::Root => false,
      SearchState::Node(key) => {
        let node = NodeId(key.node_index() as u32);
        self.params.goals.iter().any(|g| g.node == node)
      }
    }
  }
}

/// `FindSinglePathParams`: finds the cheapest path from any of `params`'s
/// starts to any of its goals.
pub fn find_single_path(
  graph: &PathNodeGraph,
  params: &PathFindParams,
) -> Result<SearchOutcome, SearchError> {
  if params.starts.is_empty() {
    return Err(SearchError::NoStarts);
  }
  if params.goals.len() > MAX_GOALS {
    return Err(SearchError::TooManyGoals);
  }
  if matches!(params.player_blockage_cost, PlayerBlockageCost::Impassable) {
    return Ok(SearchOutcome { overflowed_closed_list: false, ..Default::default() });
  }

  let problem = GraphSearchProblem { graph, params };
  // `max_visited` is enforced as a hard stop inside `find_path` itself: a
  // node is never checked against `is_goal_state` once the cap has already
  // been hit, so a reachable goal beyond the cap can never come back `Ok`
  // (spec.md §4.3 termination condition (c), scenario S6).
  match astar::find_path(&problem, Some(params.max_visited)) {
    Ok(result) => {
      let reached = result.path.last().map(|s| s.to);
      let node_path: Vec<NodeId> = result.path.iter().map(|s| s.to).collect();
      Ok(SearchOutcome {
        goal_nodes: reached.into_iter().collect(),
        reached_goals: params.goals.iter().map(|g| Some(g.node) == reached).collect(),
        overflowed_closed_list: false,
        node_path,
        explored_nodes: result.stats.explored_nodes,
      })
    }
    Err(stats) => Ok(SearchOutcome {
      goal_nodes: Vec::new(),
      reached_goals: vec![false; params.goals.len()],
      overflowed_closed_list: stats.explored_nodes >= params.max_visited,
      node_path: Vec::new(),
      explored_nodes: stats.explored_nodes,
    }),
  }
}

/// `FindUndirectedPathsParams`/`FindUndirectedPathsResults`: a multi-source,
/// multi-target Dijkstra that keeps expanding until every reachable goal has
/// been settled (or the open list drains), used for distance queries and
/// cache snapshots (spec.md §4.3). Implemented directly rather than through
/// [`astar::find_path`], since that engine stops at the *first* goal state —
/// it doesn't fit a "settle every goal" termination rule without forking it.
pub fn find_undirected_paths(
  graph: &PathNodeGraph,
  params: &PathFindParams,
) -> Result<SearchOutcome, SearchError> {
  if params.starts.is_empty() {
    return Err(SearchError::NoStarts);
  }
  if params.goals.len() > MAX_GOALS {
    return Err(SearchError::TooManyGoals);
  }

  let mut best_cost: std::collections::HashMap<NodeId, f32> = std::collections::HashMap::new();
  let mut open: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
  let mut explored = 0u32;
  let mut overflowed = false;
  let mut remaining_goals: std::collections::HashSet<NodeId> =
    params.goals.iter().map(|g| g.node).collect();
  let mut settled: Vec<NodeId> = Vec::new();

  for start in params.starts.iter().take(MAX_START_POSITIONS) {
    best_cost.insert(start.node, 0.0);
    open.push(Reverse((Cost(0.0), start.node)));
  }

  while let Some(Reverse((cost, node))) = open.pop() {
    let cost = cost.0;
    if best_cost.get(&node).copied().unwrap_or(f32::INFINITY) < cost {
      continue;
    }
    explored += 1;
    if explored > params.max_visited {
      overflowed = true;
      break;
    }
    if remaining_goals.remove(&node) {
      settled.push(node);
      if remaining_goals.is_empty() {
        break;
      }
    }

    let Some(from) = graph.node(node) else { continue };
    for link in graph.outgoing_links(node).filter(|l| l.kind != LinkKind::Incoming) {
      let Some(to_node) = graph.node(link.dest) else { continue };
      if to_node.static_blockage_mask != 0
        && (to_node.static_blockage_mask as u32 & params.traversal_skill_mask) == 0
      {
        continue;
      }
      let step_cost =
        from.position_ps.distance(to_node.position_ps) + to_node.extra_cost as f32;
      let new_cost = cost + step_cost.max(0.0);
      let better = best_cost.get(&link.dest).map(|&c| new_cost < c).unwrap_or(true);
      if better {
        best_cost.insert(link.dest, new_cost);
        open.push(Reverse((Cost(new_cost), link.dest)));
      }
    }
  }

  Ok(SearchOutcome {
    reached_goals: params.goals.iter().map(|g| settled.contains(&g.node)).collect(),
    goal_nodes: settled,
    overflowed_closed_list: overflowed,
    node_path: Vec::new(),
    explored_nodes: explored,
  })
}

#[cfg(test)]
#[path = "search_test.rs"]
mod test;
