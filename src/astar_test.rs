use super::*;

/// A tiny weighted graph: 0 -> 1 -> 3 (cost 1 each) and 0 -> 2 -> 3 (cost 5
/// each), used to check that `find_path` prefers the cheaper route even
/// though it isn't the one a pure-heuristic walk would try first.
struct LineGraph {
  edges: Vec<Vec<(u32, f32)>>,
  goal: u32,
}

impl AStarProblem for LineGraph {
  type ActionType = u32;
  type StateType = u32;

  fn initial_state(&self) -> Self::StateType {
    0
  }

  fn successors(&self, state: &Self::StateType) -> Vec<(f32, Self::ActionType, Self::StateType)> {
    self.edges[*state as usize].iter().map(|&(to, cost)| (cost, to, to)).collect()
  }

  fn heuristic(&self, state: &Self::StateType) -> f32 {
    if *state == self.goal {
      0.0
    } else {
      1.0
    }
  }

  fn is_goal_state(&self, state: &Self::StateType) -> bool {
    *state == self.goal
  }
}

#[test]
fn finds_cheapest_path_not_first_discovered() {
  let problem = LineGraph {
    edges: vec![
      vec![(1, 1.0), (2, 1.0)],
      vec![(3, 1.0)],
      vec![(3, 5.0)],
      vec![],
    ],
    goal: 3,
  };

  let result = find_path(&problem, None).expect("a path should be found");
  assert_eq!(result.path, vec![1, 3]);
}

#[test]
fn reports_failure_stats_when_unreachable() {
  let problem = LineGraph { edges: vec![vec![], vec![], vec![], vec![]], goal: 3 };
  let stats = find_path(&problem, None).unwrap_err();
  assert_eq!(stats.explored_nodes, 1);
}

#[test]
fn max_explored_is_a_hard_stop_even_when_the_goal_is_reachable() {
  let problem = LineGraph {
    edges: vec![
      vec![(1, 1.0), (2, 1.0)],
      vec![(3, 1.0)],
      vec![(3, 5.0)],
      vec![],
    ],
    goal: 3,
  };

  let stats = find_path(&problem, Some(0)).unwrap_err();
  assert_eq!(stats.explored_nodes, 0);
}
