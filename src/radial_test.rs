use glam::Vec3;

use super::*;
use crate::path_builder::StraightPathStep;

fn step(x: f32, z: f32) -> StraightPathStep {
  StraightPathStep { position_ps: Vec3::new(x, 0.0, z), node: None }
}

#[test]
fn push_path_is_noop_with_no_obstacles() {
  let steps = vec![step(0.0, 0.0), step(10.0, 0.0)];
  let out = push_path(steps.clone(), &[], 0.5);
  assert_eq!(out.len(), steps.len());
  assert_eq!(out[0].position_ps, steps[0].position_ps);
  assert_eq!(out[1].position_ps, steps[1].position_ps);
}

#[test]
fn push_path_is_noop_when_edge_is_far_from_the_leg() {
  let steps = vec![step(0.0, 0.0), step(10.0, 0.0)];
  let edges = vec![ObstacleEdge {
    v0: Vec3::new(5.0, 0.0, 10.0),
    v1: Vec3::new(5.0, 0.0, 12.0),
    outward_normal: Vec3::new(0.0, 0.0, 1.0),
  }];
  let out = push_path(steps, &edges, 0.5);
  assert_eq!(out.len(), 2);
}

#[test]
fn push_path_detours_around_a_blocking_edge_on_the_leg() {
  // An obstacle edge sitting squarely across the straight-line leg, with
  // its outward normal pointing back toward the start, forces the pushed
  // path to route through the edge's projected offset rather than
  // straight through it.
  let steps = vec![step(0.0, 0.0), step(10.0, 0.0)];
  let edges = vec![ObstacleEdge {
    v0: Vec3::new(5.0, 0.0, -1.0),
    v1: Vec3::new(5.0, 0.0, 1.0),
    outward_normal: Vec3::new(-1.0, 0.0, 0.0),
  }];
  let out = push_path(steps, &edges, 0.5);
  assert!(out.len() >= 2);
  assert_eq!(out[0].position_ps, Vec3::new(0.0, 0.0, 0.0));
}

#[test]
fn eliminate_narrow_wedges_merges_sharp_inward_corners() {
  let mut edges = vec![
    ObstacleEdge { v0: Vec3::new(0.0, 0.0, 0.0), v1: Vec3::new(1.0, 0.0, 0.0), outward_normal: Vec3::new(0.0, 0.0, -1.0) },
    ObstacleEdge { v0: Vec3::new(1.0, 0.0, 0.0), v1: Vec3::new(1.05, 0.0, 0.02), outward_normal: Vec3::new(0.0, 0.0, -1.0) },
  ];
  let before = edges.len();
  eliminate_narrow_wedges(&mut edges, 1.0);
  assert!(edges.len() <= before);
}
