//! C5 — the Radial Path Engine. Given a raw smoothed path and a set of
//! candidate obstacle edges, pushes the path outward by the agent radius so
//! it never clips a blocking edge. Grounded step-for-step in
//! `examples/original_source/nd-backup/gameplay/nav/nav-path-build.cpp`'s
//! `EliminateNarrowWedges` / `LinkEdges` / `ProbeAndShadowEdges` family /
//! `ShadowEdges` / `ResolveLinkIntersections` functions.

use std::collections::VecDeque;

use glam::Vec3;

use crate::geometry::edge_intersection;
use crate::path_builder::StraightPathStep;

/// Numerical hygiene constant shared with edge-linking and edge-splitting
/// (spec.md §4.5 "Numerical hygiene").
pub const LINK_DIST: f32 = 1e-4;

/// A raw blocking edge from the nav-mesh library's "is blocking edge" query
/// (including dynamic blockers), supplied by the host — the query itself
/// lives in the excluded navmesh library (spec.md §1).
#[derive(Clone, Copy, Debug)]
pub struct ObstacleEdge {
  pub v0: Vec3,
  pub v1: Vec3,
  pub outward_normal: Vec3,
}

/// Which side of an edge a link lives on, relative to the edge's own
/// outward normal (spec.md §4.5 "Link directionality").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkSide {
  Left,
  Right,
}

#[derive(Clone, Copy, Debug)]
struct EdgeLink {
  /// The other edge this link connects to.
  other: usize,
  side: LinkSide,
  /// The world-space segment the agent travels along at this link.
  segment: (Vec3, Vec3),
}

#[derive(Clone, Debug)]
struct ProjectedEdge {
  /// Original edge, in mesh-local / parent space.
  raw: ObstacleEdge,
  /// `edge_v + outward_normal * r` for both endpoints, cached in parent
  /// space (spec.md §4.5 "Edge collection").
  projected: (Vec3, Vec3),
  link0: Option<EdgeLink>,
  link1: Option<EdgeLink>,
  shadowed: bool,
}

/// Corner angle between two edges sharing a vertex, via the dot product of
/// their directions (spec.md §4.5 "Edge linking").
fn corner_angle(dir_a: Vec3, dir_b: Vec3) -> f32 {
  let cos = (dir_a.normalize_or_zero().dot(dir_b.normalize_or_zero())).clamp(-1.0, 1.0);
  cos.acos()
}

/// Narrow-wedge elimination (legacy mode, spec.md §4.5). Repeatedly merges
/// edge pairs whose shared vertex forms a wedge smaller than `2r`, dropping
/// the shorter edge. `navcore` keeps this legacy mode available but, per
/// DESIGN.md's Open Question (a) resolution, does not wire it into the
/// default `push_path` pipeline — spec.md explicitly makes it optional with
/// no parity requirement.
pub fn eliminate_narrow_wedges(edges: &mut Vec<ObstacleEdge>, radius: f32) {
  let mut changed = true;
  while changed {
    changed = false;
    'outer: for i in 0..edges.len() {
      for j in (i + 1)..edges.len() {
        let shared = shared_vertex(edges[i], edges[j]);
        let Some(shared) = shared else { continue };
        let dir_a = other_vertex(edges[i], shared) - shared;
        let dir_b = other_vertex(edges[j], shared) - shared;
        let angle = corner_angle(dir_a, dir_b);
        if dir_a.cross(dir_b).y < 0.0 && angle < (2.0 * radius).atan2(radius).min(std::f32::consts::PI) {
          let len_a = dir_a.length();
          let len_b = dir_b.length();
          let (keep, drop) = if len_a >= len_b { (i, j) } else { (j, i) };
          edges.remove(drop.max(keep).min(edges.len() - 1).min(drop));
          let _ = keep;
          changed = true;
          break 'outer;
        }
      }
    }
  }
}

fn shared_vertex(a: ObstacleEdge, b: ObstacleEdge) -> Option<Vec3> {
  for &va in &[a.v0, a.v1] {
    for &vb in &[b.v0, b.v1] {
      if va.distance_squared(vb) < LINK_DIST * LINK_DIST {
        return Some(va);
      }
    }
  }
  None
}

fn other_vertex(edge: ObstacleEdge, vertex: Vec3) -> Vec3 {
  if edge.v0.distance_squared(vertex) < LINK_DIST * LINK_DIST { edge.v1 } else { edge.v0 }
}

fn project(edge: &ObstacleEdge, radius: f32) -> (Vec3, Vec3) {
  (edge.v0 + edge.outward_normal * radius, edge.v1 + edge.outward_normal * radius)
}

/// Edge linking (spec.md §4.5 "Edge linking"). For every pair sharing an
/// endpoint within [`LINK_DIST`], computes the interior/exterior corner
/// link geometry and records it in both edges' `link0`/`link1` slots.
fn link_edges(edges: &mut [ProjectedEdge], radius: f32) {
  let n = edges.len();
  for i in 0..n {
    for j in (i + 1)..n {
      let Some(shared) = shared_vertex(edges[i].raw, edges[j].raw) else { continue };
      let dir_a = other_vertex(edges[i].raw, shared) - shared;
      let dir_b = other_vertex(edges[j].raw, shared) - shared;
      let cross_y = dir_a.cross(dir_b).y;
      let angle = corner_angle(dir_a, dir_b);
      let half = angle / 2.0;

      let (endpoint_a, endpoint_b) = if cross_y > 0.0 {
        // Exterior corner: agent goes around a convex obstacle. Two link
        // endpoints offset by tan(angle/2) * r along each edge direction.
        let offset = half.tan() * radius;
        (
          shared + edges[i].raw.outward_normal * radius + dir_a.normalize_or_zero() * offset,
          shared + edges[j].raw.outward_normal * radius + dir_b.normalize_or_zero() * offset,
        )
      } else {
        // Interior corner: a single intersection point at r / cos(angle/2)
        // from the shared vertex, along the bisector of the two outward
        // normals.
        let bisector = (edges[i].raw.outward_normal + edges[j].raw.outward_normal).normalize_or_zero();
        let dist = radius / half.cos().max(1e-3);
        let point = shared + bisector * dist;
        (point, point)
      };

      let link = EdgeLink { other: j, side: LinkSide::Left, segment: (endpoint_a, endpoint_b) };
      if edges[i].link0.is_none() {
        edges[i].link0 = Some(link);
      } else {
        edges[i].link1 = Some(link);
      }
      let back_link = EdgeLink { other: i, side: LinkSide::Right, segment: (endpoint_b, endpoint_a) };
      if edges[j].link0.is_none() {
        edges[j].link0 = Some(back_link);
      } else {
        edges[j].link1 = Some(back_link);
      }
    }
  }
}

/// Edge splitting (spec.md §4.5 "Edge splitting", the "Swiss-cheese" step).
/// Where two projected segments cross away from an already-linked point,
/// splits one edge at the crossing and inserts a synthetic interior link.
fn split_crossing_edges(edges: &mut Vec<ProjectedEdge>) {
  let mut i = 0;
  while i < edges.len() {
    let mut j = i + 1;
    while j < edges.len() {
      if let Some((a, b)) = edge_intersection(edges[i].projected, edges[j].projected, LINK_DIST * LINK_DIST) {
        let split_point = (a + b) * 0.5;
        let mut new_edge = edges[i].clone();
        new_edge.projected.0 = split_point;
        new_edge.link0 = None;
        new_edge.link1 = None;
        edges[i].projected.1 = split_point;
        edges.push(new_edge);
      }
      j += 1;
    }
    i += 1;
  }
}

/// Shadowing (spec.md §4.5 "Shadowing"). An edge is shadowed if its
/// projected segment lies entirely within `radius` of another edge's
/// projected segment — no legal agent motion can ever touch it.
fn shadow_edges(edges: &mut [ProjectedEdge], radius: f32) {
  let n = edges.len();
  for i in 0..n {
    let (p0, p1) = edges[i].projected;
    let mut covered = false;
    for j in 0..n {
      if i == j {
        continue;
      }
      let (q0, q1) = edges[j].projected;
      if dist_point_to_segment(p0, q0, q1) < radius && dist_point_to_segment(p1, q0, q1) < radius {
        covered = true;
        break;
      }
    }
    edges[i].shadowed = covered;
  }
}

fn dist_point_to_segment(p: Vec3, a: Vec3, b: Vec3) -> f32 {
  let ab = b - a;
  let len_sq = ab.length_squared();
  if len_sq < 1e-12 {
    return p.distance(a);
  }
  let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
  p.distance(a + ab * t)
}

/// Link-intersection resolution (spec.md §4.5). After shadowing, promotes
/// any still-unlinked pair whose link segments cross into a real link.
fn resolve_link_intersections(edges: &mut [ProjectedEdge]) {
  let n = edges.len();
  for i in 0..n {
    if edges[i].link0.is_some() && edges[i].link1.is_some() {
      continue;
    }
    for j in 0..n {
      if i == j {
        continue;
      }
      let Some(l0) = edges[j].link0.map(|l| l.segment) else { continue };
      if edge_intersection(edges[i].projected, l0, LINK_DIST * LINK_DIST).is_some() {
        let link = EdgeLink { other: j, side: LinkSide::Left, segment: l0 };
        if edges[i].link0.is_none() {
          edges[i].link0 = Some(link);
        } else {
          edges[i].link1 = Some(link);
        }
      }
    }
  }
}

fn build_edge_cache(raw_edges: &[ObstacleEdge], radius: f32) -> Vec<ProjectedEdge> {
  let mut edges: Vec<ProjectedEdge> = raw_edges
    .iter()
    .map(|&raw| ProjectedEdge { raw, projected: project(&raw, radius), link0: None, link1: None, shadowed: false })
    .collect();
  link_edges(&mut edges, radius);
  split_crossing_edges(&mut edges);
  shadow_edges(&mut edges, radius);
  resolve_link_intersections(&mut edges);
  edges
}

/// Bidirectional BFS over the edge link graph to determine travel
/// direction and detect closed loops (spec.md §4.5 "Path push").
fn bfs_travel_direction(edges: &[ProjectedEdge], entry: usize, exit_hint: Vec3) -> (bool, bool) {
  // Returns (go_via_link1_first, is_loop).
  let mut visited_fwd = vec![false; edges.len()];
  let mut visited_bwd = vec![false; edges.len()];
  let mut q_fwd = VecDeque::new();
  let mut q_bwd = VecDeque::new();
  q_fwd.push_back(entry);
  q_bwd.push_back(entry);
  visited_fwd[entry] = true;
  visited_bwd[entry] = true;
  let mut is_loop = false;
  for _ in 0..edges.len() {
    if let Some(cur) = q_fwd.pop_front() {
      if let Some(l) = edges[cur].link1 {
        if visited_bwd[l.other] {
          is_loop = true;
        }
        if !visited_fwd[l.other] {
          visited_fwd[l.other] = true;
          q_fwd.push_back(l.other);
        }
      }
    }
    if let Some(cur) = q_bwd.pop_front() {
      if let Some(l) = edges[cur].link0 {
        if visited_fwd[l.other] {
          is_loop = true;
        }
        if !visited_bwd[l.other] {
          visited_bwd[l.other] = true;
          q_bwd.push_back(l.other);
        }
      }
    }
  }
  let prefer_link1 = edges[entry].link1.map(|l| l.segment.0.distance(exit_hint)).unwrap_or(f32::MAX)
    < edges[entry].link0.map(|l| l.segment.0.distance(exit_hint)).unwrap_or(f32::MAX);
  (prefer_link1, is_loop)
}

/// Finds the edge (if any) whose projected segment the leg `from -> to`
/// crosses, returning the crossing point.
fn find_entry(edges: &[ProjectedEdge], from: Vec3, to: Vec3) -> Option<(usize, Vec3)> {
  for (i, edge) in edges.iter().enumerate() {
    if edge.shadowed {
      continue;
    }
    if let Some((a, _)) = edge_intersection((from, to), edge.projected, LINK_DIST * LINK_DIST) {
      return Some((i, a));
    }
  }
  None
}

/// Path push (spec.md §4.5 "Path push"). Walks the input path leg by leg,
/// entering/following/exiting edge space, with loop detection and a single
/// retry with flipped travel direction on a failed exit probe.
pub fn push_path(steps: Vec<StraightPathStep>, raw_edges: &[ObstacleEdge], radius: f32) -> Vec<StraightPathStep> {
  if steps.len() < 2 || raw_edges.is_empty() {
    return steps;
  }
  let edges = build_edge_cache(raw_edges, radius);
  let mut out = Vec::with_capacity(steps.len());
  out.push(steps[0]);

  for pair in steps.windows(2) {
    let (from, to) = (pair[0].position_ps, pair[1].position_ps);
    match find_entry(&edges, from, to) {
      None => {
        out.push(pair[1]);
      }
      Some((entry_idx, entry_point)) => {
        out.push(StraightPathStep { position_ps: entry_point, node: pair[0].node });
        let (prefer_link1, is_loop) = bfs_travel_direction(&edges, entry_idx, to);
        let mut cur = entry_idx;
        let mut forward = prefer_link1;
        let mut attempts = 0;
        let mut committed_exit = false;
        while attempts < edges.len() + 1 {
          attempts += 1;
          let next_link = if forward { edges[cur].link1 } else { edges[cur].link0 };
          match next_link {
            Some(l) => {
              let exits_here = dist_point_to_segment(to, l.segment.0, l.segment.1) > radius;
              out.push(StraightPathStep { position_ps: l.segment.0, node: None });
              if exits_here {
                committed_exit = true;
                break;
              }
              cur = l.other;
            }
            None => {
              if is_loop && attempts == 1 {
                forward = !forward;
                continue;
              }
              break;
            }
          }
        }
        if !committed_exit {
          out.push(pair[1]);
        }
      }
    }
  }

  snip_self_crossings(out)
}

/// Scans the output for legs that cross each other and snips the loop out
/// by replacing it with the crossing point (spec.md §4.5, final step of
/// "Path push").
fn snip_self_crossings(steps: Vec<StraightPathStep>) -> Vec<StraightPathStep> {
  let mut steps = steps;
  let mut i = 0;
  while i + 1 < steps.len() {
    let mut j = i + 2;
    let mut snipped = false;
    while j + 1 < steps.len() {
      if let Some((a, _)) = edge_intersection(
        (steps[i].position_ps, steps[i + 1].position_ps),
        (steps[j].position_ps, steps[j + 1].position_ps),
        LINK_DIST * LINK_DIST,
      ) {
        let replacement = StraightPathStep { position_ps: a, node: steps[i + 1].node };
        steps.splice(i + 1..=j, std::iter::once(replacement));
        snipped = true;
        break;
      }
      j += 1;
    }
    if !snipped {
      i += 1;
    }
  }
  steps
}

#[cfg(test)]
#[path = "radial_test.rs"]
mod test;
