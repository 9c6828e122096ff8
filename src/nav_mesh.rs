//! The query surface the core consumes from a navmesh geometry library.
//!
//! The navmesh library itself (polygon authoring, validation, point-in-poly,
//! local/parent/world locator math) is explicitly out of scope (spec.md §1):
//! this module defines the minimal [`NavMeshSource`] trait the rest of the
//! crate calls through, plus [`ValidatedNavMesh`], a small in-memory
//! implementation used by the test suite and scenario tests.

use glam::Vec3;

use crate::util::Transform;

/// A blocking-edge query result used by the radial engine (C5) and by
/// [`NavMeshSource::probe_ls`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbeResult {
  /// The probe reached its goal without hitting a blocking edge.
  ReachedGoal,
  /// The probe was stopped by a blocking edge at the given point (mesh-local
  /// space) with the given outward normal.
  HitEdge { point: Vec3, normal: Vec3 },
}

/// A dynamically-patched sub-polygon attached to a base polygon (the `PolyEx`
/// path-node variant is built from these; spec.md §3/§4.1).
#[derive(Clone, Debug)]
pub struct SubPolygon {
  /// Vertices of the sub-polygon, in the owning mesh's local space.
  pub vertices: Vec<Vec3>,
  /// Bitmask of dynamic blockers currently affecting this sub-polygon.
  pub blocker_mask: u32,
}

/// An edge of a polygon, in the mesh's local space, together with whether it
/// blocks an agent of a given radius (used by the radial engine's edge
/// collection step, spec.md §4.5).
#[derive(Clone, Copy, Debug)]
pub struct PolyEdge {
  pub v0: Vec3,
  pub v1: Vec3,
  pub outward_normal: Vec3,
}

/// The query surface a navmesh geometry library must expose for `navcore` to
/// consume (spec.md §6, "Library inputs"). All positions are in the mesh's
/// own local/parent space; callers are responsible for parent-space
/// round-tripping (spec.md §4.5's numerical-hygiene rule).
pub trait NavMeshSource {
  /// Number of base polygons in the mesh.
  fn polygon_count(&self) -> usize;

  /// Vertices of a polygon, in local space, wound counter-clockwise.
  fn polygon_vertices(&self, poly: usize) -> &[Vec3];

  /// The polygon (and, if the two polygons belong to different meshes, a
  /// cross-mesh link) reachable across `edge` of `poly`, if any.
  fn adjacency(&self, poly: usize, edge: usize) -> Option<usize>;

  /// Whether a polygon is purely a cross-mesh link polygon (no gameplay
  /// footprint of its own).
  fn is_link(&self, poly: usize) -> bool {
    let _ = poly;
    false
  }

  /// This mesh's parent-space transform.
  fn parent_transform(&self) -> Transform;

  /// Nearest point on `poly` (local space) to `point` (local space).
  fn nearest_point_on_poly(&self, poly: usize, point: Vec3) -> Vec3;

  /// Sweeps a radius-`radius` probe from `start` along `mv`, stopping at the
  /// first blocking edge not permitted by `obeyed_blockers`.
  fn probe_ls(
    &self,
    start: Vec3,
    mv: Vec3,
    obeyed_blockers: u32,
    radius: f32,
  ) -> ProbeResult;

  /// Visits every polygon crossed by the segment `start_ps..start_ps+move_ps`
  /// (parent space) in order, until `visit` returns `false`.
  fn walk_polys_in_line(
    &self,
    start_ps: Vec3,
    move_ps: Vec3,
    visit: &mut dyn FnMut(usize) -> bool,
  );

  /// The polygon containing `point` (local space), if any.
  fn find_containing_poly(&self, point: Vec3) -> Option<usize>;

  /// Boundary edges of `poly` that currently block an `radius`-thick probe
  /// (including dynamic blockers), in local space.
  fn blocking_edges(&self, poly: usize, radius: f32) -> Vec<PolyEdge>;

  /// Dynamically-patched sub-polygons carved out of `poly`, if any.
  fn sub_polygons(&self, poly: usize) -> &[SubPolygon] {
    let _ = poly;
    &[]
  }
}

/// A minimal, in-memory [`NavMeshSource`] used by tests. Every polygon is
/// convex and wound counter-clockwise; adjacency is precomputed at
/// construction time by matching shared edges.
pub struct ValidatedNavMesh {
  polygons: Vec<Vec<Vec3>>,
  adjacency: Vec<Vec<Option<usize>>>,
  transform: Transform,
  blockers: Vec<Vec<PolyEdge>>,
}

impl ValidatedNavMesh {
  /// Builds a mesh from a list of convex, counter-clockwise polygons (each a
  /// `Vec<Vec3>` of vertices in local space), computing adjacency by shared
  /// edges (within `1e-4`).
  pub fn new(polygons: Vec<Vec<Vec3>>, transform: Transform) -> Self {
    let n = polygons.len();
    let mut adjacency = vec![Vec::new(); n];
    for (i, poly) in polygons.iter().enumerate() {
      adjacency[i] = vec![None; poly.len()];
    }
    for i in 0..n {
      for ei in 0..polygons[i].len() {
        let (a0, a1) = edge_points(&polygons[i], ei);
        for j in 0..n {
          if i == j {
            continue;
          }
          for ej in 0..polygons[j].len() {
            let (b0, b1) = edge_points(&polygons[j], ej);
            // Shared edges run in opposite winding order between the two
            // polygons that share them.
            if a0.distance_squared(b1) < 1e-8 && a1.distance_squared(b0) < 1e-8
            {
              adjacency[i][ei] = Some(j);
            }
          }
        }
      }
    }
    let blockers = vec![Vec::new(); n];
    Self { polygons, adjacency, transform, blockers }
  }

  /// Marks `edge` of `poly` as a blocking edge (e.g. a wall or an obstacle),
  /// used by radial-engine scenario tests (spec.md §8, S2).
  pub fn add_blocking_edge(&mut self, poly: usize, v0: Vec3, v1: Vec3) {
    let verts = &self.polygons[poly];
    let centroid =
      verts.iter().fold(Vec3::ZERO, |acc, v| acc + *v) / verts.len() as f32;
    let edge_dir = (v1 - v0).normalize_or_zero();
    let to_centroid = (centroid - v0).normalize_or_zero();
    // Outward normal points away from the polygon's centroid.
    let candidate = Vec3::new(-edge_dir.z, edge_dir.y, edge_dir.x);
    let outward_normal = if candidate.dot(to_centroid) > 0.0 {
      -candidate
    } else {
      candidate
    };
    self.blockers[poly].push(PolyEdge { v0, v1, outward_normal });
  }
}

fn edge_points(poly: &[Vec3], edge: usize) -> (Vec3, Vec3) {
  let a = poly[edge];
  let b = poly[(edge + 1) % poly.len()];
  (a, b)
}

impl NavMeshSource for ValidatedNavMesh {
  fn polygon_count(&self) -> usize {
    self.polygons.len()
  }

  fn polygon_vertices(&self, poly: usize) -> &[Vec3] {
    &self.polygons[poly]
  }

  fn adjacency(&self, poly: usize, edge: usize) -> Option<usize> {
    self.adjacency[poly].get(edge).copied().flatten()
  }

  fn parent_transform(&self) -> Transform {
    self.transform
  }

  fn nearest_point_on_poly(&self, poly: usize, point: Vec3) -> Vec3 {
    // Simple closest-point-on-convex-polygon via clamped projection onto
    // each edge; sufficient for the crate's test fixtures.
    let verts = &self.polygons[poly];
    let mut best = verts[0];
    let mut best_dist = f32::MAX;
    for i in 0..verts.len() {
      let (a, b) = edge_points(verts, i);
      let ab = b - a;
      let t = if ab.length_squared() > 0.0 {
        ((point - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0)
      } else {
        0.0
      };
      let candidate = a + ab * t;
      let dist = candidate.distance_squared(point);
      if dist < best_dist {
        best_dist = dist;
        best = candidate;
      }
    }
    best
  }

  fn probe_ls(
    &self,
    _start: Vec3,
    _mv: Vec3,
    _obeyed_blockers: u32,
    _radius: f32,
  ) -> ProbeResult {
    // The test fixture has no dynamic blockers wired into probing; real
    // navmesh libraries perform the actual sweep against mesh geometry.
    ProbeResult::ReachedGoal
  }

  fn walk_polys_in_line(
    &self,
    start_ps: Vec3,
    move_ps: Vec3,
    visit: &mut dyn FnMut(usize) -> bool,
  ) {
    let end = start_ps + move_ps;
    for poly in 0..self.polygons.len() {
      if self.find_containing_poly(start_ps) == Some(poly)
        || self.find_containing_poly(end) == Some(poly)
      {
        if !visit(poly) {
          return;
        }
      }
    }
  }

  fn find_containing_poly(&self, point: Vec3) -> Option<usize> {
    (0..self.polygons.len()).find(|&poly| point_in_convex_poly(&self.polygons[poly], point))
  }

  fn blocking_edges(&self, poly: usize, _radius: f32) -> Vec<PolyEdge> {
    self.blockers[poly].clone()
  }
}

fn point_in_convex_poly(verts: &[Vec3], point: Vec3) -> bool {
  // XZ-plane point-in-polygon via cross-product sign (Y is up, as in the
  // crate's standard coordinate system).
  verts.iter().enumerate().all(|(i, &a)| {
    let b = verts[(i + 1) % verts.len()];
    let edge = Vec3::new(b.x - a.x, 0.0, b.z - a.z);
    let to_point = Vec3::new(point.x - a.x, 0.0, point.z - a.z);
    edge.x * to_point.z - edge.z * to_point.x >= -1e-5
  })
}
