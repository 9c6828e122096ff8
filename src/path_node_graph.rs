//! C1 — the PathNode Graph: a uniform directed graph over base polygons,
//! dynamically-patched sub-polygons, and action-pack enter/exit nodes.
//! Slot-allocated with stable ids and an intrusive free-list, grounded in
//! `examples/original_source/nd-backup/gameplay/nav/nav-path-node-mgr.h`.

use glam::Vec3;
use slotmap::{new_key_type, SlotMap};

use crate::{error::GraphError, nav_mesh::NavMeshSource};

new_key_type! {
  /// A registered mesh's stable id. Generation-tagged by `slotmap`, which
  /// gives the "handle may have turned invalid" semantics spec.md §9 asks
  /// for without a hand-rolled generation counter: a stale `MeshId` simply
  /// fails to `get()`.
  pub struct MeshId;
}

/// Compact opaque key identifying a polygon (or sub-polygon) within a
/// registered mesh. Stable for the mesh's registration lifetime; the
/// `MeshId` itself carries the generation check (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NavManagerId {
  pub mesh_id: MeshId,
  pub polygon_index: u32,
  pub sub_polygon_index: Option<u32>,
}

/// Index into the node slab. `u32::MAX` is never allocated, so it doubles as
/// a niche "no node" sentinel in a couple of call sites below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Index into the link slab. `0` is reserved as the free-list head and is
/// never a live link — this mirrors the original's intrusive free-list
/// idiom (spec.md §3) rather than using `Option<LinkId>` (which would cost
/// an extra discriminant per slot in the hot link-chain walks).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkId(u32);

impl LinkId {
  pub const NONE: LinkId = LinkId(0);

  pub fn is_none(self) -> bool {
    self.0 == 0
  }
}

/// A vertex in the path graph (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathNodeKind {
  /// A base navigation polygon.
  Poly { mgr_id: NavManagerId },
  /// A dynamically-patched sub-polygon introduced by a blocker.
  PolyEx { mgr_id: NavManagerId, shadows: NodeId },
  /// The entry anchor of an action pack.
  ActionPackEnter { pack: crate::action_pack::ActionPackId },
  /// The exit anchor of an action pack.
  ActionPackExit { pack: crate::action_pack::ActionPackId },
}

/// Directionality of a [`Link`] (spec.md §3, §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
  /// Traversable in both directions; always created as a matched pair.
  Bidirectional,
  /// Traversable only when expanding forward out of the source node.
  Outgoing,
  /// Stored so reverse-search can walk it, but skipped by forward expansion
  /// (spec.md §4.3: "Skip links of type incoming when taking a link out of a
  /// node").
  Incoming,
}

#[derive(Clone, Copy, Debug)]
pub struct PathNode {
  pub kind: PathNodeKind,
  /// Position in the parent space of the mesh/graph that owns this node.
  pub position_ps: Vec3,
  /// Static-blockage bitmask (spec.md §4.3 expansion rules).
  pub static_blockage_mask: u16,
  /// Signed extra cost, clamped to the original's `i8` range.
  pub extra_cost: i8,
  head_link: LinkId,
  head_reverse_link: ReverseLinkId,
}

#[derive(Clone, Copy, Debug)]
struct Link {
  dest: NodeId,
  next_link: LinkId,
  reverse_link: ReverseLinkId,
  portal: (Vec3, Vec3),
  kind: LinkKind,
  static_shadow: Option<NodeId>,
}

/// Index into the reverse-link slab, same free-list-through-zero idiom as
/// [`LinkId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ReverseLinkId(u32);

impl ReverseLinkId {
  const NONE: ReverseLinkId = ReverseLinkId(0);
}

#[derive(Clone, Copy, Debug)]
struct ReverseLink {
  source: NodeId,
  forward_link: LinkId,
  next: ReverseLinkId,
}

/// A snapshot of one outgoing link, for callers walking a node's
/// connectivity (e.g. A*'s expansion step, C3).
#[derive(Clone, Copy, Debug)]
pub struct LinkView {
  pub link_id: LinkIdPub,
  pub dest: NodeId,
  pub portal: (Vec3, Vec3),
  pub kind: LinkKind,
  pub static_shadow: Option<NodeId>,
}

/// Public, opaque wrapper around [`LinkId`] for callers that need to hand a
/// link id back (e.g. to a cost function) without depending on the crate's
/// internal free-list layout.
pub type LinkIdPub = LinkId;

enum NodeSlot {
  Free { next_free: u32 },
  Occupied(PathNode),
}

enum LinkSlot {
  Free { next_free: u32 },
  Occupied(Link),
}

enum ReverseLinkSlot {
  Free { next_free: u32 },
  Occupied(ReverseLink),
}

/// C1's public surface: a slot-allocated directed graph with a free-list
/// allocator, matching `NavPathNodeMgr`'s `AllocateNode`/`AllocateLink`/
/// `AddLink`/`RemoveLink`/`AddNavMesh`/`RemoveNavMesh`/`Validate` surface.
pub struct PathNodeGraph {
  nodes: Vec<NodeSlot>,
  node_free_head: Option<u32>,
  node_count: u32,
  max_nodes: u32,

  // Slot 0 is the reserved free-list head and is never user data.
  links: Vec<LinkSlot>,
  link_free_head: u32,
  link_count: u32,
  max_links: u32,

  reverse_links: Vec<ReverseLinkSlot>,
  reverse_free_head: u32,
  reverse_count: u32,

  /// Non-fatal allocation-failure counters (spec.md §4.1 "Fail policy").
  pub node_alloc_failures: u64,
  pub link_alloc_failures: u64,
}

impl PathNodeGraph {
  pub fn new(max_nodes: u32, max_links: u32) -> Self {
    Self {
      nodes: Vec::new(),
      node_free_head: None,
      node_count: 0,
      max_nodes,
      links: vec![LinkSlot::Free { next_free: 0 }],
      link_free_head: 0,
      link_count: 0,
      max_links,
      reverse_links: vec![ReverseLinkSlot::Free { next_free: 0 }],
      reverse_free_head: 0,
      reverse_count: 0,
      node_alloc_failures: 0,
      link_alloc_failures: 0,
    }
  }

  pub fn node_count(&self) -> u32 {
    self.node_count
  }

  pub fn link_count(&self) -> u32 {
    self.link_count
  }

  pub fn node(&self, id: NodeId) -> Option<&PathNode> {
    match self.nodes.get(id.0 as usize) {
      Some(NodeSlot::Occupied(node)) => Some(node),
      _ => None,
    }
  }

  pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PathNode> {
    match self.nodes.get_mut(id.0 as usize) {
      Some(NodeSlot::Occupied(node)) => Some(node),
      _ => None,
    }
  }

  fn alloc_node(&mut self, node: PathNode) -> Result<NodeId, GraphError> {
    if self.node_count >= self.max_nodes {
      self.node_alloc_failures += 1;
      return Err(GraphError::NodesExhausted);
    }
    let id = if let Some(free) = self.node_free_head {
      let next_free = match self.nodes[free as usize] {
        NodeSlot::Free { next_free } => next_free,
        NodeSlot::Occupied(_) => unreachable!("free-list points at occupied slot"),
      };
      self.node_free_head = if next_free == u32::MAX { None } else { Some(next_free) };
      self.nodes[free as usize] = NodeSlot::Occupied(node);
      free
    } else {
      self.nodes.push(NodeSlot::Occupied(node));
      (self.nodes.len() - 1) as u32
    };
    self.node_count += 1;
    Ok(NodeId(id))
  }

  fn free_node(&mut self, id: NodeId) {
    if matches!(self.nodes.get(id.0 as usize), Some(NodeSlot::Occupied(_))) {
      self.nodes[id.0 as usize] = NodeSlot::Free {
        next_free: self.node_free_head.unwrap_or(u32::MAX),
      };
      self.node_free_head = Some(id.0);
      self.node_count -= 1;
    }
  }

  fn alloc_link(&mut self, link: Link) -> Result<LinkId, GraphError> {
    if self.link_count >= self.max_links {
      self.link_alloc_failures += 1;
      return Err(GraphError::LinksExhausted);
    }
    let id = if self.link_free_head != 0 {
      let slot = self.link_free_head;
      let next_free = match self.links[slot as usize] {
        LinkSlot::Free { next_free } => next_free,
        LinkSlot::Occupied(_) => unreachable!(),
      };
      self.link_free_head = next_free;
      self.links[slot as usize] = LinkSlot::Occupied(link);
      slot
    } else {
      self.links.push(LinkSlot::Occupied(link));
      (self.links.len() - 1) as u32
    };
    self.link_count += 1;
    Ok(LinkId(id))
  }

  fn free_link(&mut self, id: LinkId) {
    if id.is_none() {
      return;
    }
    if matches!(self.links.get(id.0 as usize), Some(LinkSlot::Occupied(_))) {
      self.links[id.0 as usize] = LinkSlot::Free { next_free: self.link_free_head };
      self.link_free_head = id.0;
      self.link_count -= 1;
    }
  }

  fn alloc_reverse_link(&mut self, rl: ReverseLink) -> ReverseLinkId {
    let id = if self.reverse_free_head != 0 {
      let slot = self.reverse_free_head;
      let next_free = match self.reverse_links[slot as usize] {
        ReverseLinkSlot::Free { next_free } => next_free,
        ReverseLinkSlot::Occupied(_) => unreachable!(),
      };
      self.reverse_free_head = next_free;
      self.reverse_links[slot as usize] = ReverseLinkSlot::Occupied(rl);
      slot
    } else {
      self.reverse_links.push(ReverseLinkSlot::Occupied(rl));
      (self.reverse_links.len() - 1) as u32
    };
    self.reverse_count += 1;
    ReverseLinkId(id)
  }

  fn free_reverse_link(&mut self, id: ReverseLinkId) {
    if id.0 == 0 {
      return;
    }
    if matches!(self.reverse_links.get(id.0 as usize), Some(ReverseLinkSlot::Occupied(_))) {
      self.reverse_links[id.0 as usize] =
        ReverseLinkSlot::Free { next_free: self.reverse_free_head };
      self.reverse_free_head = id.0;
      self.reverse_count -= 1;
    }
  }

  /// Adds one directed link `from -> to`. For `LinkKind::Bidirectional` the
  /// caller is expected to have already added (or to separately add) the
  /// mirrored `to -> from` link — see [`Self::add_bidirectional_link`] for
  /// the common case that does both atomically.
  pub fn add_link(
    &mut self,
    from: NodeId,
    to: NodeId,
    edge0: Vec3,
    edge1: Vec3,
    kind: LinkKind,
    static_shadow: Option<NodeId>,
  ) -> Result<LinkId, GraphError> {
    let from_head = self.node(from).ok_or(GraphError::StaleNode)?.head_link;
    let to_rev_head = self.node(to).ok_or(GraphError::StaleNode)?.head_reverse_link;

    let link_id = self.alloc_link(Link {
      dest: to,
      next_link: from_head,
      reverse_link: ReverseLinkId::NONE,
      portal: (edge0, edge1),
      kind,
      static_shadow,
    })?;
    let reverse_id = self.alloc_reverse_link(ReverseLink {
      source: from,
      forward_link: link_id,
      next: to_rev_head,
    });
    // Fill in the back-reference now that both allocations succeeded.
    if let LinkSlot::Occupied(link) = &mut self.links[link_id.0 as usize] {
      link.reverse_link = reverse_id;
    }

    self.node_mut(from).unwrap().head_link = link_id;
    self.node_mut(to).unwrap().head_reverse_link = reverse_id;
    Ok(link_id)
  }

  /// Adds a matched bidirectional pair, rolling back the first half if the
  /// second allocation fails (spec.md §4.1: "roll back everything added by
  /// this call" applied at link-pair granularity).
  pub fn add_bidirectional_link(
    &mut self,
    a: NodeId,
    b: NodeId,
    edge_a: (Vec3, Vec3),
    edge_b: (Vec3, Vec3),
  ) -> Result<(LinkId, LinkId), GraphError> {
    let ab = self.add_link(a, b, edge_a.0, edge_a.1, LinkKind::Bidirectional, None)?;
    match self.add_link(b, a, edge_b.0, edge_b.1, LinkKind::Bidirectional, None) {
      Ok(ba) => Ok((ab, ba)),
      Err(e) => {
        self.remove_link(a, b);
        Err(e)
      }
    }
  }

  /// Removes the first link from `from` to `to`, freeing both the link and
  /// its matching reverse-link. Walks the per-node linked lists until the
  /// target is found (spec.md §4.1 "Removal walks the per-node linked
  /// list...").
  pub fn remove_link(&mut self, from: NodeId, to: NodeId) -> bool {
    let Some(from_node) = self.node(from) else { return false };
    let mut cursor = from_node.head_link;
    let mut prev: Option<LinkId> = None;
    while !cursor.is_none() {
      let (dest, next_link, reverse_link) = match &self.links[cursor.0 as usize] {
        LinkSlot::Occupied(l) => (l.dest, l.next_link, l.reverse_link),
        LinkSlot::Free { .. } => break,
      };
      if dest == to {
        // Unlink from the outgoing chain.
        match prev {
          Some(p) => {
            if let LinkSlot::Occupied(pl) = &mut self.links[p.0 as usize] {
              pl.next_link = next_link;
            }
          }
          None => self.node_mut(from).unwrap().head_link = next_link,
        }
        self.unlink_reverse(to, reverse_link);
        self.free_link(cursor);
        self.free_reverse_link(reverse_link);
        return true;
      }
      prev = Some(cursor);
      cursor = next_link;
    }
    false
  }

  fn unlink_reverse(&mut self, owner: NodeId, target: ReverseLinkId) {
    let Some(owner_node) = self.node(owner) else { return };
    let mut cursor = owner_node.head_reverse_link;
    let mut prev: Option<ReverseLinkId> = None;
    while cursor.0 != 0 {
      let next = match &self.reverse_links[cursor.0 as usize] {
        ReverseLinkSlot::Occupied(rl) => rl.next,
        ReverseLinkSlot::Free { .. } => break,
      };
      if cursor.0 == target.0 {
        match prev {
          Some(p) => {
            if let ReverseLinkSlot::Occupied(pl) = &mut self.reverse_links[p.0 as usize] {
              pl.next = next;
            }
          }
          None => self.node_mut(owner).unwrap().head_reverse_link = next,
        }
        return;
      }
      prev = Some(cursor);
      cursor = next;
    }
  }

  /// Iterates the outgoing links of `node`, in most-recently-added-first
  /// order (the free-list idiom makes no ordering guarantee beyond that).
  pub fn outgoing_links(&self, node: NodeId) -> impl Iterator<Item = LinkView> + '_ {
    let head = self.node(node).map(|n| n.head_link).unwrap_or(LinkId::NONE);
    LinkIter { graph: self, cursor: head }
  }

  /// Iterates the nodes that have a live link pointing *into* `node`
  /// (spec.md §4.3's reverse-search support).
  pub fn reverse_sources(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let head = self
      .node(node)
      .map(|n| n.head_reverse_link)
      .unwrap_or(ReverseLinkId::NONE);
    ReverseLinkIter { graph: self, cursor: head }
  }

  /// Allocates one node per polygon of `mesh` under `mesh_id`, then links
  /// adjacent polygons bidirectionally using their shared edge as the
  /// portal. On any allocation failure, every node/link added by this call
  /// is rolled back (spec.md §4.1).
  pub fn add_mesh(
    &mut self,
    mesh_id: MeshId,
    mesh: &dyn NavMeshSource,
  ) -> Result<Vec<NodeId>, GraphError> {
    let poly_count = mesh.polygon_count();
    let mut added_nodes = Vec::with_capacity(poly_count);

    let result = (|| {
      for poly in 0..poly_count {
        let mgr_id = NavManagerId { mesh_id, polygon_index: poly as u32, sub_polygon_index: None };
        let verts = mesh.polygon_vertices(poly);
        let centroid =
          verts.iter().fold(Vec3::ZERO, |acc, v| acc + *v) / verts.len().max(1) as f32;
        let node = self.alloc_node(PathNode {
          kind: PathNodeKind::Poly { mgr_id },
          position_ps: centroid,
          static_blockage_mask: 0,
          extra_cost: 0,
          head_link: LinkId::NONE,
          head_reverse_link: ReverseLinkId::NONE,
        })?;
        added_nodes.push(node);
      }

      for poly in 0..poly_count {
        let verts = mesh.polygon_vertices(poly);
        for edge in 0..verts.len() {
          let Some(neighbor) = mesh.adjacency(poly, edge) else { continue };
          if neighbor <= poly {
            // Already linked from the neighbor's own pass.
            continue;
          }
          let (e0, e1) = (verts[edge], verts[(edge + 1) % verts.len()]);
          self.add_bidirectional_link(
            added_nodes[poly],
            added_nodes[neighbor],
            (e0, e1),
            (e1, e0),
          )?;
        }
      }
      Ok(())
    })();

    match result {
      Ok(()) => Ok(added_nodes),
      Err(e) => {
        for node in added_nodes {
          self.remove_node_links(node);
          self.free_node(node);
        }
        Err(e)
      }
    }
  }

  fn remove_node_links(&mut self, node: NodeId) {
    while let Some(view) = self.outgoing_links(node).next() {
      self.remove_link(node, view.dest);
    }
    let sources: Vec<NodeId> = self.reverse_sources(node).collect();
    for source in sources {
      self.remove_link(source, node);
    }
  }

  /// Drops all in/out links of every node belonging to `mesh_id`, then frees
  /// the node slots.
  pub fn remove_mesh(&mut self, mesh_id: MeshId) {
    let to_remove: Vec<NodeId> = (0..self.nodes.len())
      .map(|i| NodeId(i as u32))
      .filter(|&id| match self.node(id) {
        Some(n) => node_mesh_id(&n.kind) == Some(mesh_id),
        None => false,
      })
      .collect();
    for node in to_remove {
      self.remove_node_links(node);
      self.free_node(node);
    }
  }

  /// Adds one node per sub-polygon, shadow-tagged against `shadowed_by`
  /// (spec.md §4.1 `add_ex_nodes_from_poly`).
  pub fn add_ex_nodes_from_poly(
    &mut self,
    mesh_id: MeshId,
    poly: u32,
    sub_polygons: &[crate::nav_mesh::SubPolygon],
    shadowed_by: NodeId,
  ) -> Result<Vec<NodeId>, GraphError> {
    let mut added = Vec::with_capacity(sub_polygons.len());
    for (i, sub) in sub_polygons.iter().enumerate() {
      let mgr_id = NavManagerId {
        mesh_id,
        polygon_index: poly,
        sub_polygon_index: Some(i as u32),
      };
      let centroid = sub.vertices.iter().fold(Vec3::ZERO, |acc, v| acc + *v)
        / sub.vertices.len().max(1) as f32;
      match self.alloc_node(PathNode {
        kind: PathNodeKind::PolyEx { mgr_id, shadows: shadowed_by },
        position_ps: centroid,
        static_blockage_mask: sub.blocker_mask as u16,
        extra_cost: 0,
        head_link: LinkId::NONE,
        head_reverse_link: ReverseLinkId::NONE,
      }) {
        Ok(node) => added.push(node),
        Err(e) => {
          for node in added {
            self.free_node(node);
          }
          return Err(e);
        }
      }
    }
    Ok(added)
  }

  /// Allocates a node that belongs to no mesh (an action-pack enter/exit
  /// anchor, spec.md §4.2). Freed the same way as any other node, via
  /// [`Self::remove_poly_ex`].
  pub fn add_mesh_independent_node(
    &mut self,
    kind: PathNodeKind,
    position_ps: Vec3,
    extra_cost: i8,
  ) -> Result<NodeId, GraphError> {
    self.alloc_node(PathNode {
      kind,
      position_ps,
      static_blockage_mask: 0,
      extra_cost,
      head_link: LinkId::NONE,
      head_reverse_link: ReverseLinkId::NONE,
    })
  }

  pub fn remove_poly_ex(&mut self, node: NodeId) {
    self.remove_node_links(node);
    self.free_node(node);
  }

  /// Development-build structural invariant check (spec.md §4.1
  /// "Validation"). Returns the first violation found, if any.
  pub fn validate(&self) -> Result<(), String> {
    for i in 0..self.nodes.len() {
      let NodeSlot::Occupied(node) = &self.nodes[i] else { continue };
      let mut cursor = node.head_link;
      while !cursor.is_none() {
        let LinkSlot::Occupied(link) = &self.links[cursor.0 as usize] else {
          return Err(format!("node {i} outgoing chain points at a free link slot"));
        };
        let ReverseLinkSlot::Occupied(rev) = &self.reverse_links[link.reverse_link.0 as usize]
        else {
          return Err(format!("link {} has no matching reverse link", cursor.0));
        };
        if rev.source != NodeId(i as u32) || rev.forward_link != cursor {
          return Err(format!("link {}'s reverse link does not point back", cursor.0));
        }
        cursor = link.next_link;
      }
    }
    Ok(())
  }

  /// Resets per-tick statistics and, if `validate` is enabled, runs the full
  /// invariant check (spec.md §4.1 `update()`).
  pub fn update(&mut self, validate: bool) -> Result<(), String> {
    if validate {
      self.validate()?;
    }
    Ok(())
  }
}

fn node_mesh_id(kind: &PathNodeKind) -> Option<MeshId> {
  match kind {
    PathNodeKind::Poly { mgr_id } | PathNodeKind::PolyEx { mgr_id, .. } => Some(mgr_id.mesh_id),
    PathNodeKind::ActionPackEnter { .. } | PathNodeKind::ActionPackExit { .. } => None,
  }
}

struct LinkIter<'a> {
  graph: &'a PathNodeGraph,
  cursor: LinkId,
}

impl<'a> Iterator for LinkIter<'a> {
  type Item = LinkView;

  fn next(&mut self) -> Option<Self::Item> {
    if self.cursor.is_none() {
      return None;
    }
    let LinkSlot::Occupied(link) = &self.graph.links[self.cursor.0 as usize] else {
      return None;
    };
    let view = LinkView {
      link_id: self.cursor,
      dest: link.dest,
      portal: link.portal,
      kind: link.kind,
      static_shadow: link.static_shadow,
    };
    self.cursor = link.next_link;
    Some(view)
  }
}

struct ReverseLinkIter<'a> {
  graph: &'a PathNodeGraph,
  cursor: ReverseLinkId,
}

impl<'a> Iterator for ReverseLinkIter<'a> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    if self.cursor.0 == 0 {
      return None;
    }
    let ReverseLinkSlot::Occupied(rl) = &self.graph.reverse_links[self.cursor.0 as usize] else {
      return None;
    };
    let source = rl.source;
    self.cursor = rl.next;
    Some(source)
  }
}

#[cfg(test)]
#[path = "path_node_graph_test.rs"]
mod test;
