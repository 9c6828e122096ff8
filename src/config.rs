//! Crate-wide tunables, grounded in the teacher's `ArchipelagoOptions`
//! (`lib.rs`) — a plain struct with a `Default` impl, constructed once by
//! the caller and threaded through the API rather than read from global
//! state (spec.md §9's "explicit nav world context" design note).

/// Configuration for a [`crate::NavCore`].
#[derive(Clone, Debug)]
pub struct NavCoreConfig {
  /// Maximum number of live path nodes (C1 slab capacity).
  pub max_nodes: u32,
  /// Maximum number of live links (C1 slab capacity).
  pub max_links: u32,
  /// Maximum number of live action packs (C2 slab capacity).
  pub max_action_packs: u32,
  /// Maximum pending action-pack registrations processed per
  /// [`crate::action_pack::ActionPackRegistry::update`] tick.
  pub max_registrations_per_tick: u32,
  /// Maximum auxiliary links an action pack may add to nearby polygons
  /// within its lateral anim-adjust range (`kMaxPathNodesPerSide` in the
  /// original source).
  pub max_path_nodes_per_side: u32,
  /// Whether to run full structural invariant validation in
  /// [`crate::path_node_graph::PathNodeGraph::update`] and
  /// [`crate::action_pack::ActionPackRegistry::debug_check_for_corruption`].
  /// Defaults to `cfg!(debug_assertions)`.
  pub validate_graph: bool,
  /// Distance (in the parent space) within which two edge endpoints are
  /// considered coincident during radial-engine edge linking (`kLinkDist`
  /// in the original source).
  pub link_dist: f32,
  /// Maximum number of live path requests (C6 slab capacity).
  pub max_requests: u32,
  /// High-priority request service rate, in Hz.
  pub high_priority_hz: f32,
  /// Normal-priority request service rate, in Hz.
  pub normal_priority_hz: f32,
  /// Low-priority request service rate, in Hz.
  pub low_priority_hz: f32,
}

impl Default for NavCoreConfig {
  fn default() -> Self {
    Self {
      max_nodes: 8192,
      max_links: 32768,
      max_action_packs: 1024,
      max_registrations_per_tick: 16,
      max_path_nodes_per_side: 16,
      validate_graph: cfg!(debug_assertions),
      link_dist: 1e-4,
      max_requests: 256,
      high_priority_hz: 8.0,
      normal_priority_hz: 4.0,
      low_priority_hz: 1.3,
    }
  }
}
