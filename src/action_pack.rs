//! C2 — the Action-Pack Registry: a slot-allocated table of traversal
//! action packs (jumps, ladders, vaults, ropes, doors, squeezes...) that
//! register two path-nodes onto the C1 graph and arbitrate shared use
//! through an [`ActionPackMutex`]. Grounded in
//! `examples/original_source/nd-backup/gameplay/nav/traversal-action-pack.h`
//! and `action-pack-mgr.cpp`.

use std::collections::VecDeque;

use glam::Vec3;
use parking_lot::Mutex as SpinMutex;
use slotmap::{new_key_type, SlotMap};

use crate::{
  error::ActionPackError,
  path_node_graph::{LinkKind, NodeId, PathNodeGraph, PathNodeKind},
  util::Transform,
};

new_key_type! {
  /// A logged-in action pack's stable id.
  pub struct ActionPackId;
}

new_key_type! {
  /// An [`ActionPackMutex`]'s stable id.
  pub struct ActionPackMutexId;
}

/// Opaque id for whatever concurrent reserver/user model the host engine
/// uses (a process, an agent, a task...). `navcore` has no actor model of
/// its own (spec.md §1 excludes character controllers), so this is left as
/// an opaque integer the caller assigns meaning to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// A traversal segment (jump, ladder, vault, rope, squeeze, door-open).
/// Field set mirrors `TraversalActionPack::InitParams` in the original
/// source.
#[derive(Clone, Debug)]
pub struct ActionPack {
  pub name: String,
  pub bound_frame_ws: Transform,
  pub source_pos_ps: Vec3,
  pub dest_pos_ps: Vec3,
  pub skill_mask: u32,
  pub faction_mask: u32,
  pub tension_mask: u32,
  pub static_blockage_mask: u16,
  pub extra_path_cost: i8,
  /// Lateral tolerance (min, max) along which the AP's animation can be
  /// shifted to match the incoming path ("anim-adjust range").
  pub anim_adjust_range: (f32, f32),
  pub mutex_id: Option<ActionPackMutexId>,
  pub usage_cooldown: f32,
  pub single_use: bool,
  pub player_blocking: bool,
  /// Logs out automatically when `owner`'s process is observed dead.
  pub dynamic: bool,
  pub owner: Option<UserId>,
  pub reverse_pack: Option<ActionPackId>,

  // --- runtime state, not part of InitParams ---
  pub(crate) reservation_holder: Option<UserId>,
  pub(crate) used: bool,
  pub(crate) registered: bool,
  pub(crate) cost_dirty: bool,
  pub(crate) enter_node: Option<NodeId>,
  pub(crate) exit_node: Option<NodeId>,
  pub(crate) blocked_by_player: bool,
}

impl ActionPack {
  pub fn new(name: impl Into<String>, bound_frame_ws: Transform, source_pos_ps: Vec3, dest_pos_ps: Vec3) -> Self {
    Self {
      name: name.into(),
      bound_frame_ws,
      source_pos_ps,
      dest_pos_ps,
      skill_mask: 0,
      faction_mask: 1,
      tension_mask: u32::MAX,
      static_blockage_mask: 0,
      extra_path_cost: 0,
      anim_adjust_range: (0.0, 0.0),
      mutex_id: None,
      usage_cooldown: 0.0,
      single_use: false,
      player_blocking: false,
      dynamic: false,
      owner: None,
      reverse_pack: None,
      reservation_holder: None,
      used: false,
      registered: false,
      cost_dirty: true,
      enter_node: None,
      exit_node: None,
      blocked_by_player: false,
    }
  }

  pub fn is_registered(&self) -> bool {
    self.registered
  }
}

/// Shared arbitrator for 2..N packs that must not be used simultaneously
/// (e.g. both halves of a two-way jump). Spec.md §3 `ActionPackMutex`.
#[derive(Debug)]
pub struct ActionPackMutexState {
  pub name_id: u64,
  owners: Vec<ActionPackId>,
  enabled: Option<ActionPackId>,
  users: Vec<UserId>,
  pub directional_valve: bool,
  pub max_user_count: u32,
}

impl ActionPackMutexState {
  pub fn new(name_id: u64) -> Self {
    Self {
      name_id,
      owners: Vec::new(),
      enabled: None,
      users: Vec::new(),
      directional_valve: false,
      max_user_count: 1,
    }
  }

  pub fn owners(&self) -> &[ActionPackId] {
    &self.owners
  }

  pub fn enabled_pack(&self) -> Option<ActionPackId> {
    self.enabled
  }

  pub fn user_count(&self) -> usize {
    self.users.len()
  }

  fn add_owner(&mut self, pack: ActionPackId) {
    if !self.owners.contains(&pack) {
      self.owners.push(pack);
    }
    if self.enabled.is_none() {
      self.enabled = Some(pack);
    }
  }

  fn remove_owner(&mut self, pack: ActionPackId) {
    self.owners.retain(|&p| p != pack);
    if self.enabled == Some(pack) {
      self.enabled = None;
    }
  }

  /// `ActionPackMutex::IsAvailable`: whether `pack` may be used by `user`
  /// right now. `enabled_reservation_holder` is the *enabled sibling's* own
  /// reservation holder (if `enabled` is some other pack) — a reservation
  /// with no active user yet still holds the slot, so a bare `reserve()` on
  /// one side of a two-way pack must block `is_available`/`reserve` on the
  /// other side, not just an in-progress `begin_use`.
  fn is_available(
    &self,
    pack: ActionPackId,
    user: UserId,
    reservation_holder: Option<UserId>,
    enabled_reservation_holder: Option<UserId>,
  ) -> bool {
    match self.enabled {
      Some(enabled) if enabled == pack => {
        reservation_holder.is_none() || reservation_holder == Some(user)
      }
      Some(_other) => {
        self.users.is_empty()
          && (enabled_reservation_holder.is_none() || enabled_reservation_holder == Some(user))
      }
      None => true,
    }
  }

  /// `ActionPackMutex::TryEnable`: claims the mutex for `pack` if no other
  /// owner currently has active users.
  fn try_enable(&mut self, pack: ActionPackId) -> bool {
    match self.enabled {
      Some(enabled) if enabled == pack => true,
      Some(_other) if !self.users.is_empty() => false,
      _ => {
        self.enabled = Some(pack);
        true
      }
    }
  }

  /// `ActionPackMutex::AddUserRef` / `TryAddUserRef`.
  fn add_user(&mut self, pack: ActionPackId, user: UserId) -> bool {
    if self.enabled != Some(pack) && !self.try_enable(pack) {
      return false;
    }
    if self.users.contains(&user) {
      return true;
    }
    if !self.directional_valve && !self.users.is_empty() {
      return false;
    }
    if self.users.len() as u32 >= self.max_user_count.max(1) {
      return false;
    }
    self.users.push(user);
    true
  }

  /// `ActionPackMutex::RemoveUserRef`. Once the user list drains, any owner
  /// may re-enable (spec.md §3 invariant).
  fn remove_user(&mut self, user: UserId) -> bool {
    let before = self.users.len();
    self.users.retain(|&u| u != user);
    if self.users.is_empty() {
      self.enabled = None;
    }
    self.users.len() != before
  }

  fn is_user(&self, user: UserId) -> bool {
    self.users.contains(&user)
  }
}

/// A position-lookup surface the registry uses to attach action packs onto
/// the path-node graph (spec.md §4.2 "Registration").
pub trait PolyLocator {
  /// Returns the node whose polygon contains `pos_ps`, if any.
  fn locate(&self, pos_ps: Vec3) -> Option<NodeId>;

  /// Returns up to `max` additional nodes within `radius` of `pos_ps`,
  /// besides the one returned by [`Self::locate`] — used to add auxiliary
  /// links within an action pack's lateral anim-adjust range.
  fn nearby(&self, pos_ps: Vec3, radius: f32, max: usize) -> Vec<NodeId> {
    let _ = (pos_ps, radius, max);
    Vec::new()
  }
}

/// Observer callbacks fired on the four lifecycle transitions (spec.md §4.2
/// `set_*_observer`).
#[derive(Default)]
pub struct ActionPackObservers {
  pub on_login: Option<Box<dyn FnMut(ActionPackId)>>,
  pub on_register: Option<Box<dyn FnMut(ActionPackId)>>,
  pub on_unregister: Option<Box<dyn FnMut(ActionPackId)>>,
  pub on_logout: Option<Box<dyn FnMut(ActionPackId)>>,
}

/// C2's public surface.
pub struct ActionPackRegistry {
  packs: SlotMap<ActionPackId, ActionPack>,
  mutexes: SlotMap<ActionPackMutexId, SpinMutex<ActionPackMutexState>>,
  pending_registration: VecDeque<ActionPackId>,
  pending_unregistration: VecDeque<ActionPackId>,
  max_registrations_per_tick: u32,
  max_path_nodes_per_side: u32,
  pub observers: ActionPackObservers,
}

impl ActionPackRegistry {
  pub fn new(max_registrations_per_tick: u32, max_path_nodes_per_side: u32) -> Self {
    Self {
      packs: SlotMap::with_key(),
      mutexes: SlotMap::with_key(),
      pending_registration: VecDeque::new(),
      pending_unregistration: VecDeque::new(),
      max_registrations_per_tick,
      max_path_nodes_per_side,
      observers: ActionPackObservers::default(),
    }
  }

  pub fn create_mutex(&mut self, name_id: u64) -> ActionPackMutexId {
    self.mutexes.insert(SpinMutex::new(ActionPackMutexState::new(name_id)))
  }

  pub fn mutex(&self, id: ActionPackMutexId) -> Option<&SpinMutex<ActionPackMutexState>> {
    self.mutexes.get(id)
  }

  /// Allocates a slot and a unique id for `pack`. The pack is not yet
  /// visible to searches until [`Self::request_registration`] completes.
  #[tracing::instrument(skip(self, pack))]
  pub fn login(&mut self, pack: ActionPack) -> Result<ActionPackId, ActionPackError> {
    let mutex_id = pack.mutex_id;
    let id = self.packs.insert(pack);
    if let Some(mid) = mutex_id {
      if let Some(mutex) = self.mutexes.get(mid) {
        mutex.lock().add_owner(id);
      }
    }
    if let Some(cb) = &mut self.observers.on_login {
      cb(id);
    }
    Ok(id)
  }

  #[tracing::instrument(skip(self))]
  pub fn logout(&mut self, id: ActionPackId) {
    if let Some(pack) = self.packs.get(id) {
      if let Some(mid) = pack.mutex_id {
        if let Some(mutex) = self.mutexes.get(mid) {
          mutex.lock().remove_owner(id);
        }
      }
    }
    self.packs.remove(id);
    self.pending_registration.retain(|&p| p != id);
    self.pending_unregistration.retain(|&p| p != id);
    if let Some(cb) = &mut self.observers.on_logout {
      cb(id);
    }
  }

  pub fn request_registration(&mut self, id: ActionPackId) {
    if self.packs.contains_key(id) && !self.pending_registration.contains(&id) {
      self.pending_registration.push_back(id);
    }
  }

  pub fn request_unregistration(&mut self, id: ActionPackId) {
    if self.packs.contains_key(id) {
      self.pending_unregistration.push_back(id);
    }
  }

  pub fn lookup_logged_in(&self, id: ActionPackId) -> Option<&ActionPack> {
    self.packs.get(id)
  }

  pub fn lookup_registered(&self, id: ActionPackId) -> Option<&ActionPack> {
    self.packs.get(id).filter(|p| p.registered)
  }

  /// Per-tick processing (spec.md §4.2 `update()`):
  /// (a) logout dynamic packs whose owner died; (b) register up to
  /// `max_registrations_per_tick` pending packs; (c) unregister all pending
  /// packs; (d) refresh dirty cost linkages.
  #[tracing::instrument(skip(self, graph, locator, owner_alive))]
  pub fn update(
    &mut self,
    graph: &mut PathNodeGraph,
    locator: &dyn PolyLocator,
    owner_alive: &dyn Fn(UserId) -> bool,
  ) {
    let stale: Vec<ActionPackId> = self
      .packs
      .iter()
      .filter(|(_, p)| p.dynamic)
      .filter_map(|(id, p)| p.owner.filter(|&o| !owner_alive(o)).map(|_| id))
      .collect();
    for id in stale {
      self.request_unregistration(id);
      self.logout(id);
    }

    let mut processed = 0;
    while processed < self.max_registrations_per_tick {
      let Some(id) = self.pending_registration.pop_front() else { break };
      processed += 1;
      let _ = self.register(id, graph, locator);
    }

    while let Some(id) = self.pending_unregistration.pop_front() {
      self.unregister(id, graph);
    }

    let dirty: Vec<ActionPackId> = self
      .packs
      .iter()
      .filter(|(_, p)| p.cost_dirty && p.registered)
      .map(|(id, _)| id)
      .collect();
    for id in dirty {
      self.republish_cost(id, graph);
    }
  }

  /// Projects the pack's source position onto the nav mesh, allocates
  /// `ActionPackEnter`/`ActionPackExit` nodes, links them to the containing
  /// polygons, and (optionally) links nearby polygons within the anim-adjust
  /// range as auxiliary entries (spec.md §4.2 "Registration").
  fn register(
    &mut self,
    id: ActionPackId,
    graph: &mut PathNodeGraph,
    locator: &dyn PolyLocator,
  ) -> Result<(), ActionPackError> {
    let pack = self.packs.get(id).ok_or(ActionPackError::StaleHandle)?;
    if pack.registered {
      return Err(ActionPackError::AlreadyRegistered);
    }
    let source_node = locator.locate(pack.source_pos_ps).ok_or(ActionPackError::SourceNotOnMesh)?;
    let dest_node = locator.locate(pack.dest_pos_ps).ok_or(ActionPackError::SourceNotOnMesh)?;
    let (source_pos, dest_pos, extra_cost, anim_range) = {
      let pack = self.packs.get(id).unwrap();
      (pack.source_pos_ps, pack.dest_pos_ps, pack.extra_path_cost, pack.anim_adjust_range)
    };

    let enter = graph
      .add_mesh_independent_node(PathNodeKind::ActionPackEnter { pack: id }, source_pos, extra_cost)
      .map_err(|_| ActionPackError::PacksExhausted)?;
    let exit = graph
      .add_mesh_independent_node(PathNodeKind::ActionPackExit { pack: id }, dest_pos, 0)
      .map_err(|_| ActionPackError::PacksExhausted)?;

    graph
      .add_bidirectional_link(source_node, enter, (source_pos, source_pos), (source_pos, source_pos))
      .map_err(|_| ActionPackError::PacksExhausted)?;
    graph
      .add_link(enter, exit, source_pos, dest_pos, LinkKind::Outgoing, None)
      .map_err(|_| ActionPackError::PacksExhausted)?;
    graph
      .add_bidirectional_link(exit, dest_node, (dest_pos, dest_pos), (dest_pos, dest_pos))
      .map_err(|_| ActionPackError::PacksExhausted)?;

    let lateral = anim_range.1.max(anim_range.0.abs());
    if lateral > 0.0 {
      for aux in locator.nearby(source_pos, lateral, self.max_path_nodes_per_side as usize) {
        let _ =
          graph.add_bidirectional_link(aux, enter, (source_pos, source_pos), (source_pos, source_pos));
      }
    }

    let pack = self.packs.get_mut(id).unwrap();
    pack.enter_node = Some(enter);
    pack.exit_node = Some(exit);
    pack.registered = true;
    pack.cost_dirty = true;
    if let Some(cb) = &mut self.observers.on_register {
      cb(id);
    }
    Ok(())
  }

  fn unregister(&mut self, id: ActionPackId, graph: &mut PathNodeGraph) {
    if let Some(pack) = self.packs.get_mut(id) {
      if let Some(enter) = pack.enter_node.take() {
        graph.remove_poly_ex(enter);
      }
      if let Some(exit) = pack.exit_node.take() {
        graph.remove_poly_ex(exit);
      }
      pack.registered = false;
    }
    if let Some(cb) = &mut self.observers.on_unregister {
      cb(id);
    }
  }

  /// Re-publishes `pack`'s extra path cost to its owned path-nodes
  /// (spec.md §4.2 "Cost contract").
  fn republish_cost(&mut self, id: ActionPackId, graph: &mut PathNodeGraph) {
    let Some(pack) = self.packs.get_mut(id) else { return };
    let cost = pack.extra_path_cost;
    if let Some(enter) = pack.enter_node {
      if let Some(node) = graph.node_mut(enter) {
        node.extra_cost = cost;
      }
    }
    pack.cost_dirty = false;
  }

  /// Marks `id`'s cost dirty so the next `update()` re-publishes it
  /// (spec.md §4.2: rigid-body blockage, mutex user count, enable/disable,
  /// single-use state, and usage-delay changes all trigger this).
  pub fn mark_cost_dirty(&mut self, id: ActionPackId) {
    if let Some(pack) = self.packs.get_mut(id) {
      pack.cost_dirty = true;
    }
  }

  pub fn set_extra_path_cost(&mut self, id: ActionPackId, cost: i8) {
    if let Some(pack) = self.packs.get_mut(id) {
      pack.extra_path_cost = cost;
      pack.cost_dirty = true;
    }
  }

  pub fn set_player_blocked(&mut self, id: ActionPackId, blocked: bool) {
    if let Some(pack) = self.packs.get_mut(id) {
      pack.blocked_by_player = blocked;
    }
  }

  pub fn add_faction_id(&mut self, id: ActionPackId, faction_bit: u32) {
    if let Some(pack) = self.packs.get_mut(id) {
      pack.faction_mask |= faction_bit;
    }
  }

  pub fn remove_faction_id(&mut self, id: ActionPackId, faction_bit: u32) {
    if let Some(pack) = self.packs.get_mut(id) {
      pack.faction_mask &= !faction_bit;
    }
  }

  pub fn find_by_spawner_id(&self, name: &str) -> Vec<ActionPackId> {
    self.packs.iter().filter(|(_, p)| p.name == name).map(|(id, _)| id).collect()
  }

  pub fn find_by_type_in_radius(&self, type_mask: u32, center: Vec3, radius: f32) -> Vec<ActionPackId> {
    self
      .packs
      .iter()
      .filter(|(_, p)| (p.skill_mask & type_mask) != 0)
      .filter(|(_, p)| p.source_pos_ps.distance_squared(center) <= radius * radius)
      .map(|(id, _)| id)
      .collect()
  }

  pub fn find_by_type_in_region(&self, type_mask: u32, region_min: Vec3, region_max: Vec3) -> Vec<ActionPackId> {
    self
      .packs
      .iter()
      .filter(|(_, p)| (p.skill_mask & type_mask) != 0)
      .filter(|(_, p)| {
        let pos = p.source_pos_ps;
        pos.x >= region_min.x
          && pos.x <= region_max.x
          && pos.y >= region_min.y
          && pos.y <= region_max.y
          && pos.z >= region_min.z
          && pos.z <= region_max.z
      })
      .map(|(id, _)| id)
      .collect()
  }

  /// `FindActionPacksByTypeOnSegment`: packs of the given type whose source
  /// position lies within `radius` of the segment `a..b`.
  pub fn find_by_type_on_segment(&self, type_mask: u32, a: Vec3, b: Vec3, radius: f32) -> Vec<ActionPackId> {
    let ab = b - a;
    let len_sq = ab.length_squared();
    self
      .packs
      .iter()
      .filter(|(_, p)| (p.skill_mask & type_mask) != 0)
      .filter(|(_, p)| {
        let t = if len_sq > 0.0 { ((p.source_pos_ps - a).dot(ab) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
        let closest = a + ab * t;
        closest.distance_squared(p.source_pos_ps) <= radius * radius
      })
      .map(|(id, _)| id)
      .collect()
  }

  /// `FindClosestActionPackByType`: nearest pack of the given type to
  /// `center`, if any exist within `max_radius`.
  pub fn find_closest_by_type(&self, type_mask: u32, center: Vec3, max_radius: f32) -> Option<ActionPackId> {
    self
      .packs
      .iter()
      .filter(|(_, p)| (p.skill_mask & type_mask) != 0)
      .map(|(id, p)| (id, p.source_pos_ps.distance_squared(center)))
      .filter(|&(_, dist_sq)| dist_sq <= max_radius * max_radius)
      .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
      .map(|(id, _)| id)
  }

  pub fn registered_count(&self) -> usize {
    self.packs.values().filter(|p| p.registered).count()
  }

  pub fn allocated_count(&self) -> usize {
    self.packs.len()
  }

  /// `GetTypeCounts`: number of logged-in packs matching each bit of
  /// `type_mask`, keyed by the matching bit. Diagnostic counter used by the
  /// test suite's invariant checks (spec.md §8, invariant 3/4).
  pub fn get_type_counts(&self, type_mask: u32) -> Vec<(u32, usize)> {
    let mut counts = Vec::new();
    let mut bit = 1u32;
    while bit != 0 && bit <= type_mask {
      if type_mask & bit != 0 {
        let count = self.packs.values().filter(|p| p.skill_mask & bit != 0).count();
        if count > 0 {
          counts.push((bit, count));
        }
      }
      bit = bit.wrapping_shl(1);
      if bit == 0 {
        break;
      }
    }
    counts
  }

  /// Release-mode no-op; in a validated build walks every owned node/mutex
  /// relationship for consistency (spec.md §4.2's pairing with C1's
  /// validation toggle).
  pub fn debug_check_for_corruption(&self, graph: &PathNodeGraph) -> Result<(), String> {
    for (id, pack) in self.packs.iter() {
      if !pack.registered {
        continue;
      }
      let Some(enter) = pack.enter_node else {
        return Err(format!("{id:?} is registered but has no enter node"));
      };
      match graph.node(enter).map(|n| n.kind) {
        Some(PathNodeKind::ActionPackEnter { pack: owner }) if owner == id => {}
        _ => return Err(format!("{id:?}'s enter node does not point back")),
      }
    }
    Ok(())
  }

  // --- mutex arbitration (spec.md §4.2 "Mutex arbitration") ---

  pub fn is_available(&self, id: ActionPackId, user: UserId) -> bool {
    let Some(pack) = self.packs.get(id) else { return false };
    let Some(mid) = pack.mutex_id else { return true };
    let Some(mutex) = self.mutexes.get(mid) else { return true };
    let guard = mutex.lock();
    let enabled_reservation = self.enabled_sibling_reservation(&guard, id);
    guard.is_available(id, user, pack.reservation_holder, enabled_reservation)
  }

  /// The reservation holder of the mutex's currently-enabled pack, when that
  /// pack isn't `id` itself — used so `is_available`/`reserve` can see a
  /// sibling's bare reservation even before it calls `begin_use`.
  fn enabled_sibling_reservation(&self, mutex: &ActionPackMutexState, id: ActionPackId) -> Option<UserId> {
    mutex
      .enabled_pack()
      .filter(|&enabled| enabled != id)
      .and_then(|enabled| self.packs.get(enabled))
      .and_then(|pack| pack.reservation_holder)
  }

  /// `reserve(process)`: succeeds iff the mutex can be enabled for `user`
  /// AND the pack has no other reservation holder.
  pub fn reserve(&mut self, id: ActionPackId, user: UserId) -> Result<(), ActionPackError> {
    let (mutex_id, already_reserved) = {
      let pack = self.packs.get(id).ok_or(ActionPackError::StaleHandle)?;
      (pack.mutex_id, pack.reservation_holder)
    };
    if already_reserved.is_some() && already_reserved != Some(user) {
      return Err(ActionPackError::MutexUnavailable);
    }
    if let Some(mid) = mutex_id {
      let mutex = self.mutexes.get(mid).ok_or(ActionPackError::StaleHandle)?;
      let enabled_reservation = self.enabled_sibling_reservation(&mutex.lock(), id);
      let mut guard = mutex.lock();
      if !guard.is_available(id, user, already_reserved, enabled_reservation) {
        return Err(ActionPackError::MutexUnavailable);
      }
      if !guard.try_enable(id) {
        return Err(ActionPackError::MutexUnavailable);
      }
    }
    self.packs.get_mut(id).unwrap().reservation_holder = Some(user);
    Ok(())
  }

  /// `release(process)`: clears the reservation. The mutex user refcount is
  /// only decremented by [`Self::end_use`], once traversal actually
  /// completes (spec.md §4.2).
  pub fn release(&mut self, id: ActionPackId, user: UserId) {
    if let Some(pack) = self.packs.get_mut(id) {
      if pack.reservation_holder == Some(user) {
        pack.reservation_holder = None;
      }
    }
  }

  pub fn begin_use(&mut self, id: ActionPackId, user: UserId) -> bool {
    let Some(pack) = self.packs.get_mut(id) else { return false };
    pack.used = true;
    pack.cost_dirty = true;
    let Some(mid) = pack.mutex_id else { return true };
    let Some(mutex) = self.mutexes.get(mid) else { return true };
    mutex.lock().add_user(id, user)
  }

  pub fn end_use(&mut self, id: ActionPackId, user: UserId) {
    let Some(pack) = self.packs.get_mut(id) else { return };
    pack.cost_dirty = true;
    let Some(mid) = pack.mutex_id else { return };
    if let Some(mutex) = self.mutexes.get(mid) {
      mutex.lock().remove_user(user);
    }
  }

  pub fn is_user(&self, id: ActionPackId, user: UserId) -> bool {
    let Some(pack) = self.packs.get(id) else { return false };
    let Some(mid) = pack.mutex_id else { return false };
    self.mutexes.get(mid).map(|m| m.lock().is_user(user)).unwrap_or(false)
  }
}

#[cfg(test)]
#[path = "action_pack_test.rs"]
mod test;
