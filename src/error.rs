//! Crate-wide error kinds. Every fallible surface returns one of these via
//! `Result`; nothing in `navcore` panics or unwinds on an expected failure
//! (slot exhaustion, a stale handle, a closed-list overflow). See
//! `spec.md` §7 / `SPEC_FULL.md` §7.

use thiserror::Error;

/// Failures from the path-node graph (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("the node slab is full")]
  NodesExhausted,
  #[error("the link slab is full")]
  LinksExhausted,
  #[error("the referenced node handle is stale or unknown")]
  StaleNode,
}

/// Failures from the action-pack registry (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionPackError {
  #[error("the action-pack slab is full")]
  PacksExhausted,
  #[error("the action pack is not logged in")]
  NotLoggedIn,
  #[error("the action pack is already registered")]
  AlreadyRegistered,
  #[error("the action pack's source position is not on any polygon")]
  SourceNotOnMesh,
  #[error("the referenced action-pack handle is stale or unknown")]
  StaleHandle,
  #[error("the mutex already has an enabled pack owned by someone else")]
  MutexUnavailable,
}

/// Failures from the A* engine (C3). Closed-list overflow is *not* an error
/// kind here — it is reported as a flag on [`crate::search::SearchOutcome`]
/// alongside a still-usable partial result, per spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
  #[error("no start location was provided")]
  NoStarts,
  #[error("too many goal locations (max 64)")]
  TooManyGoals,
}

/// Failures from the path builder (C4) / radial engine (C5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
  #[error("a node referenced by the visited-node table no longer resolves")]
  DanglingNode,
  #[error("the goal key was never visited by the search")]
  GoalNotVisited,
}

/// Failures from the path request manager (C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
  #[error("the request slab is full")]
  RequestsExhausted,
  #[error("the request handle is stale or unknown")]
  StaleHandle,
  #[error("the request is pending deletion")]
  PendingDeletion,
}
