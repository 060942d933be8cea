//! # View Binder
//!
//! Hooks for an external visual representation. The runtime calls them
//! and never waits on or depends on their effects.

use crate::entity::EntityId;

/// Receives binding notifications from the world. All methods default to
/// no-ops.
#[allow(unused_variables)]
pub trait ViewBinder: Send {
    /// `entity` was bound to a scene for the first time.
    fn on_bound(&mut self, entity: EntityId, type_name: &'static str) {}

    /// A bound `entity` moved under `new_owner`.
    fn on_reparented(&mut self, entity: EntityId, new_owner: EntityId) {}

    /// A bound `entity` is being disposed.
    fn on_unbound(&mut self, entity: EntityId) {}
}
