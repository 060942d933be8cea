//! # Entity System
//!
//! Update queues, one per callback phase. Queues are rotating sets: a live
//! entry is pushed back after each visit; stale entries are dropped when
//! they reach the front.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use super::strategy::UpdateStrategy;
use crate::entity::{Callbacks, EntityId};

/// Callback phase a queue serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `update`, driven by rate strategies.
    Update,
    /// `late_update`, once per tick.
    LateUpdate,
}

impl Phase {
    /// Both phases in tick order.
    pub const ALL: [Self; 2] = [Self::Update, Self::LateUpdate];

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Update => 0,
            Self::LateUpdate => 1,
        }
    }

    #[inline]
    const fn flag(self) -> Callbacks {
        match self {
            Self::Update => Callbacks::UPDATE,
            Self::LateUpdate => Callbacks::LATE_UPDATE,
        }
    }
}

/// Scheduler state owned by the world.
#[derive(Default)]
pub struct EntitySystem {
    queues: [VecDeque<EntityId>; 2],
    /// Entities currently enrolled per phase; guards against double entries.
    enrolled: [HashSet<EntityId>; 2],
    strategy: Option<Box<dyn UpdateStrategy>>,
}

impl EntitySystem {
    /// Creates empty queues with no global strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `entity` into every phase in `callbacks` it is not already in.
    pub fn register(&mut self, entity: EntityId, callbacks: Callbacks) {
        for phase in Phase::ALL {
            if callbacks.contains(phase.flag()) && self.enrolled[phase.index()].insert(entity) {
                self.queues[phase.index()].push_back(entity);
            }
        }
    }

    /// Withdraws `entity` from every phase. Its queue entries are dropped
    /// lazily when they reach the front.
    pub fn unregister(&mut self, entity: EntityId) {
        for enrolled in &mut self.enrolled {
            enrolled.remove(&entity);
        }
    }

    /// Withdraws `entity` from one phase.
    pub fn forget(&mut self, phase: Phase, entity: EntityId) {
        self.enrolled[phase.index()].remove(&entity);
    }

    /// Returns `true` if `entity` is enrolled in `phase`.
    #[must_use]
    pub fn is_registered(&self, phase: Phase, entity: EntityId) -> bool {
        self.enrolled[phase.index()].contains(&entity)
    }

    /// Number of queue entries in `phase`, stale ones included.
    #[must_use]
    pub fn pending(&self, phase: Phase) -> usize {
        self.queues[phase.index()].len()
    }

    /// Number of entities enrolled in `phase`.
    #[must_use]
    pub fn registered(&self, phase: Phase) -> usize {
        self.enrolled[phase.index()].len()
    }

    /// Pops the front entry of `phase`.
    pub fn pop(&mut self, phase: Phase) -> Option<EntityId> {
        self.queues[phase.index()].pop_front()
    }

    /// Re-enqueues `entity` at the back of `phase`.
    pub fn push_back(&mut self, phase: Phase, entity: EntityId) {
        self.queues[phase.index()].push_back(entity);
    }

    /// Installs the global update strategy.
    pub fn set_strategy(&mut self, strategy: Box<dyn UpdateStrategy>) {
        self.strategy = Some(strategy);
    }

    /// Removes the global update strategy.
    pub fn clear_strategy(&mut self) -> Option<Box<dyn UpdateStrategy>> {
        self.strategy.take()
    }

    /// Global update strategy.
    pub fn strategy_mut(&mut self) -> Option<&mut (dyn UpdateStrategy + 'static)> {
        self.strategy.as_deref_mut()
    }

    /// Drops every queue entry and enrollment.
    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
        for enrolled in &mut self.enrolled {
            enrolled.clear();
        }
    }
}

impl fmt::Debug for EntitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySystem")
            .field("update", &self.queues[0].len())
            .field("late_update", &self.queues[1].len())
            .field("strategy", &self.strategy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn test_register_by_callbacks() {
        let mut system = EntitySystem::new();
        system.register(e(1), Callbacks::UPDATE);
        system.register(e(2), Callbacks::UPDATE | Callbacks::LATE_UPDATE);
        system.register(e(3), Callbacks::NONE);

        assert_eq!(system.pending(Phase::Update), 2);
        assert_eq!(system.pending(Phase::LateUpdate), 1);
        assert!(!system.is_registered(Phase::Update, e(3)));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut system = EntitySystem::new();
        system.register(e(1), Callbacks::UPDATE);
        system.register(e(1), Callbacks::UPDATE);
        assert_eq!(system.pending(Phase::Update), 1);
    }

    #[test]
    fn test_unregister_is_lazy() {
        let mut system = EntitySystem::new();
        system.register(e(1), Callbacks::UPDATE);
        system.unregister(e(1));
        assert_eq!(system.pending(Phase::Update), 1);
        assert_eq!(system.registered(Phase::Update), 0);
        assert_eq!(system.pop(Phase::Update), Some(e(1)));
    }

    #[test]
    fn test_rotation_order() {
        let mut system = EntitySystem::new();
        system.register(e(1), Callbacks::UPDATE);
        system.register(e(2), Callbacks::UPDATE);
        let first = system.pop(Phase::Update).unwrap();
        system.push_back(Phase::Update, first);
        assert_eq!(system.pop(Phase::Update), Some(e(2)));
        assert_eq!(system.pop(Phase::Update), Some(e(1)));
    }
}
