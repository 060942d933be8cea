//! # Load Contract
//!
//! Synchronous half of asynchronous initialization. An async wrapper calls
//! `begin_*_load`, awaits its external work, hops back to the driver thread
//! and calls [`World::complete_load`]. Until then the entity is attached and
//! bound but neither initialized nor scheduled.

use crate::entity::{Behavior, EntityId, EntityStatus, Owner, TypeKey, World};
use crate::error::{EntityError, EntityResult};

/// How the external load ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Finish initialization.
    Loaded,
    /// The load was cancelled.
    Cancelled,
    /// The load failed with a reason.
    Failed(String),
}

/// An entity attached but awaiting [`World::complete_load`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending load must be completed"]
pub struct PendingLoad {
    entity: EntityId,
    target: Owner,
    type_name: &'static str,
}

impl PendingLoad {
    /// The entity being loaded.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Where the entity was attached.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> Owner {
        self.target
    }
}

impl World {
    /// Creates a `T`, attaches it to `owner` as a component and returns the
    /// pending load.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn begin_component_load<T: Behavior + Default>(
        &mut self,
        owner: EntityId,
        from_pool: bool,
    ) -> EntityResult<PendingLoad> {
        let id = self.business_id(owner).ok_or(EntityError::Disposed(owner))?;
        self.begin_load::<T>(Owner::ComponentOf(owner), id, from_pool)
    }

    /// Creates a `T` as a child of `parent` and returns the pending load.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_child`].
    pub fn begin_child_load<T: Behavior + Default>(
        &mut self,
        parent: EntityId,
        from_pool: bool,
    ) -> EntityResult<PendingLoad> {
        let id = self.ids.generate_id();
        self.begin_load::<T>(Owner::ChildOf(parent), id, from_pool)
    }

    fn begin_load<T: Behavior + Default>(
        &mut self,
        target: Owner,
        id: u64,
        from_pool: bool,
    ) -> EntityResult<PendingLoad> {
        let entity = self.create::<T>(from_pool);
        if let Some(node) = self.live_mut(entity) {
            node.id = id;
            node.status.insert(EntityStatus::LOADING);
        }
        match self.link(entity, target) {
            Ok(_) => Ok(PendingLoad {
                entity,
                target,
                type_name: TypeKey::of::<T>().name(),
            }),
            Err(err) => {
                self.dispose(entity);
                Err(err)
            }
        }
    }

    /// Finishes a pending load.
    ///
    /// `Loaded` initializes and schedules the entity and, for components,
    /// announces it to dependent siblings. `Cancelled` and `Failed` remove
    /// the entity from its owner and dispose it.
    ///
    /// # Errors
    ///
    /// - [`EntityError::LoadCancelled`] / [`EntityError::LoadFailed`] for
    ///   the aborted outcomes
    /// - [`EntityError::Disposed`] if the entity was disposed while loading
    pub fn complete_load(
        &mut self,
        pending: PendingLoad,
        outcome: LoadOutcome,
    ) -> EntityResult<EntityId> {
        let PendingLoad {
            entity,
            target,
            type_name,
        } = pending;
        if self.is_disposed(entity) {
            return Err(EntityError::Disposed(entity));
        }

        let err = match outcome {
            LoadOutcome::Loaded => {
                if let Some(node) = self.live_mut(entity) {
                    node.status.remove(EntityStatus::LOADING);
                }
                if self.is_bound(entity) {
                    self.activate(entity);
                }
                if target.is_component() {
                    self.component_added(entity);
                }
                return Ok(entity);
            }
            LoadOutcome::Cancelled => {
                tracing::warn!(%entity, type_name, "load cancelled");
                EntityError::LoadCancelled(type_name)
            }
            LoadOutcome::Failed(reason) => {
                tracing::warn!(%entity, type_name, %reason, "load failed");
                EntityError::LoadFailed {
                    component: type_name,
                    reason,
                }
            }
        };

        match self.owner_of(entity) {
            Some(Owner::ComponentOf(owner)) => {
                if self.remove_component_entity(owner, entity).is_err() {
                    self.dispose(entity);
                }
            }
            _ => self.dispose(entity),
        }
        Err(err)
    }
}
