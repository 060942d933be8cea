//! # Children and Components
//!
//! Typed creation helpers and removal. Creation helpers check every
//! precondition before constructing, so a failed call allocates nothing.

use super::behavior::{Behavior, TypeKey};
use super::id::EntityId;
use super::status::Owner;
use super::world::World;
use crate::error::{EntityError, EntityResult};

impl World {
    // =========================================================================
    // Children
    // =========================================================================

    /// Creates a `T` as a child of `parent` under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Disposed`] if `parent` is stale.
    pub fn add_child<T: Behavior + Default>(
        &mut self,
        parent: EntityId,
        from_pool: bool,
    ) -> EntityResult<EntityId> {
        let id = self.ids.generate_id();
        self.add_child_with_id::<T>(parent, id, from_pool)
    }

    /// Creates a `T` as a child of `parent` under business id `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Disposed`] if `parent` is stale and
    /// [`EntityError::DuplicateChild`] if `id` is taken.
    pub fn add_child_with_id<T: Behavior + Default>(
        &mut self,
        parent: EntityId,
        id: u64,
        from_pool: bool,
    ) -> EntityResult<EntityId> {
        self.check_child_slot(parent, id)?;
        let child = self.create::<T>(from_pool);
        self.adopt(child, id, Owner::ChildOf(parent))
    }

    /// Adds an existing value as a child of `parent` under a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Disposed`] if `parent` is stale.
    pub fn add_child_value<T: Behavior>(
        &mut self,
        parent: EntityId,
        value: T,
    ) -> EntityResult<EntityId> {
        let id = self.ids.generate_id();
        self.check_child_slot(parent, id)?;
        let child = self.create_value(value);
        self.adopt(child, id, Owner::ChildOf(parent))
    }

    /// Disposes the child of `parent` with business id `id`.
    pub fn remove_child(&mut self, parent: EntityId, id: u64) -> bool {
        let Some(child) = self.get_child(parent, id) else {
            return false;
        };
        self.dispose(child);
        true
    }

    /// Disposes every child of `parent`.
    pub fn clear_children(&mut self, parent: EntityId) {
        for child in self.children(parent) {
            self.dispose(child);
        }
    }

    fn check_child_slot(&self, parent: EntityId, id: u64) -> EntityResult<()> {
        if parent.is_null() {
            return Err(EntityError::NullOwner { entity: "child" });
        }
        if self.is_disposed(parent) {
            return Err(EntityError::Disposed(parent));
        }
        if self.get_child(parent, id).is_some() {
            return Err(EntityError::DuplicateChild { owner: parent, id });
        }
        Ok(())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Creates a `T` and attaches it to `owner`. The component takes the
    /// owner's business id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnboundOwner`] if `owner` is not bound,
    /// [`EntityError::DuplicateComponent`] if it already has a `T`, and
    /// [`EntityError::Disposed`] if it is stale.
    pub fn add_component<T: Behavior + Default>(
        &mut self,
        owner: EntityId,
        from_pool: bool,
    ) -> EntityResult<EntityId> {
        let id = self.business_id(owner).ok_or(EntityError::Disposed(owner))?;
        self.add_component_with_id::<T>(owner, id, from_pool)
    }

    /// Creates a `T` with business id `id` and attaches it to `owner`.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn add_component_with_id<T: Behavior + Default>(
        &mut self,
        owner: EntityId,
        id: u64,
        from_pool: bool,
    ) -> EntityResult<EntityId> {
        self.check_component_slot(owner, TypeKey::of::<T>())?;
        let component = self.create::<T>(from_pool);
        self.adopt(component, id, Owner::ComponentOf(owner))
    }

    /// Attaches an existing value to `owner` as a component.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn add_component_value<T: Behavior>(
        &mut self,
        owner: EntityId,
        value: T,
    ) -> EntityResult<EntityId> {
        let id = self.business_id(owner).ok_or(EntityError::Disposed(owner))?;
        self.check_component_slot(owner, TypeKey::of::<T>())?;
        let component = self.create_value(value);
        self.adopt(component, id, Owner::ComponentOf(owner))
    }

    /// Removes and disposes the component of type `K`.
    pub fn remove_component<K: Behavior>(&mut self, owner: EntityId) -> bool {
        self.remove_component_by_key(owner, TypeKey::of::<K>())
    }

    /// Removes and disposes the component stored under exactly `key`.
    pub fn remove_component_by_key(&mut self, owner: EntityId, key: TypeKey) -> bool {
        let Some(component) = self
            .live(owner)
            .and_then(|node| node.components.as_ref())
            .and_then(|components| components.get(&key).copied())
        else {
            return false;
        };
        self.remove_attached(owner, component);
        true
    }

    /// Removes and disposes `component`, verifying it is the one currently
    /// attached to `owner` under its type.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotAComponent`] if `component` is not attached
    /// to `owner`.
    pub fn remove_component_entity(
        &mut self,
        owner: EntityId,
        component: EntityId,
    ) -> EntityResult<()> {
        let key = self
            .live(component)
            .filter(|node| node.owner == Owner::ComponentOf(owner))
            .map(|node| node.type_key)
            .ok_or(EntityError::NotAComponent(component))?;
        let attached = self
            .live(owner)
            .and_then(|node| node.components.as_ref())
            .and_then(|components| components.get(&key).copied());
        if attached != Some(component) {
            return Err(EntityError::NotAComponent(component));
        }
        self.remove_attached(owner, component);
        Ok(())
    }

    /// Unregisters, announces the removal to siblings while the component
    /// is still attached, detaches and disposes.
    fn remove_attached(&mut self, owner: EntityId, component: EntityId) {
        self.registry.unregister(component);
        if let Some(keys) = self.live(component).map(super::arena::EntityNode::announced_keys) {
            self.notify_component_changed(owner, &keys, Some(component));
        }
        self.detach(component);
        self.dispose(component);
    }

    fn check_component_slot(&self, owner: EntityId, key: TypeKey) -> EntityResult<()> {
        if owner.is_null() {
            return Err(EntityError::NullOwner {
                entity: key.name(),
            });
        }
        let node = self.live(owner).ok_or(EntityError::Disposed(owner))?;
        if node.instance_id == 0 {
            return Err(EntityError::UnboundOwner { owner });
        }
        if node
            .components
            .as_ref()
            .is_some_and(|components| components.contains_key(&key))
        {
            return Err(EntityError::DuplicateComponent {
                owner,
                component: key.name(),
            });
        }
        Ok(())
    }

    /// Assigns `id` and links a freshly created entity; releases it again if
    /// linking fails.
    fn adopt(&mut self, entity: EntityId, id: u64, target: Owner) -> EntityResult<EntityId> {
        if let Some(node) = self.live_mut(entity) {
            node.id = id;
        }
        let linked = match target {
            Owner::ChildOf(parent) => self.set_parent(entity, parent),
            Owner::ComponentOf(owner) => self.attach_component(entity, owner),
            Owner::Detached => Ok(()),
        };
        match linked {
            Ok(()) => Ok(entity),
            Err(err) => {
                self.dispose(entity);
                Err(err)
            }
        }
    }
}
