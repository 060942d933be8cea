//! # Ownership
//!
//! Parenting, component attachment and scene propagation. Validation runs
//! before any mutation, so a rejected call leaves the tree untouched.

use std::collections::BTreeMap;

use super::id::EntityId;
use super::status::Owner;
use super::world::World;
use crate::error::{EntityError, EntityResult};

impl World {
    /// Makes `entity` a tree child of `parent`, keyed by its business id.
    ///
    /// If this binds the entity to a scene for the first time, every newly
    /// bound entity in its subtree is initialized and scheduled.
    ///
    /// # Errors
    ///
    /// - [`EntityError::NullOwner`], [`EntityError::SelfOwner`],
    ///   [`EntityError::OwnershipCycle`] for an invalid parent
    /// - [`EntityError::DuplicateChild`] if the id is taken under `parent`
    /// - [`EntityError::Disposed`] if either handle is stale
    /// - [`EntityError::UnboundOwner`] when moving a bound entity under an
    ///   unbound parent
    pub fn set_parent(&mut self, entity: EntityId, parent: EntityId) -> EntityResult<()> {
        let newly_bound = self.link(entity, Owner::ChildOf(parent))?;
        for bound in newly_bound {
            self.activate(bound);
        }
        Ok(())
    }

    /// Attaches `entity` to `owner` as a component keyed by its type.
    ///
    /// Siblings that depend on the component's type are re-evaluated and
    /// the component's own dependencies are registered.
    ///
    /// # Errors
    ///
    /// - [`EntityError::UnboundOwner`] if `owner` is not bound to a scene
    /// - [`EntityError::DuplicateComponent`] if `owner` already has this type
    /// - the same owner errors as [`World::set_parent`]
    pub fn attach_component(&mut self, entity: EntityId, owner: EntityId) -> EntityResult<()> {
        let newly_bound = self.link(entity, Owner::ComponentOf(owner))?;
        for bound in newly_bound {
            self.activate(bound);
        }
        self.component_added(entity);
        Ok(())
    }

    /// Validates and applies an ownership change.
    ///
    /// Returns the entities that became bound, in pre-order. They still need
    /// [`World::activate`].
    pub(crate) fn link(&mut self, entity: EntityId, target: Owner) -> EntityResult<Vec<EntityId>> {
        let Some(owner) = target.entity() else {
            return Ok(Vec::new());
        };
        let node = self.live(entity).ok_or(EntityError::Disposed(entity))?;
        let type_name = node.type_key.name();
        let (type_key, id, current, was_bound, scene_root) = (
            node.type_key,
            node.id,
            node.owner,
            node.instance_id != 0,
            node.scene_root,
        );

        if owner.is_null() {
            return Err(EntityError::NullOwner { entity: type_name });
        }
        if owner == entity {
            return Err(EntityError::SelfOwner { entity: type_name });
        }
        if current == target {
            tracing::warn!(%entity, %owner, type_name, "owner is already set");
            return Ok(Vec::new());
        }
        let owner_node = self.live(owner).ok_or(EntityError::Disposed(owner))?;
        let owner_scene = owner_node.scene;
        let owner_bound = owner_node.instance_id != 0;

        match target {
            Owner::ComponentOf(_) => {
                if !owner_bound {
                    return Err(EntityError::UnboundOwner { owner });
                }
                let taken = owner_node
                    .components
                    .as_ref()
                    .is_some_and(|components| components.contains_key(&type_key));
                if taken {
                    return Err(EntityError::DuplicateComponent {
                        owner,
                        component: type_name,
                    });
                }
            }
            Owner::ChildOf(_) => {
                let taken = owner_node
                    .children
                    .as_ref()
                    .and_then(|children| children.get(&id))
                    .is_some_and(|existing| *existing != entity);
                if taken {
                    return Err(EntityError::DuplicateChild { owner, id });
                }
                if was_bound && !owner_bound && !scene_root {
                    return Err(EntityError::UnboundOwner { owner });
                }
            }
            Owner::Detached => {}
        }
        if self.is_ancestor(entity, owner) {
            return Err(EntityError::OwnershipCycle { entity, owner });
        }

        self.detach(entity);
        if let Some(owner_node) = self.live_mut(owner) {
            match target {
                Owner::ChildOf(_) => {
                    owner_node
                        .children
                        .get_or_insert_with(BTreeMap::new)
                        .insert(id, entity);
                }
                Owner::ComponentOf(_) => {
                    owner_node
                        .components
                        .get_or_insert_with(BTreeMap::new)
                        .insert(type_key, entity);
                }
                Owner::Detached => {}
            }
        }
        if let Some(node) = self.live_mut(entity) {
            node.owner = target;
        }

        let scene = if scene_root { Some(entity) } else { owner_scene };
        let mut newly_bound = Vec::new();
        if let Some(scene) = scene {
            self.bind_scene(entity, scene, &mut newly_bound);
        }
        for bound in &newly_bound {
            self.notify_bound(*bound);
        }
        if was_bound {
            if let Some(view) = self.view.as_mut() {
                view.on_reparented(entity, owner);
            }
        }
        Ok(newly_bound)
    }

    /// Removes `entity` from its current owner's map and clears its owner.
    ///
    /// A detached component stops being a dependent and its former siblings
    /// are re-evaluated.
    pub(crate) fn detach(&mut self, entity: EntityId) {
        let Some(node) = self.arena.get_mut(entity) else {
            return;
        };
        let previous = std::mem::take(&mut node.owner);
        let (id, type_key) = (node.id, node.type_key);
        let keys = node.announced_keys();

        match previous {
            Owner::Detached => {}
            Owner::ChildOf(parent) => {
                if let Some(parent_node) = self.arena.get_mut(parent) {
                    remove_entry(&mut parent_node.children, &id, entity);
                }
            }
            Owner::ComponentOf(host) => {
                self.registry.unregister(entity);
                let host_live = match self.arena.get_mut(host) {
                    Some(host_node) => {
                        remove_entry(&mut host_node.components, &type_key, entity);
                        !host_node.is_disposing()
                    }
                    None => false,
                };
                if host_live {
                    self.notify_component_changed(host, &keys, None);
                }
            }
        }
    }

    /// Returns `true` if `ancestor` is `entity` or appears on its owner chain.
    pub(crate) fn is_ancestor(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.arena.get(current).and_then(|node| node.owner.entity());
        }
        false
    }

    /// Sets `scene` on `root` and its subtree, assigning instance ids to
    /// entities binding for the first time. Nested scene roots keep their
    /// own scene and are not descended into.
    fn bind_scene(&mut self, root: EntityId, scene: EntityId, newly_bound: &mut Vec<EntityId>) {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.arena.get_mut(current) else {
                continue;
            };
            if current != root && node.scene_root {
                continue;
            }
            node.scene = Some(scene);
            if node.instance_id == 0 {
                node.instance_id = self.ids.generate_instance_id();
                newly_bound.push(current);
            }
            let mut next = node.child_ids();
            next.extend(node.component_ids());
            stack.extend(next.into_iter().rev());
        }
    }
}

fn remove_entry<K: Ord>(map: &mut Option<BTreeMap<K, EntityId>>, key: &K, entity: EntityId) {
    let Some(entries) = map.as_mut() else {
        return;
    };
    if entries.get(key) == Some(&entity) {
        entries.remove(key);
    }
    if entries.is_empty() {
        *map = None;
    }
}
