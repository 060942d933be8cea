//! # Disposal
//!
//! Depth-first, post-order teardown. Never fails: callback faults are
//! logged and the cascade always runs to completion.

use super::id::EntityId;
use super::status::EntityStatus;
use super::world::World;
use crate::error::CallbackPhase;

impl World {
    /// Disposes `entity` and its whole subtree.
    ///
    /// Order: unregister from the scheduler and the dependency registry,
    /// dispose children then components, run `on_destroy`, detach from the
    /// owner, return the instance to the pool. A stale handle is a no-op.
    ///
    /// If the entity's own callback is running, `on_destroy` and the pool
    /// return happen when that callback returns.
    pub fn dispose(&mut self, entity: EntityId) {
        let Some(node) = self.arena.get_mut(entity) else {
            return;
        };
        if node.is_disposing() {
            return;
        }
        let was_bound = node.instance_id != 0;
        let scene_root = node.scene_root && node.scene == Some(entity);
        let type_name = node.type_key.name();
        node.status.insert(EntityStatus::DISPOSING);
        node.instance_id = 0;
        let children = node.child_ids();
        let components = node.component_ids();
        tracing::debug!(%entity, type_name, "disposing entity");

        self.system.unregister(entity);
        self.registry.unregister(entity);

        for child in children {
            self.dispose(child);
        }
        for component in components {
            self.dispose(component);
        }

        let lent = self
            .arena
            .get(entity)
            .is_some_and(|node| node.behavior.is_none());
        if lent {
            if let Some(node) = self.arena.get_mut(entity) {
                node.status.insert(EntityStatus::DESTROY_PENDING);
            }
        } else {
            self.invoke(entity, CallbackPhase::Destroy, |b, cx| b.on_destroy(cx));
        }

        if was_bound {
            if let Some(view) = self.view.as_mut() {
                view.on_unbound(entity);
            }
        }
        self.detach(entity);
        if scene_root {
            if let Some(index) = self.scenes.iter().position(|(_, scene)| *scene == entity) {
                let (name, _) = self.scenes.remove(index);
                tracing::info!(%entity, name = %name, "scene disposed");
            }
        }

        if !lent {
            self.release(entity);
        }
    }

    /// Frees the slot of a disposed entity and recycles its behavior.
    pub(crate) fn release(&mut self, entity: EntityId) {
        let Some(mut node) = self.arena.despawn(entity) else {
            return;
        };
        node.status = node.status.intersection(EntityStatus::FROM_POOL);
        let Some(mut behavior) = node.behavior.take() else {
            return;
        };
        behavior.reset();
        if node.status.contains(EntityStatus::FROM_POOL) {
            node.status.remove(EntityStatus::FROM_POOL);
            self.pool.recycle(node.type_key, behavior);
        }
    }
}
