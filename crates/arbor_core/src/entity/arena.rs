//! # Entity Arena
//!
//! Slot storage for entity nodes. Slots are reused through a free list;
//! every spawn into a reused slot bumps its generation, so handles to the
//! previous occupant stop resolving.

use std::collections::BTreeMap;

use super::behavior::{Behavior, Callbacks, TypeKey};
use super::id::EntityId;
use super::status::{EntityStatus, Owner};

/// Everything the runtime knows about one entity.
pub(crate) struct EntityNode {
    /// Business id, unique among the siblings of one parent.
    pub id: u64,
    /// Liveness token; non-zero exactly while bound to a scene.
    pub instance_id: u64,
    pub status: EntityStatus,
    pub owner: Owner,
    pub children: Option<BTreeMap<u64, EntityId>>,
    pub components: Option<BTreeMap<TypeKey, EntityId>>,
    pub scene: Option<EntityId>,
    pub scene_root: bool,
    pub type_key: TypeKey,
    pub roles: Vec<TypeKey>,
    pub callbacks: Callbacks,
    /// `None` while lent to a running callback.
    pub behavior: Option<Box<dyn Behavior>>,
    /// Activation changes recorded while the behavior was lent, oldest first.
    pub pending_activation: Vec<bool>,
}

impl EntityNode {
    /// Wraps a behavior in a fresh, unowned node.
    pub fn new(behavior: Box<dyn Behavior>, status: EntityStatus) -> Self {
        let type_key = (*behavior).type_key();
        Self {
            id: 0,
            instance_id: 0,
            status,
            owner: Owner::Detached,
            children: None,
            components: None,
            scene: None,
            scene_root: behavior.is_scene(),
            type_key,
            roles: behavior.provides(),
            callbacks: behavior.callbacks(),
            behavior: Some(behavior),
            pending_activation: Vec::new(),
        }
    }

    #[inline]
    pub fn is_disposing(&self) -> bool {
        self.status.contains(EntityStatus::DISPOSING)
    }

    /// Returns `true` if this node answers to `key`.
    pub fn provides(&self, key: TypeKey) -> bool {
        self.type_key == key || self.roles.contains(&key)
    }

    /// Keys a change of this component is announced under.
    pub fn announced_keys(&self) -> Vec<TypeKey> {
        let mut keys = Vec::with_capacity(1 + self.roles.len());
        keys.push(self.type_key);
        keys.extend(self.roles.iter().copied());
        keys
    }

    pub fn child_ids(&self) -> Vec<EntityId> {
        self.children
            .as_ref()
            .map(|children| children.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn component_ids(&self) -> Vec<EntityId> {
        self.components
            .as_ref()
            .map(|components| components.values().copied().collect())
            .unwrap_or_default()
    }
}

struct Slot {
    id: EntityId,
    node: Option<EntityNode>,
}

/// Growable slot arena with generational handles.
pub(crate) struct EntityArena {
    slots: Vec<Slot>,
    /// Free list of slot indices for reuse (LIFO).
    free_indices: Vec<u32>,
    alive_count: usize,
}

impl EntityArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Number of live nodes.
    #[inline]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Stores `node`, reusing the most recently freed slot if there is one.
    #[allow(clippy::cast_possible_truncation)]
    pub fn spawn(&mut self, node: EntityNode) -> EntityId {
        let id = if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            // Increment generation to invalidate old references
            let id = EntityId::new(index, slot.id.generation().wrapping_add(1));
            slot.id = id;
            slot.node = Some(node);
            id
        } else {
            let id = EntityId::new(self.slots.len() as u32, 0);
            self.slots.push(Slot {
                id,
                node: Some(node),
            });
            id
        };
        self.alive_count += 1;
        id
    }

    /// Removes the node for `id`, freeing its slot.
    ///
    /// Returns `None` if the handle is null, stale, or already free.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityNode> {
        let slot = self.slot_mut(id)?;
        let node = slot.node.take()?;
        self.alive_count -= 1;
        self.free_indices.push(id.index());
        Some(node)
    }

    /// Checks if a handle refers to a live slot.
    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&EntityNode> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get(id.index() as usize)?;
        if slot.id != id {
            return None;
        }
        slot.node.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityNode> {
        self.slot_mut(id)?.node.as_mut()
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut Slot> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get_mut(id.index() as usize)?;
        (slot.id == id).then_some(slot)
    }

    /// Handles of every live node, in slot order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .filter(|slot| slot.node.is_some())
            .map(|slot| slot.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;
    impl Behavior for Probe {}

    fn node() -> EntityNode {
        EntityNode::new(Box::new(Probe), EntityStatus::CREATED)
    }

    #[test]
    fn test_spawn_despawn() {
        let mut arena = EntityArena::new();
        let a = arena.spawn(node());
        assert!(arena.is_alive(a));
        assert_eq!(arena.alive_count(), 1);

        assert!(arena.despawn(a).is_some());
        assert!(!arena.is_alive(a));
        assert!(arena.despawn(a).is_none());
        assert_eq!(arena.alive_count(), 0);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut arena = EntityArena::new();
        let a = arena.spawn(node());
        arena.despawn(a);
        let b = arena.spawn(node());

        assert_eq!(a.index(), b.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_some());
    }

    #[test]
    fn test_node_keys() {
        let n = node();
        assert_eq!(n.type_key, TypeKey::of::<Probe>());
        assert!(n.provides(TypeKey::of::<Probe>()));
        assert_eq!(n.announced_keys(), vec![TypeKey::of::<Probe>()]);
        assert!(!n.scene_root);
    }
}
