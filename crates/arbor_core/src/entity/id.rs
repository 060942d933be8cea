//! # Entity Handles
//!
//! Entities are addressed by arena handles consisting of:
//! - An index into the entity arena
//! - A generation counter for safe slot reuse
//!
//! [`EntityRef`] adds the instance id captured at creation of the handle,
//! so a handle never resolves to a later occupant of the same slot.

use std::fmt;
use std::marker::PhantomData;

use super::behavior::Behavior;
use super::world::World;

/// Arena handle for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the entity arena
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into the arena (0 to 2^32-2)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the raw packed value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Weak handle to an entity of concrete type `T`.
///
/// Resolves only while the slot still holds the same generation and the
/// same instance id observed when the handle was taken. A handle taken
/// before the entity was bound stops resolving once it is bound.
pub struct EntityRef<T> {
    entity: EntityId,
    instance_id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Behavior> EntityRef<T> {
    /// Captures a handle to `entity` if it is live and of type `T`.
    #[must_use]
    pub fn new(world: &World, entity: EntityId) -> Option<Self> {
        world.get_entity::<T>(entity)?;
        Some(Self {
            entity,
            instance_id: world.instance_id(entity),
            _marker: PhantomData,
        })
    }

    /// The arena handle this reference points at.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// The instance id captured with the handle.
    #[inline]
    #[must_use]
    pub const fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Returns `true` while the referenced occupant is still live.
    #[must_use]
    pub fn is_alive(&self, world: &World) -> bool {
        !world.is_disposed(self.entity) && world.instance_id(self.entity) == self.instance_id
    }

    /// Resolves the handle, or `None` if the entity is gone or was replaced.
    #[must_use]
    pub fn get<'w>(&self, world: &'w World) -> Option<&'w T> {
        if !self.is_alive(world) {
            return None;
        }
        world.get_entity::<T>(self.entity)
    }

    /// Mutable variant of [`EntityRef::get`].
    #[must_use]
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut T> {
        if !self.is_alive(world) {
            return None;
        }
        world.get_entity_mut::<T>(self.entity)
    }
}

impl<T> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityRef<T> {}

impl<T> PartialEq for EntityRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.instance_id == other.instance_id
    }
}

impl<T> Eq for EntityRef<T> {}

impl<T> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("entity", &self.entity)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
    }

    #[test]
    fn test_null_display() {
        assert!(EntityId::default().is_null());
        assert_eq!(EntityId::NULL.to_string(), "null");
        assert_eq!(EntityId::new(3, 1).to_string(), "3v1");
    }
}
