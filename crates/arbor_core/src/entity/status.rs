//! # Entity Status and Ownership

use super::id::EntityId;

/// Packed lifecycle flags of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntityStatus(u8);

impl EntityStatus {
    /// No flags.
    pub const EMPTY: Self = Self(0);
    /// The instance came from (and returns to) the object pool.
    pub const FROM_POOL: Self = Self(1);
    /// Bound and registered with the scheduler.
    pub const REGISTERED: Self = Self(1 << 1);
    /// Constructed and not yet released.
    pub const CREATED: Self = Self(1 << 2);
    /// Not yet initialized by `awake`.
    pub const NEW: Self = Self(1 << 3);
    /// Disposal has started.
    pub(crate) const DISPOSING: Self = Self(1 << 4);
    /// Disposed while its behavior was lent to a running callback.
    pub(crate) const DESTROY_PENDING: Self = Self(1 << 5);
    /// Attached by `begin_*_load`; held back from `awake` until the load completes.
    pub(crate) const LOADING: Self = Self(1 << 6);

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the flags in `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the flags in `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Keeps only the flags in `other`.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for EntityStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The single back-reference an entity holds to whatever owns it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Owner {
    /// No owner: a scene root or a freshly created entity.
    #[default]
    Detached,
    /// Tree child of the given parent.
    ChildOf(EntityId),
    /// Component attached to the given host.
    ComponentOf(EntityId),
}

impl Owner {
    /// The owning entity, if any.
    #[inline]
    #[must_use]
    pub const fn entity(self) -> Option<EntityId> {
        match self {
            Self::Detached => None,
            Self::ChildOf(owner) | Self::ComponentOf(owner) => Some(owner),
        }
    }

    /// Returns `true` for the attachment relation.
    #[inline]
    #[must_use]
    pub const fn is_component(self) -> bool {
        matches!(self, Self::ComponentOf(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flags() {
        let mut status = EntityStatus::CREATED | EntityStatus::NEW;
        assert!(status.contains(EntityStatus::NEW));
        status.remove(EntityStatus::NEW);
        assert!(!status.contains(EntityStatus::NEW));
        status.insert(EntityStatus::FROM_POOL);
        assert_eq!(
            status.intersection(EntityStatus::FROM_POOL),
            EntityStatus::FROM_POOL
        );
    }

    #[test]
    fn test_owner_roles() {
        let host = EntityId::new(1, 0);
        assert_eq!(Owner::Detached.entity(), None);
        assert_eq!(Owner::ComponentOf(host).entity(), Some(host));
        assert!(Owner::ComponentOf(host).is_component());
        assert!(!Owner::ChildOf(host).is_component());
    }
}
