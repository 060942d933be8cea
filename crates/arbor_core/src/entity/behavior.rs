//! # Entity Behaviors
//!
//! User types implement [`Behavior`] and are stored boxed in the arena.
//! Callbacks receive a [`Context`] giving full access to the world plus
//! the handle of the entity being called.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitOr, Deref, DerefMut};

use super::id::EntityId;
use super::world::World;
use crate::schedule::UpdateStrategy;

/// Result returned by behavior callbacks.
///
/// An `Err` is logged and counted as a callback fault; it never aborts the
/// surrounding tick or disposal cascade.
pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Runtime type key.
///
/// Keys concrete types and role markers such as `dyn Trait` alike. Ordering
/// follows [`TypeId`], which is stable for a given build.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type name, for diagnostics only.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Underlying [`TypeId`].
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Upcasting helpers, implemented for every `'static` type.
///
/// Call these through `&dyn Behavior`, never on a `Box<dyn Behavior>`
/// directly: the box is itself `'static` and would answer for itself.
pub trait AsAny: Any {
    /// `&self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// `&mut self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Key of the concrete type.
    fn type_key(&self) -> TypeKey;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }
}

/// Scheduler callbacks an entity opts into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Callbacks(u8);

impl Callbacks {
    /// No scheduled callbacks.
    pub const NONE: Self = Self(0);
    /// Per-tick [`Behavior::update`].
    pub const UPDATE: Self = Self(1);
    /// Per-tick [`Behavior::late_update`].
    pub const LATE_UPDATE: Self = Self(1 << 1);

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if no flag is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Callbacks {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Per-type behavior of an entity.
///
/// Every method has a default, so a unit struct with an empty `impl` is a
/// valid passive entity.
#[allow(unused_variables)]
pub trait Behavior: AsAny + Send {
    /// Scheduled callbacks this type receives. Read once at creation.
    fn callbacks(&self) -> Callbacks {
        Callbacks::NONE
    }

    /// Called once when the entity is first bound to a scene, before it is
    /// registered with the scheduler.
    fn awake(&mut self, cx: &mut Context<'_>) -> CallbackResult {
        Ok(())
    }

    /// Per-tick update. Called 0..N times per tick depending on the active
    /// rate strategy; `dt` is the strategy's step.
    fn update(&mut self, cx: &mut Context<'_>, dt: f32) -> CallbackResult {
        Ok(())
    }

    /// Per-tick late update.
    fn late_update(&mut self, cx: &mut Context<'_>) -> CallbackResult {
        Ok(())
    }

    /// Called during disposal after children and components are gone.
    fn on_destroy(&mut self, cx: &mut Context<'_>) -> CallbackResult {
        Ok(())
    }

    /// Sibling component types that must be present for this component to
    /// be active. Read once when the component is attached.
    fn dependencies(&self) -> Vec<TypeKey> {
        Vec::new()
    }

    /// Called when the dependency-satisfaction state flips.
    fn on_activation_changed(&mut self, cx: &mut Context<'_>, active: bool) -> CallbackResult {
        Ok(())
    }

    /// Entity-specific rate strategy, overriding the global one.
    fn update_strategy(&mut self) -> Option<&mut dyn UpdateStrategy> {
        None
    }

    /// Additional lookup keys this type answers to, e.g. `TypeKey::of::<dyn Trait>()`.
    fn provides(&self) -> Vec<TypeKey> {
        Vec::new()
    }

    /// Anchors its own subtree as a scene when parented.
    fn is_scene(&self) -> bool {
        false
    }

    /// Clears per-lifetime state before the instance returns to the pool.
    fn reset(&mut self) {}
}

/// Plain scene root with no behavior of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneRoot;

impl Behavior for SceneRoot {
    fn is_scene(&self) -> bool {
        true
    }
}

/// Callback context: the world plus the entity being called.
pub struct Context<'w> {
    world: &'w mut World,
    entity: EntityId,
}

impl<'w> Context<'w> {
    pub(crate) fn new(world: &'w mut World, entity: EntityId) -> Self {
        Self { world, entity }
    }

    /// Handle of the entity whose callback is running.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Disposes the running entity once the callback returns.
    pub fn dispose_self(&mut self) {
        let entity = self.entity;
        self.world.dispose(entity);
    }
}

impl Deref for Context<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        self.world
    }
}

impl DerefMut for Context<'_> {
    fn deref_mut(&mut self) -> &mut World {
        self.world
    }
}
