//! # World
//!
//! Root context owning the entity tree, the dependency registry and the
//! scheduler, plus handles to the shared pool, id generator and clock.
//! Everything here runs on the driver thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::arena::{EntityArena, EntityNode};
use super::behavior::{Behavior, CallbackResult, Context, SceneRoot, TypeKey};
use super::id::EntityId;
use super::status::{EntityStatus, Owner};
use crate::config::{ConfigError, RuntimeConfig};
use crate::dependency::DependencyRegistry;
use crate::error::{isolate, CallbackPhase, EntityError, EntityResult};
use crate::id::IdGenerator;
use crate::memory::ObjectPool;
use crate::schedule::{EntitySystem, UpdateStrategy};
use crate::time::{TimeInfo, TimeSource};
use crate::view::ViewBinder;

type Factory = fn() -> Box<dyn Behavior>;

fn construct<T: Behavior + Default>() -> Box<dyn Behavior> {
    Box::new(T::default())
}

/// The entity runtime.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// let scene = world.add_scene("main", SceneRoot)?;
/// let unit = world.add_child::<Unit>(scene, true)?;
/// world.add_component::<Health>(unit, true)?;
///
/// world.update(0.016, 0.016);
/// world.late_update();
/// ```
pub struct World {
    pub(crate) config: RuntimeConfig,
    pub(crate) time: Arc<dyn TimeSource>,
    pub(crate) ids: Arc<IdGenerator>,
    pub(crate) pool: Arc<ObjectPool<dyn Behavior>>,
    pub(crate) arena: EntityArena,
    pub(crate) registry: DependencyRegistry,
    pub(crate) system: EntitySystem,
    factories: HashMap<TypeKey, Factory>,
    pub(crate) scenes: Vec<(String, EntityId)>,
    pub(crate) view: Option<Box<dyn ViewBinder>>,
    faults: u64,
}

impl World {
    /// Creates a world with default configuration and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::build(RuntimeConfig::default(), Arc::new(TimeInfo::new()))
    }

    /// Creates a world from configuration and an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn with_config(
        config: RuntimeConfig,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, time))
    }

    fn build(config: RuntimeConfig, time: Arc<dyn TimeSource>) -> Self {
        let ids = Arc::new(IdGenerator::from_config(Arc::clone(&time), &config.ids));
        let pool = Arc::new(ObjectPool::new(config.pool.capacity));
        Self {
            config,
            time,
            ids,
            pool,
            arena: EntityArena::new(),
            registry: DependencyRegistry::new(),
            system: EntitySystem::new(),
            factories: HashMap::new(),
            scenes: Vec::new(),
            view: None,
            faults: 0,
        }
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Shared clock.
    #[inline]
    #[must_use]
    pub fn time(&self) -> &Arc<dyn TimeSource> {
        &self.time
    }

    /// Shared identifier generator.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    /// Shared object pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &Arc<ObjectPool<dyn Behavior>> {
        &self.pool
    }

    /// Dependency registry, read-only.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &DependencyRegistry {
        &self.registry
    }

    /// Scheduler queues, read-only.
    #[inline]
    #[must_use]
    pub const fn system(&self) -> &EntitySystem {
        &self.system
    }

    /// Installs the global update strategy.
    pub fn set_update_strategy(&mut self, strategy: Box<dyn UpdateStrategy>) {
        self.system.set_strategy(strategy);
    }

    /// Removes the global update strategy.
    pub fn clear_update_strategy(&mut self) -> Option<Box<dyn UpdateStrategy>> {
        self.system.clear_strategy()
    }

    /// Installs the view binder.
    pub fn set_view_binder(&mut self, binder: Box<dyn ViewBinder>) {
        self.view = Some(binder);
    }

    /// Removes the view binder.
    pub fn take_view_binder(&mut self) -> Option<Box<dyn ViewBinder>> {
        self.view.take()
    }

    /// Number of callback faults caught so far.
    #[inline]
    #[must_use]
    pub const fn callback_faults(&self) -> u64 {
        self.faults
    }

    /// Number of live entities, scenes included.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.arena.alive_count()
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates an unowned entity of type `T`.
    ///
    /// The instance is taken from the pool when `from_pool` is set, and
    /// returned to it on disposal.
    pub fn create<T: Behavior + Default>(&mut self, from_pool: bool) -> EntityId {
        let key = TypeKey::of::<T>();
        self.create_with(key, from_pool, construct::<T>)
    }

    /// Creates an unowned entity wrapping `value`. Never pooled.
    pub fn create_value<T: Behavior>(&mut self, value: T) -> EntityId {
        self.spawn_node(Box::new(value), false)
    }

    /// Registers `T` for construction by key.
    pub fn register_type<T: Behavior + Default>(&mut self) {
        self.factories.insert(TypeKey::of::<T>(), construct::<T>);
    }

    /// Creates an unowned entity of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownType`] if `key` was never registered.
    pub fn create_by_key(&mut self, key: TypeKey, from_pool: bool) -> EntityResult<EntityId> {
        let make = *self
            .factories
            .get(&key)
            .ok_or(EntityError::UnknownType(key.name()))?;
        Ok(self.create_with(key, from_pool, make))
    }

    fn create_with(&mut self, key: TypeKey, from_pool: bool, make: Factory) -> EntityId {
        let behavior = if from_pool {
            self.pool.fetch(key, make)
        } else {
            make()
        };
        self.spawn_node(behavior, from_pool)
    }

    fn spawn_node(&mut self, behavior: Box<dyn Behavior>, from_pool: bool) -> EntityId {
        let mut status = EntityStatus::CREATED | EntityStatus::NEW;
        if from_pool {
            status.insert(EntityStatus::FROM_POOL);
        }
        let node = EntityNode::new(behavior, status);
        let type_name = node.type_key.name();
        let entity = self.arena.spawn(node);
        tracing::debug!(%entity, type_name, from_pool, "entity created");
        entity
    }

    /// Changes the business id of an entity, re-keying it in its parent.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Disposed`] for a stale handle and
    /// [`EntityError::DuplicateChild`] if a sibling already uses `id`.
    pub fn set_business_id(&mut self, entity: EntityId, id: u64) -> EntityResult<()> {
        let node = self.live(entity).ok_or(EntityError::Disposed(entity))?;
        let (owner, old) = (node.owner, node.id);
        if let Owner::ChildOf(parent) = owner {
            if self.get_child(parent, id).is_some_and(|existing| existing != entity) {
                return Err(EntityError::DuplicateChild { owner: parent, id });
            }
            if let Some(children) = self.live_mut(parent).and_then(|p| p.children.as_mut()) {
                children.remove(&old);
                children.insert(id, entity);
            }
        }
        if let Some(node) = self.live_mut(entity) {
            node.id = id;
        }
        Ok(())
    }

    // =========================================================================
    // Scenes
    // =========================================================================

    /// Creates a named scene: a self-owning root bound to itself.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateScene`] if the name is taken.
    pub fn add_scene<T: Behavior>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> EntityResult<EntityId> {
        let name = name.into();
        if self.get_scene(&name).is_some() {
            return Err(EntityError::DuplicateScene(name));
        }

        let scene = self.spawn_node(Box::new(value), false);
        let id = self.ids.generate_id();
        let instance_id = self.ids.generate_instance_id();
        if let Some(node) = self.arena.get_mut(scene) {
            node.scene_root = true;
            node.scene = Some(scene);
            node.id = id;
            node.instance_id = instance_id;
        }
        tracing::info!(%scene, name = %name, "scene created");
        self.scenes.push((name, scene));

        self.notify_bound(scene);
        self.activate(scene);
        Ok(scene)
    }

    /// Creates a named scene with no behavior of its own.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateScene`] if the name is taken.
    pub fn add_empty_scene(&mut self, name: impl Into<String>) -> EntityResult<EntityId> {
        self.add_scene(name, SceneRoot)
    }

    /// Looks up a scene by name.
    #[must_use]
    pub fn get_scene(&self, name: &str) -> Option<EntityId> {
        self.scenes
            .iter()
            .find(|(scene_name, _)| scene_name == name)
            .map(|(_, scene)| *scene)
    }

    /// Disposes the named scene and everything under it.
    pub fn remove_scene(&mut self, name: &str) -> bool {
        let Some(scene) = self.get_scene(name) else {
            return false;
        };
        self.dispose(scene);
        true
    }

    /// Names of live scenes in creation order.
    #[must_use]
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Disposes every scene and every remaining root, then clears the
    /// scheduler and dependency registry.
    pub fn shutdown(&mut self) {
        let scenes: Vec<EntityId> = self.scenes.iter().rev().map(|(_, scene)| *scene).collect();
        for scene in scenes {
            self.dispose(scene);
        }
        let roots: Vec<EntityId> = self
            .arena
            .ids()
            .into_iter()
            .filter(|id| {
                self.arena
                    .get(*id)
                    .is_some_and(|node| node.owner == Owner::Detached)
            })
            .collect();
        for root in roots {
            self.dispose(root);
        }
        self.system.clear();
        self.registry.clear();
        tracing::info!(remaining = self.arena.alive_count(), "world shut down");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live node, excluding entities that are being disposed.
    #[inline]
    pub(crate) fn live(&self, entity: EntityId) -> Option<&EntityNode> {
        self.arena.get(entity).filter(|node| !node.is_disposing())
    }

    #[inline]
    pub(crate) fn live_mut(&mut self, entity: EntityId) -> Option<&mut EntityNode> {
        self.arena.get_mut(entity).filter(|node| !node.is_disposing())
    }

    /// Returns `true` if the handle is stale or the entity is being disposed.
    #[inline]
    #[must_use]
    pub fn is_disposed(&self, entity: EntityId) -> bool {
        self.live(entity).is_none()
    }

    /// Returns `true` if the entity is live and bound to a scene.
    #[inline]
    #[must_use]
    pub fn is_bound(&self, entity: EntityId) -> bool {
        self.instance_id(entity) != 0
    }

    /// Instance id, or 0 when unbound or disposed.
    #[inline]
    #[must_use]
    pub fn instance_id(&self, entity: EntityId) -> u64 {
        self.live(entity).map_or(0, |node| node.instance_id)
    }

    /// Business id.
    #[must_use]
    pub fn business_id(&self, entity: EntityId) -> Option<u64> {
        self.live(entity).map(|node| node.id)
    }

    /// Lifecycle flags.
    #[must_use]
    pub fn status(&self, entity: EntityId) -> Option<EntityStatus> {
        self.live(entity).map(|node| node.status)
    }

    /// Concrete type key.
    #[must_use]
    pub fn type_key(&self, entity: EntityId) -> Option<TypeKey> {
        self.live(entity).map(|node| node.type_key)
    }

    /// Current owner relation.
    #[must_use]
    pub fn owner_of(&self, entity: EntityId) -> Option<Owner> {
        self.live(entity).map(|node| node.owner)
    }

    /// Scene the entity is bound to.
    #[must_use]
    pub fn scene_of(&self, entity: EntityId) -> Option<EntityId> {
        self.live(entity).and_then(|node| node.scene)
    }

    /// Behavior of an entity, `None` while its own callback is running.
    #[must_use]
    pub fn behavior(&self, entity: EntityId) -> Option<&dyn Behavior> {
        self.live(entity)?.behavior.as_deref()
    }

    /// Mutable behavior of an entity.
    #[must_use]
    pub fn behavior_mut(&mut self, entity: EntityId) -> Option<&mut dyn Behavior> {
        let behavior: &mut dyn Behavior = self.live_mut(entity)?.behavior.as_deref_mut()?;
        Some(behavior)
    }

    /// Downcasts an entity's behavior to `T`.
    #[must_use]
    pub fn get_entity<T: Behavior>(&self, entity: EntityId) -> Option<&T> {
        self.behavior(entity)?.as_any().downcast_ref::<T>()
    }

    /// Mutable variant of [`World::get_entity`].
    #[must_use]
    pub fn get_entity_mut<T: Behavior>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.behavior_mut(entity)?.as_any_mut().downcast_mut::<T>()
    }

    /// Child of `parent` with business id `id`.
    #[must_use]
    pub fn get_child(&self, parent: EntityId, id: u64) -> Option<EntityId> {
        self.live(parent)?.children.as_ref()?.get(&id).copied()
    }

    /// Child of `parent` with business id `id`, downcast to `T`.
    #[must_use]
    pub fn get_child_as<T: Behavior>(&self, parent: EntityId, id: u64) -> Option<&T> {
        self.get_entity::<T>(self.get_child(parent, id)?)
    }

    /// Children of `parent` in ascending business-id order.
    #[must_use]
    pub fn children(&self, parent: EntityId) -> Vec<EntityId> {
        self.live(parent).map(EntityNode::child_ids).unwrap_or_default()
    }

    /// Components of `owner` in ascending type-key order.
    #[must_use]
    pub fn components(&self, owner: EntityId) -> Vec<EntityId> {
        self.live(owner).map(EntityNode::component_ids).unwrap_or_default()
    }

    /// Number of children.
    #[must_use]
    pub fn children_count(&self, parent: EntityId) -> usize {
        self.live(parent)
            .and_then(|node| node.children.as_ref())
            .map_or(0, std::collections::BTreeMap::len)
    }

    /// Number of components.
    #[must_use]
    pub fn components_count(&self, owner: EntityId) -> usize {
        self.live(owner)
            .and_then(|node| node.components.as_ref())
            .map_or(0, std::collections::BTreeMap::len)
    }

    // =========================================================================
    // Callback plumbing
    // =========================================================================

    /// Lends the behavior of `entity` to `f` together with a [`Context`].
    ///
    /// Returns `None` if the entity is gone or its behavior is already lent.
    pub(crate) fn with_behavior<R>(
        &mut self,
        entity: EntityId,
        f: impl FnOnce(&mut dyn Behavior, &mut Context<'_>) -> R,
    ) -> Option<R> {
        let mut behavior = self.arena.get_mut(entity)?.behavior.take()?;
        let result = {
            let mut cx = Context::new(self, entity);
            f(&mut *behavior, &mut cx)
        };
        self.restore_behavior(entity, behavior);
        Some(result)
    }

    fn restore_behavior(&mut self, entity: EntityId, behavior: Box<dyn Behavior>) {
        let Some(node) = self.arena.get_mut(entity) else {
            return;
        };
        node.behavior = Some(behavior);
        let pending = std::mem::take(&mut node.pending_activation);
        if node.status.contains(EntityStatus::DESTROY_PENDING) {
            node.status.remove(EntityStatus::DESTROY_PENDING);
            self.invoke(entity, CallbackPhase::Destroy, |b, cx| b.on_destroy(cx));
            self.release(entity);
            return;
        }
        for active in pending {
            self.invoke(entity, CallbackPhase::ActivationChanged, |b, cx| {
                b.on_activation_changed(cx, active)
            });
        }
    }

    /// Runs a callback with fault isolation.
    ///
    /// Returns `false` if the callback could not run or faulted.
    pub(crate) fn invoke(
        &mut self,
        entity: EntityId,
        phase: CallbackPhase,
        f: impl FnOnce(&mut dyn Behavior, &mut Context<'_>) -> CallbackResult,
    ) -> bool {
        let Some(type_name) = self.arena.get(entity).map(|node| node.type_key.name()) else {
            return false;
        };
        match self.with_behavior(entity, |behavior, cx| {
            isolate(phase, type_name, || f(behavior, cx))
        }) {
            Some(None) => true,
            Some(Some(_fault)) => {
                self.faults += 1;
                false
            }
            None => false,
        }
    }

    /// Runs `awake` and registers the entity with the scheduler.
    ///
    /// Only the first call for an entity does anything. Entities with a
    /// pending load are skipped until [`World::complete_load`].
    pub(crate) fn activate(&mut self, entity: EntityId) {
        let Some(node) = self.live_mut(entity) else {
            return;
        };
        let status = node.status;
        if !status.contains(EntityStatus::NEW) || status.contains(EntityStatus::LOADING) {
            return;
        }
        node.status.remove(EntityStatus::NEW);
        self.invoke(entity, CallbackPhase::Awake, |b, cx| b.awake(cx));
        let Some(node) = self.live_mut(entity) else {
            return;
        };
        node.status.insert(EntityStatus::REGISTERED);
        let callbacks = node.callbacks;
        self.system.register(entity, callbacks);
    }

    pub(crate) fn notify_bound(&mut self, entity: EntityId) {
        let Some(type_name) = self.live(entity).map(|node| node.type_key.name()) else {
            return;
        };
        if let Some(view) = self.view.as_mut() {
            view.on_bound(entity, type_name);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.arena.alive_count())
            .field("scenes", &self.scenes)
            .field("faults", &self.faults)
            .finish_non_exhaustive()
    }
}
