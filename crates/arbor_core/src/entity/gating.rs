//! # Dependency Gating
//!
//! Glue between the tree and the [`DependencyRegistry`](crate::DependencyRegistry).
//! Satisfaction is recomputed only when a sibling component is added or
//! removed, never per tick.

use std::collections::BTreeSet;

use super::behavior::{Behavior, TypeKey};
use super::id::EntityId;
use super::status::Owner;
use super::world::World;
use crate::error::CallbackPhase;

impl World {
    /// Component lookup: exact type key first, then the first component in
    /// ascending type-key order that provides `key` as a role.
    #[must_use]
    pub fn component(&self, owner: EntityId, key: TypeKey) -> Option<EntityId> {
        self.find_component_excluding(owner, key, None)
    }

    /// Component of type `K`.
    #[must_use]
    pub fn get<K: Behavior>(&self, owner: EntityId) -> Option<&K> {
        self.get_entity::<K>(self.component(owner, TypeKey::of::<K>())?)
    }

    /// Mutable component of type `K`.
    #[must_use]
    pub fn get_mut<K: Behavior>(&mut self, owner: EntityId) -> Option<&mut K> {
        let component = self.component(owner, TypeKey::of::<K>())?;
        self.get_entity_mut::<K>(component)
    }

    /// Returns `true` if the component `K` of `owner` has all of its
    /// dependencies present. Components without dependencies are always met.
    #[must_use]
    pub fn dependencies_met<K: Behavior>(&self, owner: EntityId) -> bool {
        self.live(owner)
            .and_then(|node| node.components.as_ref())
            .and_then(|components| components.get(&TypeKey::of::<K>()))
            .is_some_and(|component| self.registry.is_satisfied(*component))
    }

    pub(crate) fn find_component_excluding(
        &self,
        owner: EntityId,
        key: TypeKey,
        exclude: Option<EntityId>,
    ) -> Option<EntityId> {
        let components = self.live(owner)?.components.as_ref()?;
        if let Some(found) = components.get(&key) {
            if Some(*found) != exclude {
                return Some(*found);
            }
        }
        components
            .values()
            .copied()
            .filter(|component| Some(*component) != exclude)
            .find(|component| {
                self.live(*component)
                    .is_some_and(|node| node.provides(key))
            })
    }

    /// Announces a newly attached component to its siblings, then registers
    /// its own dependencies.
    pub(crate) fn component_added(&mut self, component: EntityId) {
        let Some(node) = self.live(component) else {
            return;
        };
        let Owner::ComponentOf(owner) = node.owner else {
            return;
        };
        let keys = node.announced_keys();
        self.notify_component_changed(owner, &keys, None);
        self.register_dependencies(component);
    }

    fn register_dependencies(&mut self, component: EntityId) {
        let Some(requires) = self.behavior(component).map(|b| b.dependencies()) else {
            return;
        };
        if requires.is_empty() {
            return;
        }
        self.registry.register(component, requires);
        self.evaluate_dependent(component, None);
    }

    /// Re-evaluates every dependent sibling under `owner` that requires one
    /// of `keys`.
    pub(crate) fn notify_component_changed(
        &mut self,
        owner: EntityId,
        keys: &[TypeKey],
        exclude: Option<EntityId>,
    ) {
        let dependents: BTreeSet<EntityId> = keys
            .iter()
            .flat_map(|key| self.registry.dependents_of(*key))
            .filter(|dependent| Some(*dependent) != exclude)
            .filter(|dependent| {
                self.live(*dependent)
                    .is_some_and(|node| node.owner == Owner::ComponentOf(owner))
            })
            .collect();
        for dependent in dependents {
            self.evaluate_dependent(dependent, exclude);
        }
    }

    fn evaluate_dependent(&mut self, component: EntityId, exclude: Option<EntityId>) {
        let Some(Owner::ComponentOf(owner)) = self.owner_of(component) else {
            return;
        };
        let Some(requires) = self.registry.requirements(component) else {
            return;
        };
        let met = requires
            .iter()
            .all(|key| self.find_component_excluding(owner, *key, exclude).is_some());

        let Some(active) = self.registry.record(component, met) else {
            return;
        };
        tracing::debug!(%component, active, "dependency activation changed");
        let lent = self
            .live(component)
            .is_some_and(|node| node.behavior.is_none());
        if lent {
            // Its own callback is running; delivered when the behavior returns.
            if let Some(node) = self.live_mut(component) {
                node.pending_activation.push(active);
            }
        } else {
            self.invoke(component, CallbackPhase::ActivationChanged, |b, cx| {
                b.on_activation_changed(cx, active)
            });
        }
        if active {
            if let Some(callbacks) = self.live(component).map(|node| node.callbacks) {
                self.system.register(component, callbacks);
            }
        }
    }
}
