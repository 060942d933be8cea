//! Entity-aware observers.
//!
//! Getters resolve a weak [`EntityRef`] against the world on every pass, so
//! an observer never keeps a disposed entity alive and reports `None` once
//! the entity is gone or its slot was reused.

use arbor_core::{Behavior, EntityRef, World};

use crate::value_change::ValueChangeManager;

impl ValueChangeManager<World> {
    /// Observes `read(entity)` through `handle`.
    ///
    /// `on_changed` receives `None` when the entity is no longer live.
    ///
    /// # Arguments
    ///
    /// * `handle` - Weak handle to the observed entity
    /// * `read` - Projection of the observed value
    /// * `on_changed` - Called on the first pass and on every change
    pub fn watch<T, V, R, F>(&mut self, handle: EntityRef<T>, read: R, mut on_changed: F)
    where
        T: Behavior,
        V: PartialEq + Send + 'static,
        R: Fn(&T) -> V + Send + 'static,
        F: FnMut(Option<&V>) + Send + 'static,
    {
        self.add(
            move |world: &World| handle.get(world).map(&read),
            move |value: &Option<V>| on_changed(value.as_ref()),
        );
    }

    /// Fires `on_changed(false)` once the entity behind `handle` is gone.
    ///
    /// Also fires on the first pass with the current liveness.
    pub fn watch_alive<T, F>(&mut self, handle: EntityRef<T>, on_changed: F)
    where
        T: Behavior,
        F: FnMut(&bool) + Send + 'static,
    {
        self.add(move |world: &World| handle.is_alive(world), on_changed);
    }
}
