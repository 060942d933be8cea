//! # ARBOR Extensions
//!
//! Opt-in helpers built on the core runtime.
//!
//! - [`ValueChangeManager`]: polls getters once per evaluation and fires a
//!   callback when the observed value differs from the last one seen.
//! - [`Computed`]: a derived value that reports whether it changed.
//! - [`ValueChangeManager::watch`]: observes a field of an entity through a
//!   weak [`EntityRef`](arbor_core::EntityRef).
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut views: ValueChangeManager<World> = ValueChangeManager::new();
//! views.watch(health_ref, |h: &Health| h.hp, |hp| redraw_bar(*hp));
//!
//! world.update(dt, unscaled_dt);
//! views.evaluate(&world);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

mod value_change;
mod watch;

pub use value_change::{
    Computed, ComputedObserver, MultiObserver2, MultiObserver3, ValueChangeDetector,
    ValueChangeManager, ValueObserver,
};
