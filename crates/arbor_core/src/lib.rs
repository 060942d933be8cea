//! # ARBOR Core Runtime
//!
//! A runtime for large, dynamically changing populations of short-lived,
//! poolable entities organized as a tree, with components attached to
//! entities and a per-tick update schedule gated by declared inter-component
//! dependencies.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────────┐
//!                 │                  World                   │
//!                 │                                          │
//!   add_child ───►│  EntityArena ──► Owner / children map    │
//!   add_component │        │         components map          │
//!   dispose       │        ▼                                 │
//!                 │  DependencyRegistry (event driven)       │
//!                 │        │                                 │
//!   update ──────►│  EntitySystem (queues + strategies)      │
//!                 └────────┬─────────────────┬───────────────┘
//!                          ▼                 ▼
//!                  ObjectPool (shared)  IdGenerator (shared)
//! ```
//!
//! ## Rules
//!
//! 1. **One driver thread** owns the tree, the registry and the queues.
//! 2. **Shared services** (pool, id generator, time source) are `Send + Sync`.
//! 3. **Structural errors are loud**, callback faults are logged and contained.
//!
//! ## Example
//!
//! ```rust,ignore
//! use arbor_core::{Behavior, Callbacks, CallbackResult, Context, SceneRoot, World};
//!
//! #[derive(Default)]
//! struct Mover { ticks: u32 }
//!
//! impl Behavior for Mover {
//!     fn callbacks(&self) -> Callbacks { Callbacks::UPDATE }
//!     fn update(&mut self, _cx: &mut Context<'_>, _dt: f32) -> CallbackResult {
//!         self.ticks += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut world = World::new();
//! let scene = world.add_scene("main", SceneRoot)?;
//! let mover = world.add_child::<Mover>(scene, true)?;
//! world.update(0.016, 0.016);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod dependency;
pub mod entity;
pub mod error;
pub mod id;
pub mod loader;
pub mod memory;
pub mod schedule;
pub mod time;
pub mod view;

pub use config::{ConfigError, IdConfig, PoolConfig, RuntimeConfig};
pub use dependency::DependencyRegistry;
pub use entity::{
    AsAny, Behavior, CallbackResult, Callbacks, Context, EntityId, EntityRef, EntityStatus, Owner,
    SceneRoot, TypeKey, World,
};
pub use error::{CallbackFault, CallbackPhase, EntityError, EntityResult, ErrorKind};
pub use id::{IdGenerator, IdParts, InstanceIdParts};
pub use loader::{LoadOutcome, PendingLoad};
pub use memory::{ObjectPool, PoolStats};
pub use schedule::{
    AllOf, AnyOf, EntitySystem, FixedRateStrategy, Phase, TickInput, UpdatePlan, UpdateStrategy,
};
pub use time::{TimeInfo, TimeSource};
pub use view::ViewBinder;
