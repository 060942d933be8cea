//! # Entity Lifecycle
//!
//! The tree/ownership model:
//!
//! - **Arena**: generational slots holding every entity node
//! - **Owner**: each entity is detached, a tree child, or an attached component
//! - **Scenes**: self-owning roots; binding to one assigns the instance id
//! - **Disposal**: post-order cascade that returns instances to the pool

mod arena;
mod behavior;
mod components;
mod dispose;
mod gating;
mod hierarchy;
mod id;
mod status;
mod world;

pub use behavior::{AsAny, Behavior, CallbackResult, Callbacks, Context, SceneRoot, TypeKey};
pub use id::{EntityId, EntityRef};
pub use status::{EntityStatus, Owner};
pub use world::World;
