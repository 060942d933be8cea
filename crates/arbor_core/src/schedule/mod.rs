//! # Scheduler
//!
//! Frame-based cooperative scheduling on the driver thread:
//!
//! - [`EntitySystem`]: rotating queues per callback phase
//! - Rate strategies: [`FixedRateStrategy`], [`AllOf`], [`AnyOf`]
//! - `World::update` / `World::late_update`: the per-tick passes

mod strategy;
mod system;
mod tick;

pub use strategy::{AllOf, AnyOf, FixedRateStrategy, TickInput, UpdatePlan, UpdateStrategy};
pub use system::{EntitySystem, Phase};
