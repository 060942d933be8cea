//! # Memory Management
//!
//! Recycling of entity behaviors between lifetimes.
//!
//! ## Design Principles
//!
//! 1. **Recycle, don't reallocate** - disposed instances return to a per-type store
//! 2. **Bounded** - each store keeps at most `capacity` instances, extras are dropped
//! 3. **Shared** - the pool is `Send + Sync` and may be used off the driver thread

mod pool;

pub use pool::{ObjectPool, PoolStats};
