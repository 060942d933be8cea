//! # Dependency Registry
//!
//! Tracks which sibling component types each dependent component requires,
//! indexed by required type for fan-out on structural change.

mod registry;

pub use registry::DependencyRegistry;
