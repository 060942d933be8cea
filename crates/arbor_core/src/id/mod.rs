//! # Identifier Generation
//!
//! Two 64-bit identifier families:
//! - **Business ids**: zone (14) | seconds since epoch (30) | sequence (20).
//!   Keys in a parent's child map.
//! - **Instance ids**: seconds since epoch (32) | counter (32).
//!   Liveness tokens only, never lookup keys.

mod generator;

pub use generator::{IdGenerator, IdParts, InstanceIdParts};

/// 2022-01-01T00:00:00Z in Unix milliseconds.
pub const EPOCH_2022_MS: i64 = 1_640_995_200_000;

/// Mask for the 14-bit zone field.
pub const MASK_14_BIT: u64 = 0x3fff;

/// Mask for the 20-bit sequence field.
pub const MASK_20_BIT: u64 = 0xf_ffff;

/// Mask for the 30-bit time field.
pub const MASK_30_BIT: u64 = 0x3fff_ffff;
