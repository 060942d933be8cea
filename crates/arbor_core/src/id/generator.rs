//! # Identifier Generator
//!
//! Thread-safe. Business ids take a short lock around the sequence
//! increment; instance ids are a single atomic add.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{EPOCH_2022_MS, MASK_14_BIT, MASK_20_BIT, MASK_30_BIT};
use crate::config::IdConfig;
use crate::time::TimeSource;

/// Decoded fields of a business id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdParts {
    /// Reserved zone field.
    pub zone: u16,
    /// Seconds since the generator epoch, truncated to 30 bits.
    pub time: u32,
    /// Rolling sequence value.
    pub value: u32,
}

impl IdParts {
    /// Splits a business id into its fields.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(id: u64) -> Self {
        Self {
            zone: ((id >> 50) & MASK_14_BIT) as u16,
            time: ((id >> 20) & MASK_30_BIT) as u32,
            value: (id & MASK_20_BIT) as u32,
        }
    }

    /// Packs the fields back into a business id.
    #[inline]
    #[must_use]
    pub const fn encode(self) -> u64 {
        ((self.zone as u64 & MASK_14_BIT) << 50)
            | ((self.time as u64 & MASK_30_BIT) << 20)
            | (self.value as u64 & MASK_20_BIT)
    }
}

impl fmt::Display for IdParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone: {}, time: {}, value: {}", self.zone, self.time, self.value)
    }
}

/// Decoded fields of an instance id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceIdParts {
    /// Seconds since the generator epoch, truncated to 32 bits.
    pub time: u32,
    /// Counter value.
    pub value: u32,
}

impl InstanceIdParts {
    /// Splits an instance id into its fields.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(id: u64) -> Self {
        Self {
            time: (id >> 32) as u32,
            value: id as u32,
        }
    }
}

/// Produces business ids and instance ids.
///
/// # Example
///
/// ```rust,ignore
/// let ids = IdGenerator::new(Arc::new(TimeInfo::new()), 0);
/// let a = ids.generate_id();
/// let b = ids.generate_id();
/// assert_ne!(a, b);
/// ```
pub struct IdGenerator {
    time: Arc<dyn TimeSource>,
    zone: u16,
    epoch_ms: i64,
    sequence: Mutex<u32>,
    instance: AtomicU32,
}

impl IdGenerator {
    /// Creates a generator using the 2022-01-01 epoch.
    ///
    /// # Arguments
    ///
    /// * `time` - Frame time source
    /// * `zone` - Zone field, truncated to 14 bits
    #[must_use]
    pub fn new(time: Arc<dyn TimeSource>, zone: u16) -> Self {
        Self::with_epoch(time, zone, EPOCH_2022_MS)
    }

    /// Creates a generator from configuration.
    #[must_use]
    pub fn from_config(time: Arc<dyn TimeSource>, config: &IdConfig) -> Self {
        Self::with_epoch(time, config.zone, config.epoch_ms)
    }

    /// Creates a generator with an explicit epoch in Unix milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_epoch(time: Arc<dyn TimeSource>, zone: u16, epoch_ms: i64) -> Self {
        Self {
            time,
            zone: (u64::from(zone) & MASK_14_BIT) as u16,
            epoch_ms,
            sequence: Mutex::new(0),
            instance: AtomicU32::new(0),
        }
    }

    /// Returns the zone field stamped into business ids.
    #[inline]
    #[must_use]
    pub const fn zone(&self) -> u16 {
        self.zone
    }

    /// Seconds elapsed since the epoch at the current frame time, never negative.
    #[inline]
    fn seconds_since_epoch(&self) -> u64 {
        let elapsed = (self.time.frame_time_ms() - self.epoch_ms).max(0);
        elapsed.unsigned_abs() / 1000
    }

    /// Generates a business id.
    ///
    /// Distinct for up to 2^20 - 1 calls within the same second.
    #[must_use]
    pub fn generate_id(&self) -> u64 {
        let time = self.seconds_since_epoch() & MASK_30_BIT;
        let value = {
            let mut sequence = self.sequence.lock();
            *sequence += 1;
            if u64::from(*sequence) > MASK_20_BIT - 1 {
                *sequence = 0;
            }
            *sequence
        };

        (u64::from(self.zone) << 50) | (time << 20) | u64::from(value)
    }

    /// Generates an instance id. Never returns 0.
    #[must_use]
    pub fn generate_instance_id(&self) -> u64 {
        let time = self.seconds_since_epoch() & u64::from(u32::MAX);
        let mut value = self.instance.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if time == 0 && value == 0 {
            value = self.instance.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        }
        (time << 32) | u64::from(value)
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("zone", &self.zone)
            .field("epoch_ms", &self.epoch_ms)
            .finish_non_exhaustive()
    }
}
