//! # Time Source
//!
//! Frame timestamp shared by the identifier generator and the scheduler.
//! The value is captured once per tick by [`TimeSource::refresh`] and stays
//! constant until the next refresh.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Clock consumed by the runtime.
pub trait TimeSource: Send + Sync {
    /// Frame timestamp in Unix milliseconds, constant within a tick.
    fn frame_time_ms(&self) -> i64;

    /// Offset between the server clock and the local clock in milliseconds.
    fn server_minus_client_ms(&self) -> i64 {
        0
    }

    /// Captures a new frame timestamp. Called once at the start of each tick.
    fn refresh(&self);
}

/// Default [`TimeSource`] backed by the system clock.
///
/// A frozen instance never advances on its own; tests and deterministic
/// hosts move it with [`TimeInfo::set_frame_time`].
#[derive(Debug)]
pub struct TimeInfo {
    frame_time: AtomicI64,
    server_minus_client: AtomicI64,
    frozen: AtomicBool,
}

impl TimeInfo {
    /// Creates a time source following the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_time: AtomicI64::new(system_now_ms()),
            server_minus_client: AtomicI64::new(0),
            frozen: AtomicBool::new(false),
        }
    }

    /// Creates a time source pinned at `frame_time_ms`.
    #[must_use]
    pub const fn frozen(frame_time_ms: i64) -> Self {
        Self {
            frame_time: AtomicI64::new(frame_time_ms),
            server_minus_client: AtomicI64::new(0),
            frozen: AtomicBool::new(true),
        }
    }

    /// Current local time in Unix milliseconds, read directly from the clock.
    #[must_use]
    pub fn client_now(&self) -> i64 {
        if self.frozen.load(Ordering::Relaxed) {
            self.frame_time.load(Ordering::Relaxed)
        } else {
            system_now_ms()
        }
    }

    /// Current server time in Unix milliseconds.
    #[must_use]
    pub fn server_now(&self) -> i64 {
        self.client_now() + self.server_minus_client_ms()
    }

    /// Frame timestamp translated to server time.
    #[must_use]
    pub fn server_frame_time(&self) -> i64 {
        self.frame_time_ms() + self.server_minus_client_ms()
    }

    /// Sets the server/client clock offset.
    pub fn set_server_minus_client(&self, offset_ms: i64) {
        self.server_minus_client.store(offset_ms, Ordering::Relaxed);
    }

    /// Overrides the frame timestamp and freezes the clock.
    pub fn set_frame_time(&self, frame_time_ms: i64) {
        self.frozen.store(true, Ordering::Relaxed);
        self.frame_time.store(frame_time_ms, Ordering::Relaxed);
    }
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TimeInfo {
    #[inline]
    fn frame_time_ms(&self) -> i64 {
        self.frame_time.load(Ordering::Relaxed)
    }

    #[inline]
    fn server_minus_client_ms(&self) -> i64 {
        self.server_minus_client.load(Ordering::Relaxed)
    }

    fn refresh(&self) {
        if !self.frozen.load(Ordering::Relaxed) {
            self.frame_time.store(system_now_ms(), Ordering::Relaxed);
        }
    }
}

fn system_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frozen_does_not_advance() {
        let time = TimeInfo::frozen(5_000);
        time.refresh();
        assert_eq!(time.frame_time_ms(), 5_000);
        time.set_frame_time(6_000);
        time.refresh();
        assert_eq!(time.frame_time_ms(), 6_000);
    }

    #[test]
    fn test_server_offset() {
        let time = TimeInfo::frozen(1_000);
        time.set_server_minus_client(250);
        assert_eq!(time.server_frame_time(), 1_250);
        assert_eq!(time.server_now(), 1_250);
    }

    #[test]
    fn test_live_clock_is_after_2022() {
        let time = TimeInfo::new();
        time.refresh();
        assert!(time.frame_time_ms() > 1_640_995_200_000);
    }
}
