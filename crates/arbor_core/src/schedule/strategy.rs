//! # Rate Strategies
//!
//! A strategy turns elapsed time into an invocation count and a fixed
//! step for one tick. Strategies compose: [`AllOf`] takes the slowest
//! cadence, [`AnyOf`] the fastest.

use std::fmt;

/// Elapsed time handed to strategies each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickInput {
    /// Scaled frame time in seconds.
    pub delta_time: f32,
    /// Real frame time in seconds.
    pub unscaled_delta_time: f32,
}

impl TickInput {
    /// Creates a tick input.
    #[inline]
    #[must_use]
    pub const fn new(delta_time: f32, unscaled_delta_time: f32) -> Self {
        Self {
            delta_time,
            unscaled_delta_time,
        }
    }
}

/// How many times to call `update` this tick, and with which `dt`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdatePlan {
    /// Number of invocations.
    pub count: u32,
    /// `dt` passed to each invocation.
    pub step: f32,
}

impl UpdatePlan {
    /// No invocation.
    pub const NONE: Self = Self {
        count: 0,
        step: 0.0,
    };

    /// Exactly one invocation with `step`.
    #[inline]
    #[must_use]
    pub const fn once(step: f32) -> Self {
        Self { count: 1, step }
    }
}

/// Per-tick rate policy.
pub trait UpdateStrategy: Send {
    /// Advances internal state by one tick and returns the plan.
    fn plan(&mut self, input: TickInput) -> UpdatePlan;
}

/// Runs at a fixed rate, carrying the remainder between ticks.
///
/// At 10 updates per second, a 0.35 s tick yields 3 steps of 0.1 s and
/// keeps 0.05 s for the next tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedRateStrategy {
    interval: f32,
    accumulated: f32,
    use_unscaled_time: bool,
}

impl FixedRateStrategy {
    /// Creates a strategy firing `updates_per_second` times per second of
    /// scaled time. A non-positive rate never fires.
    #[must_use]
    pub fn new(updates_per_second: f32) -> Self {
        let interval = if updates_per_second > 0.0 {
            1.0 / updates_per_second
        } else {
            f32::INFINITY
        };
        Self {
            interval,
            accumulated: 0.0,
            use_unscaled_time: false,
        }
    }

    /// Accumulates real time instead of scaled time.
    #[must_use]
    pub const fn with_unscaled_time(mut self) -> Self {
        self.use_unscaled_time = true;
        self
    }

    /// Seconds between invocations.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> f32 {
        self.interval
    }

    /// Carried-over time in seconds.
    #[inline]
    #[must_use]
    pub const fn accumulated(&self) -> f32 {
        self.accumulated
    }

    /// Drops the carried-over time.
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

impl UpdateStrategy for FixedRateStrategy {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn plan(&mut self, input: TickInput) -> UpdatePlan {
        if !self.interval.is_finite() {
            return UpdatePlan::NONE;
        }
        let elapsed = if self.use_unscaled_time {
            input.unscaled_delta_time
        } else {
            input.delta_time
        };
        self.accumulated += elapsed.max(0.0);

        let count = (self.accumulated / self.interval).floor() as u32;
        self.accumulated -= count as f32 * self.interval;
        UpdatePlan {
            count,
            step: self.interval,
        }
    }
}

/// AND combination: the minimum count and minimum step of all parts.
#[derive(Default)]
pub struct AllOf {
    parts: Vec<Box<dyn UpdateStrategy>>,
}

impl AllOf {
    /// Combines `parts`.
    #[must_use]
    pub fn new(parts: Vec<Box<dyn UpdateStrategy>>) -> Self {
        Self { parts }
    }

    /// Adds a part.
    #[must_use]
    pub fn with(mut self, part: impl UpdateStrategy + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }
}

impl UpdateStrategy for AllOf {
    fn plan(&mut self, input: TickInput) -> UpdatePlan {
        // Every part must advance, even once the result is known to be zero.
        let plans: Vec<UpdatePlan> = self.parts.iter_mut().map(|part| part.plan(input)).collect();
        let Some(count) = plans.iter().map(|plan| plan.count).min() else {
            return UpdatePlan::NONE;
        };
        let step = plans
            .iter()
            .map(|plan| plan.step)
            .fold(f32::INFINITY, f32::min);
        UpdatePlan { count, step }
    }
}

impl fmt::Debug for AllOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllOf").field("parts", &self.parts.len()).finish()
    }
}

/// OR combination: the maximum count, stepping at the smallest step among
/// parts that fire this tick.
#[derive(Default)]
pub struct AnyOf {
    parts: Vec<Box<dyn UpdateStrategy>>,
}

impl AnyOf {
    /// Combines `parts`.
    #[must_use]
    pub fn new(parts: Vec<Box<dyn UpdateStrategy>>) -> Self {
        Self { parts }
    }

    /// Adds a part.
    #[must_use]
    pub fn with(mut self, part: impl UpdateStrategy + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }
}

impl UpdateStrategy for AnyOf {
    fn plan(&mut self, input: TickInput) -> UpdatePlan {
        let mut result = UpdatePlan::NONE;
        let mut step = f32::INFINITY;
        for plan in self.parts.iter_mut().map(|part| part.plan(input)) {
            if plan.count == 0 {
                continue;
            }
            result.count = result.count.max(plan.count);
            step = step.min(plan.step);
        }
        if result.count > 0 {
            result.step = step;
        }
        result
    }
}

impl fmt::Debug for AnyOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyOf").field("parts", &self.parts.len()).finish()
    }
}
