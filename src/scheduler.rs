//! Drop timing and difficulty ramp.

use crate::config::Rules;
use std::time::Duration;
use tracing::debug;

/// Turns frame deltas into drop signals. The interval shrinks by `ramp_step` every
/// `ramp_period` of elapsed time, never below `min_interval`.
#[derive(Debug, Clone)]
pub struct DropScheduler {
    accumulator: Duration,
    interval: Duration,
    ramp_elapsed: Duration,
    initial_interval: Duration,
    ramp_step: Duration,
    ramp_period: Duration,
    min_interval: Duration,
}

impl DropScheduler {
    pub fn new(rules: &Rules) -> Self {
        Self {
            accumulator: Duration::ZERO,
            interval: rules.initial_interval,
            ramp_elapsed: Duration::ZERO,
            initial_interval: rules.initial_interval,
            ramp_step: rules.ramp_step,
            ramp_period: rules.ramp_period,
            min_interval: rules.min_interval,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Feed elapsed time. Returns true when a drop is due. The accumulator is reset
    /// to zero on a drop, so one long frame yields a single drop.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.ramp(delta);
        self.accumulator = self.accumulator.saturating_add(delta);
        if self.accumulator > self.interval {
            self.accumulator = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Applies every whole period elapsed so far at once.
    fn ramp(&mut self, delta: Duration) {
        let period = self.ramp_period.as_nanos();
        if period == 0 {
            return;
        }
        let elapsed = self.ramp_elapsed.saturating_add(delta).as_nanos();
        let periods = elapsed / period;
        self.ramp_elapsed = nanos_to_duration(elapsed % period);
        if periods == 0 {
            return;
        }
        let steps = u32::try_from(periods).unwrap_or(u32::MAX);
        let next = self
            .ramp_step
            .checked_mul(steps)
            .map_or(Duration::ZERO, |total| self.interval.saturating_sub(total))
            .max(self.min_interval);
        if next != self.interval {
            debug!(interval_ms = next.as_millis() as u64, "drop interval decreased");
        }
        self.interval = next;
    }

    /// Restart the wait for the next automatic drop.
    pub fn reset_accumulator(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Back to the initial interval with both counters cleared.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.ramp_elapsed = Duration::ZERO;
        self.interval = self.initial_interval;
    }
}

/// `nanos` is a remainder below one ramp period, so its seconds fit in a `u64`.
fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}
