//! Rule constants and their validation.

use std::time::Duration;
use thiserror::Error;

/// Playfield width in cells.
pub const GRID_WIDTH: usize = 15;
/// Playfield height in cells.
pub const GRID_HEIGHT: usize = 30;
/// Drop interval at session start.
pub const INITIAL_INTERVAL_MS: u64 = 980;
/// Amount the interval shrinks per ramp period.
pub const RAMP_STEP_MS: u64 = 33;
/// Wall-clock time between ramp steps.
pub const RAMP_PERIOD_MS: u64 = 20_000;
/// The interval never drops below this.
pub const MIN_INTERVAL_MS: u64 = 100;
/// Points per cleared line (flat, no multi-line bonus).
pub const LINE_SCORE: u32 = 100;

/// Largest accepted grid dimension; keeps terminal layout math in `u16`.
const MAX_DIMENSION: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid dimensions must be between 1 and 255, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("drop interval must be positive")]
    ZeroInterval,
    #[error("ramp period must be positive")]
    ZeroRampPeriod,
    #[error("minimum interval {min:?} must be positive and not above the initial {initial:?}")]
    InvalidFloor { min: Duration, initial: Duration },
}

/// Everything a session needs to know about the field and its pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    pub width: usize,
    pub height: usize,
    pub initial_interval: Duration,
    pub ramp_step: Duration,
    pub ramp_period: Duration,
    pub min_interval: Duration,
    pub line_score: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            initial_interval: Duration::from_millis(INITIAL_INTERVAL_MS),
            ramp_step: Duration::from_millis(RAMP_STEP_MS),
            ramp_period: Duration::from_millis(RAMP_PERIOD_MS),
            min_interval: Duration::from_millis(MIN_INTERVAL_MS),
            line_score: LINE_SCORE,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dims = 1..=MAX_DIMENSION;
        if !dims.contains(&self.width) || !dims.contains(&self.height) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.initial_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.ramp_period.is_zero() {
            return Err(ConfigError::ZeroRampPeriod);
        }
        if self.min_interval.is_zero() || self.min_interval > self.initial_interval {
            return Err(ConfigError::InvalidFloor {
                min: self.min_interval,
                initial: self.initial_interval,
            });
        }
        Ok(())
    }
}
