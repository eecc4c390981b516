//! Pomodoro settings value object.
//!
//! Settings are owned by the caller and handed to the engine by value. The
//! engine clamps every field to at least 1 before using it.

use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Durations (seconds) and long-break cadence for Pomodoro mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub work_duration_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    pub cycles_before_long_break: u32,
}

impl Settings {
    pub fn new(
        work_duration_secs: u64,
        short_break_secs: u64,
        long_break_secs: u64,
        cycles_before_long_break: u32,
    ) -> Self {
        Self {
            work_duration_secs,
            short_break_secs,
            long_break_secs,
            cycles_before_long_break,
        }
        .clamped()
    }

    /// Build settings from minute values, as stored in the config file.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn from_minutes(work_min: u64, short_min: u64, long_min: u64, cycles: u32) -> Self {
        Self::new(
            work_min.saturating_mul(60),
            short_min.saturating_mul(60),
            long_min.saturating_mul(60),
            cycles,
        )
    }

    /// Every field raised to at least 1.
    pub fn clamped(self) -> Self {
        Self {
            work_duration_secs: self.work_duration_secs.max(1),
            short_break_secs: self.short_break_secs.max(1),
            long_break_secs: self.long_break_secs.max(1),
            cycles_before_long_break: self.cycles_before_long_break.max(1),
        }
    }

    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_duration_secs,
            Phase::ShortBreak => self.short_break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            cycles_before_long_break: 4,
        }
    }
}
