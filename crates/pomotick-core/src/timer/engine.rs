//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use
//! internal threads - the caller (usually [`crate::driver`]) is responsible
//! for calling `tick()` once per second while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle <-> Running            (start / pause / reset / completion in regular mode)
//!
//! Pomodoro phases, on each zero-reaching tick:
//! Work -> ShortBreak | LongBreak -> Work
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Settings::default(), Arc::new(SilentSignal));
//! engine.set_mode(Mode::Pomodoro);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::TimerCompleted) when a phase ends
//! ```

use std::sync::Arc;

use chrono::Utc;

use super::state::{CustomTime, Mode, Phase, Snapshot};
use crate::events::Event;
use crate::settings::Settings;
use crate::signal::{Completion, CompletionSignal};

/// Core timer engine.
///
/// All mutation goes through the command methods. Each returns `Some(Event)`
/// when it changed something and `None` when it was a no-op; none of them
/// can fail.
pub struct TimerEngine {
    settings: Settings,
    mode: Mode,
    remaining_secs: u64,
    running: bool,
    /// Only meaningful in Pomodoro mode.
    phase: Phase,
    completed_work_cycles: u32,
    /// Last accepted custom input. Regular mode only.
    pending_custom: CustomTime,
    signal: Arc<dyn CompletionSignal>,
}

impl TimerEngine {
    /// Create an engine in regular mode with zero time, paused.
    pub fn new(settings: Settings, signal: Arc<dyn CompletionSignal>) -> Self {
        Self {
            settings: settings.clamped(),
            mode: Mode::Regular,
            remaining_secs: 0,
            running: false,
            phase: Phase::Work,
            completed_work_cycles: 0,
            pending_custom: CustomTime::default(),
            signal,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pending_custom(&self) -> CustomTime {
        self.pending_custom
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            remaining_secs: self.remaining_secs,
            running: self.running,
            mode: self.mode,
            phase: self.phase,
            completed_work_cycles: self.completed_work_cycles,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        if self.remaining_secs == 0 {
            match self.mode {
                Mode::Regular => {
                    tracing::debug!("start ignored: no time set");
                    return None;
                }
                Mode::Pomodoro => {
                    self.remaining_secs = self.settings.duration_for(self.phase);
                }
            }
        }
        self.running = true;
        tracing::debug!(mode = ?self.mode, phase = ?self.phase, remaining = self.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        tracing::debug!(remaining = self.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.signal.silence();
        self.completed_work_cycles = 0;
        self.phase = Phase::Work;
        match self.mode {
            Mode::Pomodoro => self.remaining_secs = self.settings.work_duration_secs,
            Mode::Regular => {
                self.remaining_secs = 0;
                self.pending_custom = CustomTime::default();
            }
        }
        tracing::debug!(mode = ?self.mode, "timer reset");
        Some(Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Arm a regular countdown of `minutes * 60 + seconds`.
    ///
    /// Ignored in Pomodoro mode and for negative or overflowing input.
    pub fn set_custom_time(&mut self, minutes: i64, seconds: i64) -> Option<Event> {
        if self.mode != Mode::Regular {
            tracing::debug!("custom time ignored outside regular mode");
            return None;
        }
        match CustomTime::new(minutes, seconds) {
            Ok(time) => self.apply_custom_time(time),
            Err(e) => {
                tracing::debug!("custom time rejected: {e}");
                None
            }
        }
    }

    /// Same as [`Self::set_custom_time`] but from raw text fields.
    pub fn set_custom_time_input(&mut self, minutes: &str, seconds: &str) -> Option<Event> {
        if self.mode != Mode::Regular {
            tracing::debug!("custom time ignored outside regular mode");
            return None;
        }
        match CustomTime::parse(minutes, seconds) {
            Ok(time) => self.apply_custom_time(time),
            Err(e) => {
                tracing::debug!("custom time rejected: {e}");
                None
            }
        }
    }

    pub fn set_mode(&mut self, mode: Mode) -> Option<Event> {
        if mode == self.mode {
            return None;
        }
        let from = self.mode;
        self.mode = mode;
        self.running = false;
        self.phase = Phase::Work;
        self.completed_work_cycles = 0;
        match mode {
            Mode::Pomodoro => self.remaining_secs = self.settings.work_duration_secs,
            Mode::Regular => {
                self.remaining_secs = 0;
                self.pending_custom = CustomTime::default();
            }
        }
        tracing::debug!(?from, to = ?mode, "mode changed");
        Some(Event::ModeChanged {
            from,
            to: mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Replace the settings. A paused Pomodoro countdown is re-armed when
    /// its own phase duration changed; a running one keeps counting and
    /// picks the new values up at the next phase change.
    pub fn update_settings(&mut self, settings: Settings) -> Option<Event> {
        let settings = settings.clamped();
        if settings == self.settings {
            return None;
        }
        let phase_changed = settings.duration_for(self.phase) != self.settings.duration_for(self.phase);
        self.settings = settings;
        let rearmed = self.mode == Mode::Pomodoro && !self.running && phase_changed;
        if rearmed {
            self.remaining_secs = self.settings.duration_for(self.phase);
        }
        tracing::debug!(?settings, rearmed, "settings updated");
        Some(Event::SettingsUpdated {
            settings,
            rearmed,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Remove one second. Call once per second while running.
    ///
    /// Returns `Some(Event::TimerCompleted)` when the countdown reached
    /// zero; by then the next Pomodoro phase is already armed.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.complete());
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply_custom_time(&mut self, time: CustomTime) -> Option<Event> {
        let total = time.total_secs()?;
        self.pending_custom = time;
        self.remaining_secs = total;
        if total == 0 {
            self.running = false;
        }
        Some(Event::CustomTimeSet {
            minutes: time.minutes,
            seconds: time.seconds,
            remaining_secs: total,
            at: Utc::now(),
        })
    }

    fn complete(&mut self) -> Event {
        let finished = self.phase;
        let next = match self.mode {
            Mode::Regular => {
                self.running = false;
                None
            }
            Mode::Pomodoro => {
                let next = self.next_phase();
                self.phase = next;
                self.remaining_secs = self.settings.duration_for(next);
                Some(next)
            }
        };
        // Regular mode never leaves Work, so `finished` is Work there too.
        let completion = Completion {
            mode: self.mode,
            finished,
            next,
        };
        self.signal.signal_completion(&completion);
        tracing::info!(
            mode = ?self.mode,
            ?finished,
            ?next,
            cycles = self.completed_work_cycles,
            "{}",
            completion.message()
        );
        Event::TimerCompleted {
            mode: self.mode,
            finished,
            next,
            completed_work_cycles: self.completed_work_cycles,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    /// Next phase after the current one completes. Counts the work cycle.
    fn next_phase(&mut self) -> Phase {
        match self.phase {
            Phase::Work => {
                self.completed_work_cycles = self.completed_work_cycles.saturating_add(1);
                if self.completed_work_cycles % self.settings.cycles_before_long_break == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("settings", &self.settings)
            .field("mode", &self.mode)
            .field("remaining_secs", &self.remaining_secs)
            .field("running", &self.running)
            .field("phase", &self.phase)
            .field("completed_work_cycles", &self.completed_work_cycles)
            .field("pending_custom", &self.pending_custom)
            .finish_non_exhaustive()
    }
}
