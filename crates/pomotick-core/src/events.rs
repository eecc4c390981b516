use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::timer::{Mode, Phase};

/// Every state change in the engine produces an Event.
/// Commands that turn out to be no-ops produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CustomTimeSet {
        minutes: u64,
        seconds: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        from: Mode,
        to: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: Settings,
        /// Whether the displayed countdown was re-armed from the new values.
        rearmed: bool,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero. In Pomodoro mode `next` is the phase that
    /// was armed and is already running.
    TimerCompleted {
        mode: Mode,
        finished: Phase,
        next: Option<Phase>,
        completed_work_cycles: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
}
