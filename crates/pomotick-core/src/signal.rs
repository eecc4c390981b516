//! Completion signal capability.
//!
//! The engine never shows notifications or plays sounds itself. It is handed
//! a [`CompletionSignal`] at construction and calls it at the moment a
//! countdown reaches zero, and again (`silence`) on reset.

use serde::{Deserialize, Serialize};

use crate::timer::{Mode, Phase};

/// What just finished, passed to [`CompletionSignal::signal_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub mode: Mode,
    /// Phase that reached zero. Always `Work` in regular mode.
    pub finished: Phase,
    /// Phase that was armed next, `None` when the timer stopped.
    pub next: Option<Phase>,
}

impl Completion {
    /// Notification body text.
    pub fn message(&self) -> &'static str {
        match (self.mode, self.finished, self.next) {
            (Mode::Regular, _, _) => "Time's up!",
            (Mode::Pomodoro, Phase::Work, Some(Phase::LongBreak)) => "Work done! Long break.",
            (Mode::Pomodoro, Phase::Work, _) => "Work done! Short break.",
            (Mode::Pomodoro, _, _) => "Break over! Time to work.",
        }
    }
}

/// Notification + alarm sink.
///
/// Both operations are best-effort: implementations must swallow their own
/// failures (missing notification daemon, no audio device) and must tolerate
/// being called at any time. `silence` is idempotent.
pub trait CompletionSignal: Send + Sync {
    fn signal_completion(&self, completion: &Completion);

    fn silence(&self);
}

/// Signal that does nothing. Used when notifications are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSignal;

impl CompletionSignal for SilentSignal {
    fn signal_completion(&self, _completion: &Completion) {}

    fn silence(&self) {}
}
