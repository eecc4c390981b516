//! Terminal output for snapshots and events.

use std::io::{self, IsTerminal, StdoutLock, Write};

use pomotick_core::{Completion, Event, Mode, Snapshot};

pub struct Renderer {
    json: bool,
    /// Redraw the status line in place instead of printing one per change.
    inline: bool,
}

impl Renderer {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            inline: !json && io::stdout().is_terminal(),
        }
    }

    pub fn snapshot(&self, snap: &Snapshot) {
        let line = if self.json {
            serde_json::to_string(snap).unwrap_or_default()
        } else {
            status_line(snap)
        };
        emit(|out| {
            if self.inline {
                write!(out, "\r\x1b[2K{line}")?;
                out.flush()
            } else {
                writeln!(out, "{line}")
            }
        });
    }

    pub fn event(&self, event: &Event) {
        let line = if self.json {
            serde_json::to_string(event).ok()
        } else {
            event_line(event)
        };
        let Some(line) = line else { return };
        emit(|out| {
            if self.inline {
                writeln!(out)?;
            }
            writeln!(out, "{line}")
        });
    }

    /// A free-standing line, e.g. an answer to `status`.
    pub fn line(&self, text: &str) {
        emit(|out| {
            if self.inline {
                writeln!(out)?;
            }
            writeln!(out, "{text}")
        });
    }
}

/// Write to stdout. A closed or full stdout is logged and otherwise ignored.
fn emit(write: impl FnOnce(&mut StdoutLock<'static>) -> io::Result<()>) {
    let mut out = io::stdout().lock();
    if let Err(e) = write(&mut out) {
        tracing::debug!("stdout closed: {e}");
    }
}

pub fn status_line(snap: &Snapshot) -> String {
    let state = if snap.running { "running" } else { "paused" };
    match snap.mode {
        Mode::Regular => format!("{} {state}", snap.clock()),
        Mode::Pomodoro => format!(
            "{} {} cycles:{} {state}",
            snap.phase.label(),
            snap.clock(),
            snap.completed_work_cycles
        ),
    }
}

/// Human text for the events worth announcing in plain mode.
pub fn event_line(event: &Event) -> Option<String> {
    match event {
        Event::TimerCompleted {
            mode,
            finished,
            next,
            ..
        } => {
            let completion = Completion {
                mode: *mode,
                finished: *finished,
                next: *next,
            };
            Some(completion.message().to_string())
        }
        Event::ModeChanged { to, .. } => Some(format!("mode: {}", mode_name(*to))),
        Event::TimerReset { .. } => Some("reset".into()),
        _ => None,
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Regular => "regular",
        Mode::Pomodoro => "pomodoro",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pomotick_core::Phase;

    #[test]
    fn regular_status() {
        let snap = Snapshot {
            remaining_secs: 90,
            running: true,
            mode: Mode::Regular,
            phase: Phase::Work,
            completed_work_cycles: 0,
        };
        assert_eq!(status_line(&snap), "01:30 running");
    }

    #[test]
    fn pomodoro_status() {
        let snap = Snapshot {
            remaining_secs: 300,
            running: false,
            mode: Mode::Pomodoro,
            phase: Phase::ShortBreak,
            completed_work_cycles: 3,
        };
        assert_eq!(status_line(&snap), "Short Break 05:00 cycles:3 paused");
    }

    #[test]
    fn completion_announced() {
        let event = Event::TimerCompleted {
            mode: Mode::Regular,
            finished: Phase::Work,
            next: None,
            completed_work_cycles: 0,
            remaining_secs: 0,
            at: Utc::now(),
        };
        assert_eq!(event_line(&event).as_deref(), Some("Time's up!"));

        let paused = Event::TimerPaused {
            remaining_secs: 4,
            at: Utc::now(),
        };
        assert_eq!(event_line(&paused), None);
    }
}
