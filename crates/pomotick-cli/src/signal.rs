//! Desktop completion signal: notification plus terminal bell.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use notify_rust::Notification;
use pomotick_core::{Completion, CompletionSignal};
use tokio::task::JoinHandle;

pub struct DesktopSignal {
    notify: bool,
    bell: bool,
    summary: String,
    alarm_active: AtomicBool,
    /// Notifications still being delivered.
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl DesktopSignal {
    pub fn new(notify: bool, bell: bool, summary: impl Into<String>) -> Self {
        Self {
            notify,
            bell,
            summary: summary.into(),
            alarm_active: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Wait up to `grace` for notifications that are still in flight.
    pub async fn wait_pending(&self, grace: Duration) {
        let pending: Vec<_> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if pending.is_empty() {
            return;
        }
        let joined = tokio::time::timeout(grace, async {
            for task in pending {
                if let Err(e) = task.await {
                    tracing::warn!("desktop notification task failed: {e}");
                }
            }
        })
        .await;
        if joined.is_err() {
            tracing::warn!("gave up waiting for desktop notification after {grace:?}");
        }
    }
}

fn show_notification(summary: &str, body: &str) {
    match Notification::new().summary(summary).body(body).show() {
        Ok(_) => tracing::debug!("desktop notification shown"),
        Err(e) => tracing::warn!("desktop notification unavailable: {e}"),
    }
}

impl CompletionSignal for DesktopSignal {
    fn signal_completion(&self, completion: &Completion) {
        let body = completion.message();

        if self.notify {
            let summary = self.summary.clone();
            // D-Bus round trips can stall; keep them off the driver task.
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let task = runtime.spawn_blocking(move || show_notification(&summary, body));
                    let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                    pending.retain(|task| !task.is_finished());
                    pending.push(task);
                }
                Err(_) => show_notification(&summary, body),
            }
        }

        if self.bell {
            let mut err = std::io::stderr();
            if let Err(e) = err.write_all(b"\x07").and_then(|()| err.flush()) {
                tracing::warn!("cannot ring terminal bell: {e}");
            }
            self.alarm_active.store(true, Ordering::SeqCst);
        }
    }

    fn silence(&self) {
        if self.alarm_active.swap(false, Ordering::SeqCst) {
            tracing::debug!("alarm silenced");
        }
    }
}
