//! Tick driver.
//!
//! One tokio task owns the [`TimerEngine`] and is the only thing that ever
//! touches it. Commands come in over a channel, ticks come from a single
//! `Interval` that exists only while the engine is running. Both are
//! serialized through one `select!`, so a command and a tick never
//! interleave and no lock is needed.
//!
//! The interval is dropped as soon as a command leaves the engine stopped
//! (pause, reset, mode change, a zero custom time) and on shutdown. A tick
//! that still gets through is a no-op because `TimerEngine::tick` checks
//! `running` first.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::DriverError;
use crate::events::Event;
use crate::settings::Settings;
use crate::timer::{Mode, Snapshot, TimerEngine};

/// Tick cadence used by the CLI unless overridden.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Commands accepted by the driver task. Mirrors the engine's operations.
#[derive(Debug)]
pub enum Command {
    Start,
    Pause,
    Reset,
    SetCustomTime { minutes: i64, seconds: i64 },
    /// Raw text fields as typed; malformed input is ignored.
    SetCustomTimeInput { minutes: String, seconds: String },
    SetMode(Mode),
    UpdateSettings(Settings),
    /// Reply with the state after every earlier command has been applied.
    Query(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Handle to a running driver task.
///
/// Dropping the handle closes the command channel, which stops the task
/// and cancels any pending tick.
#[derive(Debug)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<TimerEngine>,
}

/// Start a driver task for `engine`. Must be called inside a tokio runtime.
///
/// Returns the handle plus the stream of engine events.
pub fn spawn(engine: TimerEngine, tick_period: Duration) -> (TimerHandle, mpsc::UnboundedReceiver<Event>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

    let task = tokio::spawn(run(engine, tick_period, command_rx, snapshot_tx, event_tx));

    let handle = TimerHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        task,
    };
    (handle, event_rx)
}

impl TimerHandle {
    pub fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.send(command).map_err(|_| DriverError::Closed)
    }

    pub fn start(&self) -> Result<(), DriverError> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<(), DriverError> {
        self.send(Command::Pause)
    }

    pub fn reset(&self) -> Result<(), DriverError> {
        self.send(Command::Reset)
    }

    pub fn set_custom_time(&self, minutes: i64, seconds: i64) -> Result<(), DriverError> {
        self.send(Command::SetCustomTime { minutes, seconds })
    }

    pub fn set_custom_time_input(&self, minutes: &str, seconds: &str) -> Result<(), DriverError> {
        self.send(Command::SetCustomTimeInput {
            minutes: minutes.to_string(),
            seconds: seconds.to_string(),
        })
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), DriverError> {
        self.send(Command::SetMode(mode))
    }

    pub fn update_settings(&self, settings: Settings) -> Result<(), DriverError> {
        self.send(Command::UpdateSettings(settings))
    }

    /// State after all previously sent commands have been applied.
    pub async fn query(&self) -> Result<Snapshot, DriverError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Query(tx))?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> Snapshot {
        *self.snapshots.borrow()
    }

    /// Receiver that is notified after every command or tick.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stop the task and hand back the engine in its final state.
    pub async fn shutdown(self) -> Result<TimerEngine, DriverError> {
        // The task may already be gone; joining below reports that.
        let _ = self.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| DriverError::Join(e.to_string()))
    }
}

async fn run(
    mut engine: TimerEngine,
    tick_period: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Snapshot>,
    events: mpsc::UnboundedSender<Event>,
) -> TimerEngine {
    let mut ticker: Option<Interval> = None;

    loop {
        sync_ticker(&engine, &mut ticker, tick_period);

        let event = tokio::select! {
            biased;
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(command) => apply(&mut engine, command),
            },
            _ = next_tick(&mut ticker) => engine.tick(),
        };

        // Events go out before the snapshot they produced.
        if let Some(event) = event {
            // Nobody listening is fine.
            let _ = events.send(event);
        }
        snapshots.send_replace(engine.snapshot());
    }

    tracing::debug!("timer driver stopped");
    engine
}

fn apply(engine: &mut TimerEngine, command: Command) -> Option<Event> {
    tracing::trace!(?command, "driver command");
    match command {
        Command::Start => engine.start(),
        Command::Pause => engine.pause(),
        Command::Reset => engine.reset(),
        Command::SetCustomTime { minutes, seconds } => engine.set_custom_time(minutes, seconds),
        Command::SetCustomTimeInput { minutes, seconds } => engine.set_custom_time_input(&minutes, &seconds),
        Command::SetMode(mode) => engine.set_mode(mode),
        Command::UpdateSettings(settings) => engine.update_settings(settings),
        Command::Query(reply) => {
            let _ = reply.send(engine.snapshot());
            None
        }
        Command::Shutdown => None,
    }
}

/// Keep exactly one interval while running and none otherwise.
fn sync_ticker(engine: &TimerEngine, ticker: &mut Option<Interval>, period: Duration) {
    if engine.is_running() {
        if ticker.is_none() {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(interval);
        }
    } else if ticker.take().is_some() {
        tracing::debug!("pending tick cancelled");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
