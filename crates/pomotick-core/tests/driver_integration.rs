//! Tick driver integration tests.
//!
//! Uses tokio's paused clock so a "second" passes instantly and
//! deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pomotick_core::driver::{self, DEFAULT_TICK_PERIOD};
use pomotick_core::{Completion, CompletionSignal, DriverError, Event, Mode, Phase, Settings, TimerEngine};
use tokio::time::sleep;

#[derive(Default)]
struct CountingSignal {
    completions: AtomicUsize,
    silences: AtomicUsize,
}

impl CompletionSignal for CountingSignal {
    fn signal_completion(&self, _completion: &Completion) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn silence(&self) {
        self.silences.fetch_add(1, Ordering::SeqCst);
    }
}

fn engine(settings: Settings) -> (TimerEngine, Arc<CountingSignal>) {
    let signal = Arc::new(CountingSignal::default());
    (TimerEngine::new(settings, signal.clone()), signal)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[tokio::test(start_paused = true)]
async fn regular_countdown_runs_to_completion() {
    let (engine, signal) = engine(Settings::default());
    let (handle, mut events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_custom_time(0, 3).unwrap();
    handle.start().unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(handle.snapshot().remaining_secs, 2);
    assert!(handle.snapshot().running);

    sleep(secs(5)).await;
    let snap = handle.snapshot();
    assert_eq!(snap.remaining_secs, 0);
    assert!(!snap.running);
    assert_eq!(signal.completions.load(Ordering::SeqCst), 1);

    let mut completed = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::TimerCompleted { .. }) {
            completed += 1;
        }
    }
    assert_eq!(completed, 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pause_cancels_pending_tick() {
    let (engine, _) = engine(Settings::default());
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_custom_time(1, 0).unwrap();
    handle.start().unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(handle.snapshot().remaining_secs, 58);

    handle.pause().unwrap();
    sleep(secs(10)).await;
    let snap = handle.snapshot();
    assert_eq!(snap.remaining_secs, 58);
    assert!(!snap.running);

    // Resuming arms a fresh full period.
    handle.start().unwrap();
    sleep(Duration::from_millis(900)).await;
    assert_eq!(handle.snapshot().remaining_secs, 58);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.snapshot().remaining_secs, 57);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn repeated_start_keeps_single_cadence() {
    let (engine, _) = engine(Settings::default());
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_custom_time(0, 30).unwrap();
    handle.start().unwrap();
    handle.start().unwrap();
    handle.start().unwrap();
    sleep(Duration::from_millis(4500)).await;
    assert_eq!(handle.snapshot().remaining_secs, 26);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pomodoro_auto_continues_through_phases() {
    let (engine, signal) = engine(Settings::new(2, 1, 3, 2));
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_mode(Mode::Pomodoro).unwrap();
    handle.start().unwrap();

    // work(2) + short(1) + work(2) = 5s, then the long break is armed.
    sleep(Duration::from_millis(5500)).await;
    let snap = handle.snapshot();
    assert_eq!(snap.phase, Phase::LongBreak);
    assert_eq!(snap.remaining_secs, 3);
    assert_eq!(snap.completed_work_cycles, 2);
    assert!(snap.running);
    assert_eq!(signal.completions.load(Ordering::SeqCst), 3);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn mode_switch_while_running_stops_ticking() {
    let (engine, _) = engine(Settings::new(60, 5, 15, 4));
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_mode(Mode::Pomodoro).unwrap();
    handle.start().unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(handle.snapshot().remaining_secs, 58);

    handle.set_mode(Mode::Regular).unwrap();
    sleep(secs(5)).await;
    let snap = handle.snapshot();
    assert!(!snap.running);
    assert_eq!(snap.remaining_secs, 0);
    assert_eq!(snap.mode, Mode::Regular);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_silences_and_stops() {
    let (engine, signal) = engine(Settings::new(60, 5, 15, 4));
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_mode(Mode::Pomodoro).unwrap();
    handle.start().unwrap();
    sleep(Duration::from_millis(3500)).await;
    handle.reset().unwrap();
    sleep(secs(3)).await;

    let snap = handle.snapshot();
    assert!(!snap.running);
    assert_eq!(snap.remaining_secs, 60);
    assert_eq!(signal.silences.load(Ordering::SeqCst), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn settings_change_while_paused_updates_display() {
    let (engine, _) = engine(Settings::new(60, 5, 15, 4));
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_mode(Mode::Pomodoro).unwrap();
    handle.update_settings(Settings::new(90, 5, 15, 4)).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.snapshot().remaining_secs, 90);

    handle.start().unwrap();
    sleep(Duration::from_millis(1500)).await;
    handle.update_settings(Settings::new(30, 5, 15, 4)).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.snapshot().remaining_secs, 89);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_change() {
    let (engine, _) = engine(Settings::default());
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);
    let mut rx = handle.subscribe();

    handle.set_custom_time(0, 2).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().remaining_secs, 2);

    handle.start().unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().running);

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().remaining_secs, 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_returns_engine_and_closes_channel() {
    let (engine, _) = engine(Settings::default());
    let (handle, mut events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_custom_time(0, 10).unwrap();
    handle.start().unwrap();
    sleep(Duration::from_millis(2500)).await;

    let engine = handle.shutdown().await.unwrap();
    assert_eq!(engine.remaining_secs(), 8);

    // Drain, then the sender side is gone.
    while events.try_recv().is_ok() {}
    assert!(events.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn commands_after_driver_exit_are_reported() {
    let (engine, _) = engine(Settings::default());
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);
    handle.send(pomotick_core::Command::Shutdown).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.start(), Err(DriverError::Closed));
}

#[tokio::test(start_paused = true)]
async fn query_sees_all_prior_commands() {
    let (engine, _) = engine(Settings::default());
    let (handle, _events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_custom_time(2, 5).unwrap();
    handle.start().unwrap();
    let snap = handle.query().await.unwrap();
    assert_eq!(snap.remaining_secs, 125);
    assert!(snap.running);

    handle.set_custom_time(-1, 0).unwrap();
    assert_eq!(handle.query().await.unwrap().remaining_secs, 125);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn raw_custom_time_input_is_parsed_by_the_engine() {
    let (engine, _) = engine(Settings::default());
    let (handle, mut events) = driver::spawn(engine, DEFAULT_TICK_PERIOD);

    handle.set_custom_time_input(" 1 ", "30").unwrap();
    assert_eq!(handle.query().await.unwrap().remaining_secs, 90);
    assert!(matches!(
        events.recv().await,
        Some(Event::CustomTimeSet { minutes: 1, seconds: 30, .. })
    ));

    handle.set_custom_time_input("ten", "0").unwrap();
    handle.set_custom_time_input("1", "-3").unwrap();
    assert_eq!(handle.query().await.unwrap().remaining_secs, 90);
    assert!(events.try_recv().is_err());

    handle.shutdown().await.unwrap();
}
