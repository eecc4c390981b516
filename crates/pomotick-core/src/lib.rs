//! # pomotick Core Library
//!
//! This library provides the core logic for the pomotick countdown and
//! Pomodoro timer. The CLI binary is a thin terminal layer over the same
//! engine.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-driven state machine. Every call to `tick()`
//!   removes one second; completions advance the Pomodoro phase in place.
//! - **Tick Driver**: A tokio task that owns the engine, serializes commands
//!   and ticks, and keeps at most one pending tick alive while running.
//! - **Storage**: TOML-based configuration of the Pomodoro settings.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerHandle`]: Command/snapshot handle to a running driver
//! - [`CompletionSignal`]: Injected notification/alarm capability
//! - [`Config`]: Application configuration management

pub mod driver;
pub mod error;
pub mod events;
pub mod settings;
pub mod signal;
pub mod storage;
pub mod timer;

pub use driver::{Command, TimerHandle};
pub use error::{ConfigError, DriverError, ValidationError};
pub use events::Event;
pub use settings::Settings;
pub use signal::{Completion, CompletionSignal, SilentSignal};
pub use storage::Config;
pub use timer::{CustomTime, Mode, Phase, Snapshot, TimerEngine};
