mod engine;
mod state;

pub use engine::TimerEngine;
pub use state::{format_clock, CustomTime, Mode, Phase, Snapshot};
