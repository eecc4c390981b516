use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single countdown of a user-chosen length.
    #[default]
    Regular,
    /// Automatic work/break cycling.
    Pomodoro,
}

impl std::str::FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Mode::Regular),
            "pomodoro" => Ok(Mode::Pomodoro),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("expected 'regular' or 'pomodoro', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

/// The minutes/seconds pair a user typed for a regular countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomTime {
    pub minutes: u64,
    pub seconds: u64,
}

impl CustomTime {
    /// Accepts only non-negative values whose total fits in `u64` seconds.
    pub fn new(minutes: i64, seconds: i64) -> Result<Self, ValidationError> {
        let minutes = u64::try_from(minutes).map_err(|_| ValidationError::InvalidValue {
            field: "minutes".into(),
            message: format!("must be non-negative, got {minutes}"),
        })?;
        let seconds = u64::try_from(seconds).map_err(|_| ValidationError::InvalidValue {
            field: "seconds".into(),
            message: format!("must be non-negative, got {seconds}"),
        })?;
        let time = Self { minutes, seconds };
        time.total_secs().ok_or_else(|| ValidationError::InvalidValue {
            field: "minutes".into(),
            message: "countdown length overflows".into(),
        })?;
        Ok(time)
    }

    /// Parse the two raw text fields.
    pub fn parse(minutes: &str, seconds: &str) -> Result<Self, ValidationError> {
        Self::new(parse_field("minutes", minutes)?, parse_field("seconds", seconds)?)
    }

    pub fn total_secs(&self) -> Option<u64> {
        self.minutes.checked_mul(60)?.checked_add(self.seconds)
    }
}

fn parse_field(field: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ValidationError::InvalidValue {
            field: field.into(),
            message: format!("'{raw}' is not a whole number: {e}"),
        })
}

/// Read-only view of the engine for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub remaining_secs: u64,
    pub running: bool,
    pub mode: Mode,
    pub phase: Phase,
    pub completed_work_cycles: u32,
}

impl Snapshot {
    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }
}

/// Format seconds as "MM:SS". Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(90), "01:30");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(100 * 60 + 5), "100:05");
    }

    #[test]
    fn custom_time_rejects_negative() {
        assert!(CustomTime::new(-1, 0).is_err());
        assert!(CustomTime::new(0, -5).is_err());
        assert_eq!(CustomTime::new(1, 30).unwrap().total_secs(), Some(90));
    }

    #[test]
    fn custom_time_rejects_overflow() {
        assert!(CustomTime::new(i64::MAX, 0).is_err());
    }

    #[test]
    fn custom_time_parse() {
        assert_eq!(
            CustomTime::parse(" 2 ", "05").unwrap(),
            CustomTime { minutes: 2, seconds: 5 }
        );
        assert!(CustomTime::parse("abc", "0").is_err());
        assert!(CustomTime::parse("", "0").is_err());
        assert!(CustomTime::parse("1.5", "0").is_err());
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("Pomodoro".parse::<Mode>().unwrap(), Mode::Pomodoro);
        assert_eq!("regular".parse::<Mode>().unwrap(), Mode::Regular);
        assert!("stopwatch".parse::<Mode>().is_err());
    }
}
