//! Aggregate alarm verdict across all monitored lines.
//!
//! Pure logic, evaluated once per poll tick. The alarm condition requires
//! **every** configured line to sit away from its default level at the
//! same time; a single deviating line is not enough. This suppresses
//! false positives from one flaky input and must not be relaxed to an
//! "any line" rule.

use std::fmt;

use crate::config::Line;
use crate::types::PinReading;

/// Normal/alarm verdict for one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AggregateState {
    #[default]
    Normal,
    Alarm,
}

impl AggregateState {
    pub fn is_alarm(self) -> bool {
        matches!(self, Self::Alarm)
    }
}

impl fmt::Display for AggregateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Alarm => f.write_str("alarm"),
        }
    }
}

/// Line counts behind a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub deviating: usize,
    pub unreadable: usize,
}

impl Tally {
    /// Alarm iff every line deviates. An empty tally is `Normal`.
    pub fn state(&self) -> AggregateState {
        if self.total > 0 && self.deviating >= self.total {
            AggregateState::Alarm
        } else {
            AggregateState::Normal
        }
    }
}

/// Count deviating and unreadable lines.
///
/// `readings` is matched to `lines` by position. A missing reading counts
/// as unreadable, and unreadable lines never count as deviating.
pub fn tally(lines: &[Line], readings: &[PinReading]) -> Tally {
    let mut tally = Tally {
        total: lines.len(),
        ..Tally::default()
    };

    for (idx, line) in lines.iter().enumerate() {
        match readings.get(idx).copied().unwrap_or(PinReading::Unreadable) {
            PinReading::Level(level) if level != line.default_level => tally.deviating += 1,
            PinReading::Level(_) => {}
            PinReading::Unreadable => tally.unreadable += 1,
        }
    }

    tally
}

/// Aggregate verdict for the current readings.
pub fn evaluate(lines: &[Line], readings: &[PinReading]) -> AggregateState {
    tally(lines, readings).state()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
