//! Pin-level primitives shared by every crate in the workspace.

use serde::{Deserialize, Serialize};

/// GPIO line number (BCM numbering on a Raspberry Pi).
pub type PinId = u32;

/// Logic level of a digital input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    /// Parse the `0`/`1` encoding used in configuration files.
    pub fn from_bit(bit: i64) -> Option<Self> {
        match bit {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_bit(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

/// What a single line returned on one poll tick.
///
/// `Unreadable` is a distinct outcome, never coerced into a level. The
/// aggregator treats it as "not deviating".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinReading {
    Level(PinLevel),
    Unreadable,
}

impl PinReading {
    pub fn level(self) -> Option<PinLevel> {
        match self {
            Self::Level(level) => Some(level),
            Self::Unreadable => None,
        }
    }
}

impl<E> From<Result<PinLevel, E>> for PinReading {
    fn from(result: Result<PinLevel, E>) -> Self {
        match result {
            Ok(level) => Self::Level(level),
            Err(_) => Self::Unreadable,
        }
    }
}

/// Pull resistor applied to every monitored line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullMode {
    #[serde(rename = "up", alias = "pull_up")]
    PullUp,
    #[default]
    #[serde(rename = "down", alias = "pull_down")]
    PullDown,
}

impl PullMode {
    /// Level an otherwise undriven line idles at under this pull.
    pub fn quiescent_level(self) -> PinLevel {
        match self {
            Self::PullUp => PinLevel::High,
            Self::PullDown => PinLevel::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PullUp => "up",
            Self::PullDown => "down",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bits() {
        assert_eq!(PinLevel::from_bit(0), Some(PinLevel::Low));
        assert_eq!(PinLevel::from_bit(1), Some(PinLevel::High));
        assert_eq!(PinLevel::from_bit(2), None);
        assert_eq!(PinLevel::from_bit(-1), None);
        assert_eq!(PinLevel::High.as_bit(), 1);
        assert_eq!(PinLevel::Low.inverted(), PinLevel::High);
    }

    #[test]
    fn failed_read_becomes_unreadable() {
        let ok: Result<PinLevel, ()> = Ok(PinLevel::High);
        let err: Result<PinLevel, ()> = Err(());
        assert_eq!(PinReading::from(ok), PinReading::Level(PinLevel::High));
        assert_eq!(PinReading::from(err), PinReading::Unreadable);
        assert_eq!(PinReading::Unreadable.level(), None);
    }

    #[test]
    fn pull_mode_quiescent_levels() {
        assert_eq!(PullMode::PullUp.quiescent_level(), PinLevel::High);
        assert_eq!(PullMode::PullDown.quiescent_level(), PinLevel::Low);
        assert_eq!(PullMode::default(), PullMode::PullDown);
    }

    #[test]
    fn pull_mode_accepts_aliases() {
        let up: PullMode = serde_json::from_str("\"pull_up\"").unwrap();
        let down: PullMode = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(up, PullMode::PullUp);
        assert_eq!(down, PullMode::PullDown);
    }
}
