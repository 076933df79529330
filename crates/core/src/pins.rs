//! Pin access port.
//!
//! The monitor only needs "what level is this line at right now". Hardware
//! adapters implement [`PinSource`]; [`MockPins`] is an in-memory source for
//! tests and bench setups without GPIO hardware.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::Line;
use crate::types::{PinId, PinLevel, PullMode};

/// Why a line could not be read.
#[derive(Debug, thiserror::Error)]
pub enum PinReadError {
    #[error("Pin {0} is not available")]
    Unavailable(PinId),

    #[error("Pin {pin} returned an invalid value '{raw}'")]
    InvalidValue { pin: PinId, raw: String },

    #[error("GPIO device error on pin {pin}: {source}")]
    Device {
        pin: PinId,
        #[source]
        source: BoxError,
    },

    #[error("Failed to request input lines from {target}: {source}")]
    Setup {
        target: String,
        #[source]
        source: BoxError,
    },
}

/// Error type reported by a hardware backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Live access to the level of input lines.
///
/// Reads are expected to be near-instantaneous; the poll loop calls
/// `read_level` for every line on every tick.
pub trait PinSource: Send + Sync {
    /// Configure the lines as inputs before polling starts.
    fn prepare(&self, _lines: &[Line], _pull: PullMode) -> Result<(), PinReadError> {
        Ok(())
    }

    fn read_level(&self, pin: PinId) -> Result<PinLevel, PinReadError>;
}

/// In-memory pin levels. Pins never set read as unavailable.
#[derive(Debug, Default)]
pub struct MockPins {
    levels: RwLock<HashMap<PinId, Option<PinLevel>>>,
}

impl MockPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with every line at its default level.
    pub fn at_defaults(lines: &[Line]) -> Self {
        let pins = Self::new();
        for line in lines {
            pins.set(line.pin, line.default_level);
        }
        pins
    }

    pub fn set(&self, pin: PinId, level: PinLevel) {
        self.levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pin, Some(level));
    }

    /// Make subsequent reads of `pin` fail with an invalid value.
    pub fn set_unreadable(&self, pin: PinId) {
        self.levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pin, None);
    }
}

impl PinSource for MockPins {
    fn read_level(&self, pin: PinId) -> Result<PinLevel, PinReadError> {
        let levels = self.levels.read().unwrap_or_else(PoisonError::into_inner);
        match levels.get(&pin) {
            Some(Some(level)) => Ok(*level),
            Some(None) => Err(PinReadError::InvalidValue {
                pin,
                raw: String::new(),
            }),
            None => Err(PinReadError::Unavailable(pin)),
        }
    }
}
