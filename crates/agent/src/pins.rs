//! GPIO character-device adapter.
//!
//! [`CdevPins`] requests every monitored line as an input from one GPIO chip
//! (`/dev/gpiochipN`) and reads levels by line offset. The configured pull
//! mode is applied as line bias by the kernel when the lines are requested,
//! so no external resistor setup is needed.
//!
//! The lines stay requested for the lifetime of the adapter and show up in
//! `gpioinfo` with the consumer label [`CONSUMER`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gpiocdev::line::{Bias, Value};
use gpiocdev::Request;

use pinwatch_core::{Line, PinId, PinLevel, PinReadError, PinSource, PullMode};

/// Chip used when the config does not name one.
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Consumer label attached to the requested lines.
pub const CONSUMER: &str = "pinwatch";

/// Resolve a chip name (`gpiochip0`) or path (`/dev/gpiochip0`) to a path.
pub fn chip_path(chip: &str) -> PathBuf {
    if chip.contains('/') {
        PathBuf::from(chip)
    } else {
        Path::new("/dev").join(chip)
    }
}

pub struct CdevPins {
    chip: PathBuf,
    /// Set by `prepare`. Reads before that report the line unavailable.
    request: OnceLock<Request>,
}

impl CdevPins {
    pub fn new(chip: impl Into<PathBuf>) -> Self {
        Self {
            chip: chip.into(),
            request: OnceLock::new(),
        }
    }

    pub fn chip(&self) -> &Path {
        &self.chip
    }
}

impl PinSource for CdevPins {
    /// Request all lines as inputs with bias taken from `pull`.
    ///
    /// Fails if the chip does not exist, an offset is out of range, or a
    /// line is already held by another consumer.
    fn prepare(&self, lines: &[Line], pull: PullMode) -> Result<(), PinReadError> {
        if self.request.get().is_some() {
            tracing::debug!(chip = %self.chip.display(), "GPIO lines already requested");
            return Ok(());
        }

        let offsets: Vec<PinId> = lines.iter().map(|line| line.pin).collect();
        let request = Request::builder()
            .on_chip(self.chip.clone())
            .with_consumer(CONSUMER)
            .with_lines(&offsets)
            .as_input()
            .with_bias(bias_for(pull))
            .request()
            .map_err(|e| PinReadError::Setup {
                target: self.chip.display().to_string(),
                source: Box::new(e),
            })?;

        if self.request.set(request).is_err() {
            tracing::debug!(chip = %self.chip.display(), "GPIO lines already requested");
            return Ok(());
        }

        tracing::info!(
            chip = %self.chip.display(),
            lines = ?offsets,
            pull = pull.as_str(),
            "GPIO lines requested as inputs",
        );
        Ok(())
    }

    fn read_level(&self, pin: PinId) -> Result<PinLevel, PinReadError> {
        let request = self.request.get().ok_or(PinReadError::Unavailable(pin))?;
        let value = request.value(pin).map_err(|e| PinReadError::Device {
            pin,
            source: Box::new(e),
        })?;
        Ok(level_from_value(value))
    }
}

fn bias_for(pull: PullMode) -> Bias {
    match pull {
        PullMode::PullUp => Bias::PullUp,
        PullMode::PullDown => Bias::PullDown,
    }
}

/// Lines are requested active-high, so `Active` is the physical high level.
fn level_from_value(value: Value) -> PinLevel {
    match value {
        Value::Active => PinLevel::High,
        Value::Inactive => PinLevel::Low,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
