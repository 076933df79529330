//! Configuration file loading.
//!
//! The agent reads a JSON file (path from `PINWATCH_CONFIG`, default
//! `config.json`) and turns it into a validated [`AgentConfig`]:
//!
//! ```json
//! {
//!   "lines": [{ "pin": 17, "default": 0 }, { "pin": 27 }],
//!   "pull": "down",
//!   "api_endpoint": "https://www.divera247.com/api/alarm?accesskey=",
//!   "api_key": "…",
//!   "request": { "type": "Einbruchalarm" },
//!   "max_tries": 3,
//!   "poll_interval_ms": 100,
//!   "gpio_chip": "gpiochip0"
//! }
//! ```
//!
//! `pin` is the line offset on `gpio_chip`; on a Raspberry Pi the offsets
//! of `gpiochip0` are the BCM numbers.
//!
//! A line without `default` rests at the level implied by `pull`. Older
//! single-input files with `gpio_pin` / `invert_gpio` instead of `lines`
//! are still accepted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use pinwatch_core::{AggregateConfig, ConfigError, Line, PinId, PinLevel, PullMode};

use crate::pins::{self, DEFAULT_GPIO_CHIP};

/// Config file used when `PINWATCH_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Fastest allowed poll cadence.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Slowest allowed poll cadence.
pub const MAX_POLL_INTERVAL_MS: u64 = 500;

const DEFAULT_MAX_TRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why the agent could not load its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is not valid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

/// One entry of the `lines` array.
#[derive(Debug, Clone, Deserialize)]
pub struct LineEntry {
    pub pin: PinId,
    /// `0` or `1`. Falls back to the pull mode's resting level.
    #[serde(default)]
    pub default: Option<i64>,
}

/// Raw contents of the JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub lines: Option<Vec<LineEntry>>,
    /// Single-input layout: alarm when this pin goes high.
    #[serde(default)]
    pub gpio_pin: Option<PinId>,
    /// Single-input layout: alarm when `gpio_pin` goes low instead.
    #[serde(default)]
    pub invert_gpio: bool,
    #[serde(default)]
    pub pull: PullMode,
    #[serde(alias = "endpoint")]
    pub api_endpoint: String,
    #[serde(default, alias = "credential")]
    pub api_key: String,
    #[serde(default = "empty_payload", alias = "payload")]
    pub request: serde_json::Value,
    #[serde(default = "default_max_tries", alias = "max_retries")]
    pub max_tries: u32,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Chip name (`gpiochip0`) or device path (`/dev/gpiochip0`).
    #[serde(default, alias = "chip")]
    pub gpio_chip: Option<String>,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_max_tries() -> u32 {
    DEFAULT_MAX_TRIES
}

fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Everything the agent needs to run, validated.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub aggregate: Arc<AggregateConfig>,
    pub poll_interval: Duration,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    /// Character device the lines are requested from.
    pub gpio_chip: PathBuf,
}

impl FileConfig {
    /// Resolve defaults and validate.
    pub fn into_agent_config(self) -> Result<AgentConfig, ConfigLoadError> {
        let lines = self.resolve_lines()?;
        let aggregate = AggregateConfig::new(
            lines,
            self.pull,
            self.api_endpoint,
            self.api_key,
            self.request,
            self.max_tries,
        )?;

        // A zero reqwest timeout fails every request before it is sent.
        if self.request_timeout_secs == 0 {
            return Err(ConfigLoadError::ZeroDuration("request_timeout_secs"));
        }

        let poll_ms = clamp_poll_interval(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS));
        let gpio_chip = pins::chip_path(self.gpio_chip.as_deref().unwrap_or(DEFAULT_GPIO_CHIP));

        Ok(AgentConfig {
            aggregate: Arc::new(aggregate),
            poll_interval: Duration::from_millis(poll_ms),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            gpio_chip,
        })
    }

    fn resolve_lines(&self) -> Result<Vec<Line>, ConfigError> {
        if let Some(entries) = &self.lines {
            return entries
                .iter()
                .map(|entry| -> Result<Line, ConfigError> {
                    let default_level = match entry.default {
                        None => self.pull.quiescent_level(),
                        Some(value) => PinLevel::from_bit(value).ok_or(
                            ConfigError::InvalidLevel {
                                pin: entry.pin,
                                value,
                            },
                        )?,
                    };
                    Ok(Line::new(entry.pin, default_level))
                })
                .collect();
        }

        Ok(self
            .gpio_pin
            .map(|pin| {
                let default_level = if self.invert_gpio {
                    PinLevel::High
                } else {
                    PinLevel::Low
                };
                vec![Line::new(pin, default_level)]
            })
            .unwrap_or_default())
    }
}

/// Keep the poll cadence within the supported range.
pub fn clamp_poll_interval(ms: u64) -> u64 {
    let clamped = ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
    if clamped != ms {
        tracing::warn!(
            requested_ms = ms,
            clamped_ms = clamped,
            "Poll interval out of range, clamping",
        );
    }
    clamped
}

/// Parse and validate a config document.
pub fn from_json_str(json: &str) -> Result<AgentConfig, ConfigLoadError> {
    let file: FileConfig = serde_json::from_str(json)?;
    file.into_agent_config()
}

/// Read and validate the config file at `path`.
pub fn load(path: &Path) -> Result<AgentConfig, ConfigLoadError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json_str(&json)
}

/// Config file path from `PINWATCH_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_PATH`].
pub fn config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("PINWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Apply environment overrides on top of a loaded config.
///
/// `lookup` returns the value of a variable, or `None` when it is unset.
pub fn apply_env(
    mut config: AgentConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AgentConfig, ConfigLoadError> {
    if let Some(value) = lookup("POLL_INTERVAL_MS") {
        let ms: u64 = value.trim().parse().map_err(|_| ConfigLoadError::InvalidEnv {
            name: "POLL_INTERVAL_MS",
            value: value.clone(),
        })?;
        config.poll_interval = Duration::from_millis(clamp_poll_interval(ms));
    }

    if let Some(chip) = lookup("PINWATCH_GPIO_CHIP") {
        config.gpio_chip = pins::chip_path(chip.trim());
    }

    Ok(config)
}

/// Load using environment variables.
///
/// | Env Var              | Default       | Description                        |
/// |----------------------|---------------|------------------------------------|
/// | `PINWATCH_CONFIG`    | `config.json` | Path to the JSON config file       |
/// | `POLL_INTERVAL_MS`   | from file     | Overrides `poll_interval_ms`       |
/// | `PINWATCH_GPIO_CHIP` | from file     | Overrides `gpio_chip`              |
pub fn load_from_env() -> Result<(PathBuf, AgentConfig), ConfigLoadError> {
    let lookup = |name: &str| std::env::var(name).ok();

    let path = config_path(lookup);
    let config = apply_env(load(&path)?, lookup)?;

    Ok((path, config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
