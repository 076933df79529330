//! Validated monitor configuration.
//!
//! [`AggregateConfig`] can only be built through [`AggregateConfig::new`],
//! which enforces every start-up invariant. Once built it is never
//! mutated and is shared read-only (usually behind an `Arc`) by the poll
//! loop and every dispatch task.

use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;
use crate::types::{PinId, PinLevel, PullMode};

/// Credentials shipped in sample configs that must never reach the API.
pub const PLACEHOLDER_CREDENTIALS: &[&str] = &["YOURKEY", "YOUR_API_KEY", "CHANGEME"];

/// One monitored input and the level it rests at when nothing is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub pin: PinId,
    pub default_level: PinLevel,
}

impl Line {
    pub fn new(pin: PinId, default_level: PinLevel) -> Self {
        Self { pin, default_level }
    }
}

/// Immutable description of the monitored lines and the alert call.
#[derive(Clone)]
pub struct AggregateConfig {
    lines: Vec<Line>,
    pull_mode: PullMode,
    endpoint: String,
    credential: String,
    payload: serde_json::Value,
    max_retries: u32,
}

impl AggregateConfig {
    /// Validate and build a configuration.
    ///
    /// The credential is trimmed; everything else is stored as given.
    pub fn new(
        lines: Vec<Line>,
        pull_mode: PullMode,
        endpoint: impl Into<String>,
        credential: impl Into<String>,
        payload: serde_json::Value,
        max_retries: u32,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        let credential = credential.into().trim().to_string();

        validate_lines(&lines)?;
        validate_endpoint(&endpoint)?;
        validate_credential(&credential)?;
        if max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(max_retries));
        }

        Ok(Self {
            lines,
            pull_mode,
            endpoint,
            credential,
            payload,
            max_retries,
        })
    }

    /// Monitored lines in configuration order. Never empty.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn pull_mode(&self) -> PullMode {
        self.pull_mode
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Upper bound on delivery attempts per dispatch. Always `>= 1`.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Full alert URL: the endpoint with the credential appended verbatim.
    pub fn alert_url(&self) -> String {
        format!("{}{}", self.endpoint, self.credential)
    }

    /// One-line, credential-free description for start-up logging.
    pub fn summary(&self) -> String {
        let lines: Vec<String> = self
            .lines
            .iter()
            .map(|l| format!("{}={}", l.pin, l.default_level.as_bit()))
            .collect();
        format!(
            "lines=[{}] pull={} endpoint={} max_retries={}",
            lines.join(","),
            self.pull_mode.as_str(),
            self.endpoint,
            self.max_retries,
        )
    }
}

impl fmt::Debug for AggregateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateConfig")
            .field("lines", &self.lines)
            .field("pull_mode", &self.pull_mode)
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("payload", &self.payload)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn validate_lines(lines: &[Line]) -> Result<(), ConfigError> {
    if lines.is_empty() {
        return Err(ConfigError::NoLines);
    }
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.pin) {
            return Err(ConfigError::DuplicatePin(line.pin));
        }
    }
    Ok(())
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidEndpoint(endpoint.to_string())),
    }
}

fn validate_credential(credential: &str) -> Result<(), ConfigError> {
    if credential.is_empty() {
        return Err(ConfigError::MissingCredential);
    }
    if PLACEHOLDER_CREDENTIALS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(credential))
    {
        return Err(ConfigError::PlaceholderCredential(credential.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
