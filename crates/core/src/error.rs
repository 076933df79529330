use crate::types::PinId;

/// Reasons an [`AggregateConfig`](crate::config::AggregateConfig) is refused.
///
/// Every variant is fatal: the monitor must not start with an invalid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one input line must be configured")]
    NoLines,

    #[error("Pin {0} is configured more than once")]
    DuplicatePin(PinId),

    #[error("API credential is missing")]
    MissingCredential,

    #[error("API credential is still the placeholder value '{0}'")]
    PlaceholderCredential(String),

    #[error("Alert endpoint must be an http(s) URL, got '{0}'")]
    InvalidEndpoint(String),

    #[error("max_retries must be at least 1, got {0}")]
    InvalidMaxRetries(u32),

    #[error("Default level for pin {pin} must be 0 or 1, got {value}")]
    InvalidLevel { pin: PinId, value: i64 },
}
