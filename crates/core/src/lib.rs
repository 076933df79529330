//! Domain logic for the pinwatch monitor.
//!
//! Pure types and functions only: no I/O, no async runtime. The agent
//! crate supplies pin access and drives the loop; the dispatch crate
//! delivers alerts.
//!
//! - [`types`]: pin levels, per-tick readings, pull mode.
//! - [`config`]: validated, immutable [`AggregateConfig`].
//! - [`aggregate`]: the all-lines-deviating alarm verdict.
//! - [`edge`]: transition detection between consecutive ticks.
//! - [`pins`]: the [`PinSource`] port and an in-memory implementation.

pub mod aggregate;
pub mod config;
pub mod edge;
pub mod error;
pub mod pins;
pub mod types;

pub use aggregate::{evaluate, AggregateState, Tally};
pub use config::{AggregateConfig, Line};
pub use edge::{EdgeDetector, TransitionEvent};
pub use error::ConfigError;
pub use pins::{MockPins, PinReadError, PinSource};
pub use types::{PinId, PinLevel, PinReading, PullMode};
