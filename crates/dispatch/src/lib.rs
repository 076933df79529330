//! Alert delivery for the pinwatch monitor.
//!
//! - [`transport`]: the [`AlertTransport`] port and the reqwest-backed
//!   [`HttpTransport`].
//! - [`dispatcher`]: [`AlertDispatcher`], the bounded-retry sequence run
//!   as an independent task per alarm entry.
//! - `testing` (feature `test-util`): `ScriptedTransport`, an in-memory
//!   transport that replays canned outcomes.

pub mod dispatcher;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

pub use dispatcher::{
    AlertDispatcher, AttemptOutcome, DispatchAttempt, DispatchReport, DEFAULT_RETRY_DELAY,
};
pub use transport::{AlertTransport, HttpTransport, TransportError};
