//! In-memory transport for tests. Enabled by the `test-util` feature.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::transport::{AlertTransport, TransportError};

/// A request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub body: serde_json::Value,
    pub at: tokio::time::Instant,
}

/// Transport that replays canned outcomes and records every call.
///
/// Each call pops the next scripted outcome; once the script runs out the
/// fallback outcome (HTTP 200 unless changed) is returned forever.
/// `Err(reason)` entries come back as [`TransportError::Other`].
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<u16, String>>>,
    fallback: Result<u16, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Result<u16, String>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Ok(200),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call returns `status`.
    pub fn always(status: u16) -> Self {
        Self::new([]).with_fallback(Ok(status))
    }

    pub fn with_fallback(mut self, outcome: Result<u16, String>) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl AlertTransport for ScriptedTransport {
    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<u16, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                url: url.to_string(),
                body: body.clone(),
                at: tokio::time::Instant::now(),
            });

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        next.map_err(|reason| TransportError::Other(reason.into()))
    }
}
