//! Bounded-retry alert dispatch.
//!
//! [`AlertDispatcher`] POSTs the configured payload to the alert URL up to
//! `max_retries` times, pausing a fixed delay between failed attempts.
//! Only HTTP 200 counts as delivered. Running out of attempts is logged and
//! swallowed: a lost alert must never take the monitor down with it.
//!
//! Each alarm entry gets its own task via [`AlertDispatcher::spawn`]. Tasks
//! share nothing mutable, are never joined by the poll loop and cannot be
//! cancelled once started.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use pinwatch_core::AggregateConfig;

use crate::transport::AlertTransport;

/// Pause between a failed attempt and the next one.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// The only status code treated as a successful delivery.
pub const SUCCESS_STATUS: u16 = 200;

// ---------------------------------------------------------------------------
// Attempt records
// ---------------------------------------------------------------------------

/// Result of a single POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Delivered,
    /// The endpoint answered with a status other than 200.
    Rejected(u16),
    /// No response (connection, DNS, timeout...).
    Failed(String),
}

/// One attempt within a dispatch. Logged, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchAttempt {
    /// 1-based.
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

impl DispatchAttempt {
    pub fn is_delivered(&self) -> bool {
        self.outcome == AttemptOutcome::Delivered
    }
}

impl fmt::Display for DispatchAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Delivered => write!(f, "attempt {} delivered", self.attempt),
            AttemptOutcome::Rejected(status) => {
                write!(f, "attempt {} rejected with HTTP {status}", self.attempt)
            }
            AttemptOutcome::Failed(reason) => {
                write!(f, "attempt {} failed: {reason}", self.attempt)
            }
        }
    }
}

/// Summary of a finished dispatch sequence.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub attempts: u32,
    pub delivered: bool,
}

// ---------------------------------------------------------------------------
// AlertDispatcher
// ---------------------------------------------------------------------------

/// Delivers the configured alert with bounded retries.
pub struct AlertDispatcher {
    config: Arc<AggregateConfig>,
    transport: Arc<dyn AlertTransport>,
    retry_delay: Duration,
}

impl AlertDispatcher {
    pub fn new(config: Arc<AggregateConfig>, transport: Arc<dyn AlertTransport>) -> Self {
        Self {
            config,
            transport,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Run one full attempt sequence.
    ///
    /// Never fails: the returned report says whether the alert got through.
    pub async fn dispatch(&self) -> DispatchReport {
        let dispatch_id = Uuid::now_v7();
        let started_at = Utc::now();
        let max_attempts = self.config.max_retries();
        // The URL embeds the credential, so only the endpoint is ever logged.
        let url = self.config.alert_url();

        tracing::info!(
            %dispatch_id,
            endpoint = self.config.endpoint(),
            max_attempts,
            "Sending alert",
        );

        for attempt in 1..=max_attempts {
            let record = DispatchAttempt {
                attempt,
                outcome: self.attempt_once(&url).await,
            };

            if record.is_delivered() {
                tracing::info!(%dispatch_id, attempt, "Successfully sent alert");
                return DispatchReport {
                    dispatch_id,
                    started_at,
                    attempts: attempt,
                    delivered: true,
                };
            }

            tracing::warn!(
                %dispatch_id,
                attempt,
                max_attempts,
                outcome = %record,
                "Failed to send alert",
            );

            if attempt < max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        tracing::error!(
            %dispatch_id,
            attempts = max_attempts,
            "Alert delivery abandoned after all attempts",
        );

        DispatchReport {
            dispatch_id,
            started_at,
            attempts: max_attempts,
            delivered: false,
        }
    }

    /// Start [`dispatch`](Self::dispatch) as an independent task.
    ///
    /// The handle may be dropped; the task runs to completion regardless.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<DispatchReport> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch().await })
    }

    async fn attempt_once(&self, url: &str) -> AttemptOutcome {
        match self.transport.post(url, self.config.payload()).await {
            Ok(SUCCESS_STATUS) => AttemptOutcome::Delivered,
            Ok(status) => AttemptOutcome::Rejected(status),
            Err(e) => AttemptOutcome::Failed(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
