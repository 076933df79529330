//! The poll loop.
//!
//! [`MonitorLoop`] reads every configured line on a fixed cadence, computes
//! the aggregate state and reacts to transitions:
//!
//! - Normal → Alarm: spawns an alert dispatch and moves on without
//!   waiting for it.
//! - Alarm → Normal: logs the recovery; no alert is sent.
//!
//! The loop itself never awaits anything but its own ticker, so a slow or
//! failing alert endpoint cannot delay polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use pinwatch_core::aggregate::{self, AggregateState};
use pinwatch_core::{AggregateConfig, EdgeDetector, PinReading, PinSource, TransitionEvent};
use pinwatch_dispatch::{AlertDispatcher, DispatchReport};

/// What happened on one tick.
#[derive(Debug)]
pub struct Tick {
    pub state: AggregateState,
    pub transition: Option<TransitionEvent>,
    /// Present when this tick entered alarm. Dropping it detaches the task.
    pub dispatch: Option<JoinHandle<DispatchReport>>,
}

pub struct MonitorLoop {
    config: Arc<AggregateConfig>,
    pins: Arc<dyn PinSource>,
    dispatcher: Arc<AlertDispatcher>,
    detector: EdgeDetector,
    poll_interval: Duration,
    /// Reused between ticks; one entry per configured line.
    readings: Vec<PinReading>,
    /// Per-line flag so read failures are logged once, not every tick.
    unreadable: Vec<bool>,
}

impl MonitorLoop {
    pub fn new(
        config: Arc<AggregateConfig>,
        pins: Arc<dyn PinSource>,
        dispatcher: Arc<AlertDispatcher>,
        poll_interval: Duration,
    ) -> Self {
        let line_count = config.lines().len();
        Self {
            config,
            pins,
            dispatcher,
            detector: EdgeDetector::new(),
            poll_interval,
            readings: Vec::with_capacity(line_count),
            unreadable: vec![false; line_count],
        }
    }

    /// State observed on the most recent tick (`Normal` before the first).
    pub fn state(&self) -> AggregateState {
        self.detector.previous()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run one poll cycle.
    ///
    /// Must be called from within a Tokio runtime, since an alarm entry
    /// spawns the dispatch task.
    pub fn tick(&mut self) -> Tick {
        self.read_lines();

        let tally = aggregate::tally(self.config.lines(), &self.readings);
        let state = tally.state();
        let transition = self.detector.observe(state);

        let dispatch = match transition {
            Some(event) if event.is_alarm_entry() => {
                tracing::info!(
                    deviating = tally.deviating,
                    total = tally.total,
                    "Lines switched to alarm state, sending alert",
                );
                Some(self.dispatcher.spawn())
            }
            Some(_) => {
                tracing::info!(
                    deviating = tally.deviating,
                    unreadable = tally.unreadable,
                    total = tally.total,
                    "Lines switched to normal state",
                );
                None
            }
            None => None,
        };

        Tick {
            state,
            transition,
            dispatch,
        }
    }

    /// Poll forever. Only returns if the surrounding task is dropped.
    pub async fn run(mut self) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            lines = self.config.lines().len(),
            "Starting monitoring",
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            // Dispatch handles are dropped here; those tasks run on their own.
            self.tick();
        }
    }

    fn read_lines(&mut self) {
        self.readings.clear();

        for (idx, line) in self.config.lines().iter().enumerate() {
            let reading = match self.pins.read_level(line.pin) {
                Ok(level) => {
                    if self.unreadable[idx] {
                        self.unreadable[idx] = false;
                        tracing::info!(pin = line.pin, "Line readable again");
                    }
                    PinReading::Level(level)
                }
                Err(e) => {
                    if !self.unreadable[idx] {
                        self.unreadable[idx] = true;
                        tracing::warn!(
                            pin = line.pin,
                            error = %e,
                            "Line unreadable -- treating it as not deviating",
                        );
                    }
                    PinReading::Unreadable
                }
            };
            self.readings.push(reading);
        }
    }
}
