//! Transition detection between consecutive poll ticks.

use crate::aggregate::AggregateState;

/// A change of aggregate state between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub from: AggregateState,
    pub to: AggregateState,
}

impl TransitionEvent {
    /// Normal → Alarm. The only transition that sends an alert.
    pub fn is_alarm_entry(&self) -> bool {
        self.to.is_alarm() && !self.from.is_alarm()
    }

    /// Alarm → Normal.
    pub fn is_recovery(&self) -> bool {
        self.from.is_alarm() && !self.to.is_alarm()
    }
}

/// Emit an event only when the state strictly changes.
pub fn detect(previous: AggregateState, current: AggregateState) -> Option<TransitionEvent> {
    (previous != current).then_some(TransitionEvent {
        from: previous,
        to: current,
    })
}

/// Remembers the previous tick's state.
///
/// Starts at `Normal`, so a device that boots already in alarm still
/// reports an alarm entry on its first alarm tick.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    previous: AggregateState,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> AggregateState {
        self.previous
    }

    /// Compare against the previous tick and remember `current`.
    pub fn observe(&mut self, current: AggregateState) -> Option<TransitionEvent> {
        let event = detect(self.previous, current);
        self.previous = current;
        event
    }
}
