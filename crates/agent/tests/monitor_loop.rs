//! Integration tests for the poll loop.
//!
//! Uses [`MockPins`] for the inputs and [`ScriptedTransport`] for the alert
//! API. Tokio's clock is paused so retry delays elapse instantly and
//! deterministically.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use pinwatch_agent::monitor::MonitorLoop;
use pinwatch_core::{AggregateConfig, AggregateState, Line, MockPins, PinLevel, PinSource, PullMode};
use pinwatch_dispatch::testing::ScriptedTransport;
use pinwatch_dispatch::{AlertDispatcher, AlertTransport};

const POLL: Duration = Duration::from_millis(10);

struct Harness {
    pins: Arc<MockPins>,
    transport: Arc<ScriptedTransport>,
    monitor: MonitorLoop,
}

fn harness(lines: Vec<Line>, transport: ScriptedTransport) -> Harness {
    let config = Arc::new(
        AggregateConfig::new(
            lines,
            PullMode::PullDown,
            "https://alerts.example.com/api/alarm?accesskey=",
            "k3y",
            json!({"type": "ALARM"}),
            3,
        )
        .unwrap(),
    );

    let pins = Arc::new(MockPins::at_defaults(config.lines()));
    let transport = Arc::new(transport);

    let transport_dyn: Arc<dyn AlertTransport> = transport.clone();
    let dispatcher = Arc::new(AlertDispatcher::new(config.clone(), transport_dyn));
    let pins_dyn: Arc<dyn PinSource> = pins.clone();
    let monitor = MonitorLoop::new(config, pins_dyn, dispatcher, POLL);

    Harness {
        pins,
        transport,
        monitor,
    }
}

fn two_lines() -> Vec<Line> {
    vec![Line::new(17, PinLevel::Low), Line::new(27, PinLevel::Low)]
}

// ---------------------------------------------------------------------------
// Test: alarm entry and recovery
// ---------------------------------------------------------------------------

/// Lines 17 and 27 default low. Both high → alarm and one alert; 27 back
/// low → normal, and no second alert.
#[tokio::test(start_paused = true)]
async fn alarm_then_recovery_sends_one_alert() {
    let mut h = harness(two_lines(), ScriptedTransport::always(200));

    assert!(h.monitor.tick().dispatch.is_none());

    h.pins.set(17, PinLevel::High);
    h.pins.set(27, PinLevel::High);
    let tick = h.monitor.tick();
    assert_eq!(tick.state, AggregateState::Alarm);
    assert!(tick.transition.is_some_and(|e| e.is_alarm_entry()));
    let report = tick.dispatch.expect("alarm entry spawns a dispatch").await.unwrap();
    assert!(report.delivered);

    // Remaining in alarm does not re-alert.
    for _ in 0..5 {
        let tick = h.monitor.tick();
        assert_eq!(tick.state, AggregateState::Alarm);
        assert!(tick.transition.is_none());
        assert!(tick.dispatch.is_none());
    }

    h.pins.set(27, PinLevel::Low);
    let tick = h.monitor.tick();
    assert_eq!(tick.state, AggregateState::Normal);
    assert!(tick.transition.is_some_and(|e| e.is_recovery()));
    assert!(tick.dispatch.is_none());

    assert_eq!(h.transport.call_count(), 1);
    assert_eq!(
        h.transport.calls()[0].url,
        "https://alerts.example.com/api/alarm?accesskey=k3y"
    );
}

/// A host that boots with every line already deviating alerts on the
/// first tick.
#[tokio::test(start_paused = true)]
async fn boot_in_alarm_alerts_on_first_tick() {
    let mut h = harness(two_lines(), ScriptedTransport::always(200));
    h.pins.set(17, PinLevel::High);
    h.pins.set(27, PinLevel::High);

    let tick = h.monitor.tick();
    assert!(tick.transition.is_some_and(|e| e.is_alarm_entry()));
    tick.dispatch.unwrap().await.unwrap();
    assert_eq!(h.transport.call_count(), 1);
}

/// One deviating line and one unreadable line never alarm.
#[tokio::test(start_paused = true)]
async fn unreadable_line_does_not_alarm() {
    let mut h = harness(two_lines(), ScriptedTransport::always(200));
    h.pins.set(17, PinLevel::High);
    h.pins.set_unreadable(27);

    for _ in 0..3 {
        let tick = h.monitor.tick();
        assert_eq!(tick.state, AggregateState::Normal);
        assert!(tick.dispatch.is_none());
    }
    assert_eq!(h.transport.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Test: concurrent dispatches
// ---------------------------------------------------------------------------

/// Two alarm entries inside one retry-delay window produce two independent
/// dispatches. The second completes while the first is still waiting to
/// retry.
#[tokio::test(start_paused = true)]
async fn rapid_alarm_entries_dispatch_independently() {
    // First request fails, everything after succeeds.
    let mut h = harness(two_lines(), ScriptedTransport::new([Ok(500)]));

    h.pins.set(17, PinLevel::High);
    h.pins.set(27, PinLevel::High);
    let first = h.monitor.tick().dispatch.expect("first alarm entry");

    h.pins.set(17, PinLevel::Low);
    assert!(h.monitor.tick().dispatch.is_none());

    h.pins.set(17, PinLevel::High);
    let second = h.monitor.tick().dispatch.expect("second alarm entry");

    let second_report = second.await.unwrap();
    assert!(second_report.delivered);
    assert_eq!(second_report.attempts, 1);
    assert!(!first.is_finished(), "first dispatch is still in its retry delay");

    let first_report = first.await.unwrap();
    assert!(first_report.delivered);
    assert_eq!(first_report.attempts, 2);
    assert_eq!(h.transport.call_count(), 3);
}

/// Ticks keep flowing while an alert is stuck retrying.
#[tokio::test(start_paused = true)]
async fn failing_endpoint_does_not_block_ticks() {
    let mut h = harness(two_lines(), ScriptedTransport::always(503));

    h.pins.set(17, PinLevel::High);
    h.pins.set(27, PinLevel::High);
    let dispatch = h.monitor.tick().dispatch.unwrap();

    // Each tick returns immediately even though the dispatch has two
    // 5-second pauses ahead of it.
    let start = tokio::time::Instant::now();
    for _ in 0..100 {
        h.monitor.tick();
    }
    assert_eq!(tokio::time::Instant::now(), start);
    assert!(!dispatch.is_finished());

    let report = dispatch.await.unwrap();
    assert!(!report.delivered);
    assert_eq!(report.attempts, 3);
}

// ---------------------------------------------------------------------------
// Test: run loop
// ---------------------------------------------------------------------------

/// The cadence-driven loop picks up each alarm entry on its own.
#[tokio::test(start_paused = true)]
async fn run_loop_alerts_on_each_entry() {
    let h = harness(two_lines(), ScriptedTransport::always(200));
    let pins = h.pins.clone();
    let transport = h.transport.clone();
    let task = tokio::spawn(h.monitor.run());

    tokio::time::sleep(POLL * 5).await;
    assert_eq!(transport.call_count(), 0);

    pins.set(17, PinLevel::High);
    pins.set(27, PinLevel::High);
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(transport.call_count(), 1);

    pins.set(17, PinLevel::Low);
    tokio::time::sleep(POLL * 5).await;
    pins.set(17, PinLevel::High);
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(transport.call_count(), 2);

    task.abort();
}
