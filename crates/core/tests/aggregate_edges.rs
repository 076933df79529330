//! Integration tests for the aggregate verdict feeding the edge detector.
//!
//! Drives [`MockPins`] through tick sequences and checks which transitions
//! come out, without any async runtime.

use pinwatch_core::{
    evaluate, AggregateState, EdgeDetector, Line, MockPins, PinLevel, PinReading, PinSource,
    TransitionEvent,
};

fn read_all(pins: &MockPins, lines: &[Line]) -> Vec<PinReading> {
    lines
        .iter()
        .map(|l| PinReading::from(pins.read_level(l.pin)))
        .collect()
}

fn step(pins: &MockPins, lines: &[Line], detector: &mut EdgeDetector) -> Option<TransitionEvent> {
    let readings = read_all(pins, lines);
    detector.observe(evaluate(lines, &readings))
}

// ---------------------------------------------------------------------------
// Test: two-line scenario
// ---------------------------------------------------------------------------

/// Lines 17 and 27 both default low. Both high → one alarm entry; one
/// reverting → recovery, and no further alarm entry.
#[test]
fn both_lines_high_then_one_reverts() {
    let lines = vec![Line::new(17, PinLevel::Low), Line::new(27, PinLevel::Low)];
    let pins = MockPins::at_defaults(&lines);
    let mut detector = EdgeDetector::new();

    assert_eq!(step(&pins, &lines, &mut detector), None);

    pins.set(17, PinLevel::High);
    assert_eq!(step(&pins, &lines, &mut detector), None, "one line is not enough");

    pins.set(27, PinLevel::High);
    let entry = step(&pins, &lines, &mut detector).expect("alarm entry");
    assert!(entry.is_alarm_entry());

    // Staying in alarm produces nothing further.
    assert_eq!(step(&pins, &lines, &mut detector), None);
    assert_eq!(step(&pins, &lines, &mut detector), None);

    pins.set(27, PinLevel::Low);
    let recovery = step(&pins, &lines, &mut detector).expect("recovery");
    assert!(recovery.is_recovery());
    assert_eq!(recovery.to, AggregateState::Normal);

    assert_eq!(step(&pins, &lines, &mut detector), None);
}

// ---------------------------------------------------------------------------
// Test: unreadable lines
// ---------------------------------------------------------------------------

/// A line that cannot be read never completes the all-lines condition.
#[test]
fn unreadable_line_never_triggers_alarm() {
    let lines = vec![Line::new(17, PinLevel::Low), Line::new(27, PinLevel::Low)];
    let pins = MockPins::at_defaults(&lines);
    let mut detector = EdgeDetector::new();

    pins.set(17, PinLevel::High);
    pins.set_unreadable(27);
    assert_eq!(step(&pins, &lines, &mut detector), None);
    assert_eq!(detector.previous(), AggregateState::Normal);

    pins.set(27, PinLevel::High);
    assert!(step(&pins, &lines, &mut detector).is_some_and(|e| e.is_alarm_entry()));
}

/// Booting with every line already deviating fires on the first tick.
#[test]
fn boot_in_alarm_fires_on_first_tick() {
    let lines = vec![Line::new(4, PinLevel::High)];
    let pins = MockPins::new();
    pins.set(4, PinLevel::Low);

    let mut detector = EdgeDetector::new();
    let first = step(&pins, &lines, &mut detector).expect("first tick fires");
    assert!(first.is_alarm_entry());
}
