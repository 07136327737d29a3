//! Explicit "start next cycle" workflow on top of the time-derived clock.

use super::common::CYCLE_LENGTH;
use cycle_clock::{CycleClock, CycleTicker};
use cycle_common::{ClockError, CycleIndex, ManualTimeSource, TimeSource, Timestamp};

const NEW_CYCLE_LENGTH: u64 = 10;

fn setup() -> (CycleTicker, ManualTimeSource) {
    let time = ManualTimeSource::new(Timestamp(0));
    let clock = CycleClock::new(CYCLE_LENGTH, time.now()).unwrap();
    (CycleTicker::new(clock), time)
}

#[test]
fn test_initial_state() {
    let (ticker, time) = setup();
    assert_eq!(ticker.clock().cycle_length(), CYCLE_LENGTH);
    assert_eq!(ticker.acknowledged(), CycleIndex(0));
    assert_eq!(ticker.clock().current_cycle_start(time.now()).unwrap(), Timestamp(0));
    assert_eq!(
        ticker.clock().current_cycle_end(time.now()).unwrap(),
        Timestamp(CYCLE_LENGTH)
    );
}

#[test]
fn test_start_next_after_each_cycle() {
    let (mut ticker, time) = setup();
    for expected in 1..=3 {
        time.advance(CYCLE_LENGTH);
        assert_eq!(
            ticker.start_next_cycle(time.now()).unwrap(),
            CycleIndex(expected)
        );
    }
    assert_eq!(
        ticker.clock().current_cycle_end(time.now()).unwrap(),
        Timestamp(CYCLE_LENGTH * 4)
    );
}

#[test]
fn test_start_next_before_end_reverts() {
    let (mut ticker, time) = setup();
    time.advance(CYCLE_LENGTH - 3);
    assert_eq!(ticker.clock().current_cycle(time.now()).unwrap(), CycleIndex(0));
    assert!(matches!(
        ticker.start_next_cycle(time.now()),
        Err(ClockError::CycleNotEnded { .. })
    ));
}

#[test]
fn test_pending_length_applies_after_rollover() {
    let (mut ticker, time) = setup();
    ticker
        .clock_mut()
        .request_length_change(NEW_CYCLE_LENGTH, time.now())
        .unwrap();
    assert_eq!(
        ticker.clock().pending_length(time.now()),
        Some(NEW_CYCLE_LENGTH)
    );

    time.advance(CYCLE_LENGTH - 3);
    assert!(ticker.start_next_cycle(time.now()).is_err());

    time.set(Timestamp(CYCLE_LENGTH));
    assert_eq!(ticker.start_next_cycle(time.now()).unwrap(), CycleIndex(1));
    assert_eq!(ticker.clock().cycle_length(), NEW_CYCLE_LENGTH);
    assert_eq!(ticker.clock().pending_length(time.now()), None);

    time.advance(NEW_CYCLE_LENGTH);
    assert_eq!(ticker.start_next_cycle(time.now()).unwrap(), CycleIndex(2));
}
