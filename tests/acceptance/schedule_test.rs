//! Reference schedules with a length change in flight.

use super::common::{assert_exact_boundary, Fixture, ADMIN, CYCLE_LENGTH};
use cycle_clock::CycleClock;
use cycle_common::{ClockError, CycleIndex, Timestamp};

#[test]
fn test_reference_schedule() {
    let fixture = Fixture::new(0);
    assert_eq!(fixture.cycle(), 0);

    fixture.advance(99);
    assert_eq!(fixture.cycle(), 0);

    fixture.advance(1);
    assert_eq!(fixture.cycle(), 1);

    fixture.advance(350);
    assert_eq!(fixture.cycle(), 4);
}

#[test]
fn test_reference_cycle_end() {
    let fixture = Fixture::new(0);
    assert_eq!(fixture.clock.current_cycle_end().unwrap(), Timestamp(100));

    fixture.time.set(Timestamp(150));
    assert_eq!(fixture.clock.current_cycle_end().unwrap(), Timestamp(200));
}

#[test]
fn test_length_change_in_flight() {
    let fixture = Fixture::new(0);
    fixture.time.set(Timestamp(100));

    let pivot = fixture.clock.request_length_change(ADMIN, 10).unwrap();

    assert_eq!(fixture.clock.cycle_length(), 10);
    assert_eq!(fixture.cycle(), 1);

    let status = fixture.clock.status().unwrap();
    assert_eq!(status.prior_cycle_length, CYCLE_LENGTH);
    assert_eq!(status.pivot_cycle_index, pivot.start_index);
    assert_eq!(status.pivot_start_time, pivot.start_time);

    fixture.time.set(Timestamp(pivot.start_time.get() + 10));
    assert_eq!(fixture.cycle(), pivot.start_index.get() + 1);
}

#[test]
fn test_rejected_change_leaves_state_unchanged() {
    let fixture = Fixture::new(0);
    fixture.time.set(Timestamp(150));
    let before = fixture.clock.checkpoint();

    assert_eq!(
        fixture.clock.request_length_change(ADMIN, 0),
        Err(ClockError::InvalidLength { length: 0 })
    );
    assert_eq!(fixture.clock.checkpoint(), before);
}

#[test]
fn test_many_elapsed_cycles_without_keeper() {
    let fixture = Fixture::new(1_700_000_000);
    fixture.advance(CYCLE_LENGTH * 1_000_000 + 1);
    assert_eq!(fixture.cycle(), 1_000_000);
}

#[test]
fn test_weekly_schedule_shortened_to_daily() {
    const DAY: u64 = 86_400;
    let init = 1_704_067_200; // 2024-01-01T00:00:00Z
    let mut clock = CycleClock::new(7 * DAY, Timestamp(init)).unwrap();

    // Mid-way through week 3 the schedule switches to daily cycles.
    let request = Timestamp(init + 3 * 7 * DAY + 2 * DAY);
    clock.request_length_change(DAY, request).unwrap();

    assert_eq!(clock.current_cycle(request).unwrap(), CycleIndex(3));
    assert_eq!(
        clock.current_cycle_end(request).unwrap(),
        Timestamp(init + 4 * 7 * DAY)
    );

    let later = Timestamp(init + 4 * 7 * DAY + 3 * DAY + 5);
    assert_eq!(clock.current_cycle(later).unwrap(), CycleIndex(7));

    for at in [init, request.get(), init + 4 * 7 * DAY, later.get()] {
        assert_exact_boundary(&clock, Timestamp(at));
    }
}
