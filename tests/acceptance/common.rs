//! Common utilities for acceptance tests.

#![allow(dead_code)] // Not every test module uses every helper

use cycle_clock::{CycleClock, SharedCycleClock};
use cycle_common::{CycleIndex, ManualTimeSource, TimeSource, Timestamp};
use std::sync::Arc;

/// Cycle length used by the reference schedule.
pub const CYCLE_LENGTH: u64 = 100;

/// Actor the test authorizer accepts.
pub const ADMIN: &str = "admin";

/// A shared clock plus the time source driving it.
pub struct Fixture {
    /// Clock handle under test.
    pub clock: SharedCycleClock,
    /// Settable time.
    pub time: Arc<ManualTimeSource>,
}

impl Fixture {
    /// Clock with `CYCLE_LENGTH` cycles starting at `init`.
    pub fn new(init: u64) -> Self {
        let time = Arc::new(ManualTimeSource::new(Timestamp(init)));
        let clock = shared(
            CycleClock::new(CYCLE_LENGTH, Timestamp(init)).unwrap(),
            &time,
        );
        Self { clock, time }
    }

    /// Move time forward.
    pub fn advance(&self, units: u64) {
        self.time.advance(units);
    }

    /// Current cycle index as a plain number.
    pub fn cycle(&self) -> u64 {
        self.clock.current_cycle().unwrap().get()
    }
}

/// Wrap `clock` with an authorizer that only accepts [`ADMIN`].
pub fn shared(clock: CycleClock, time: &Arc<ManualTimeSource>) -> SharedCycleClock {
    SharedCycleClock::new(
        clock,
        Arc::clone(time) as Arc<dyn TimeSource>,
        Arc::new(|actor: &str| actor == ADMIN),
    )
}

/// Assert the boundary of the cycle containing `now` is exact.
pub fn assert_exact_boundary(clock: &CycleClock, now: Timestamp) {
    let index = clock.current_cycle(now).unwrap();
    let end = clock.current_cycle_end(now).unwrap();
    assert_eq!(
        clock.current_cycle(Timestamp(end.get() - 1)).unwrap(),
        index,
        "cycle changed before its end at {end}"
    );
    assert_eq!(
        clock.current_cycle(end).unwrap(),
        CycleIndex(index.get() + 1),
        "cycle did not roll over at {end}"
    );
}
