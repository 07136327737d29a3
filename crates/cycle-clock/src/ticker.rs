//! Explicit-advance wrapper over a [`CycleClock`].
//!
//! Some callers want a "start next cycle" action that refuses to run before
//! the current cycle has ended. [`CycleTicker`] provides that on top of the
//! time-derived index: it only remembers which cycle was last acknowledged
//! and always asks the clock for the real index.

use crate::clock::CycleClock;
use cycle_common::error::{ClockError, ClockResult};
use cycle_common::time::{CycleIndex, Timestamp};
use tracing::debug;

/// Acknowledges cycles one rollover at a time.
#[derive(Debug, Clone)]
pub struct CycleTicker {
    clock: CycleClock,
    acknowledged: CycleIndex,
}

impl CycleTicker {
    /// Wrap `clock` with cycle 0 acknowledged.
    #[must_use]
    pub fn new(clock: CycleClock) -> Self {
        Self::with_acknowledged(clock, CycleIndex::FIRST)
    }

    /// Wrap `clock`, resuming from a previously acknowledged cycle.
    #[must_use]
    pub fn with_acknowledged(clock: CycleClock, acknowledged: CycleIndex) -> Self {
        Self {
            clock,
            acknowledged,
        }
    }

    /// Last acknowledged cycle.
    #[must_use]
    pub fn acknowledged(&self) -> CycleIndex {
        self.acknowledged
    }

    /// The wrapped clock.
    #[must_use]
    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    /// The wrapped clock, for length changes.
    pub fn clock_mut(&mut self) -> &mut CycleClock {
        &mut self.clock
    }

    /// Unwrap the clock.
    #[must_use]
    pub fn into_inner(self) -> CycleClock {
        self.clock
    }

    /// Acknowledge the cycle running at `now`.
    ///
    /// Several elapsed cycles are acknowledged in one call; the returned
    /// index is whatever the clock reports, not `acknowledged + 1`.
    ///
    /// # Errors
    ///
    /// [`ClockError::CycleNotEnded`] (naming the cycle running at `now`) if
    /// the clock has not moved past the acknowledged cycle, or any error from
    /// [`CycleClock::cycle_bounds`].
    pub fn start_next_cycle(&mut self, now: Timestamp) -> ClockResult<CycleIndex> {
        let bounds = self.clock.cycle_bounds(now)?;
        if bounds.index <= self.acknowledged {
            return Err(ClockError::CycleNotEnded {
                current: bounds.index,
                ends_at: bounds.end,
            });
        }

        debug!(
            from = %self.acknowledged,
            to = %bounds.index,
            "Acknowledged cycle rollover"
        );
        self.acknowledged = bounds.index;
        Ok(bounds.index)
    }
}
