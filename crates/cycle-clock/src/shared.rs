//! Thread-safe clock handle.
//!
//! Queries take a read lock and may run concurrently. A length change takes
//! the write lock, reads the time source while holding it, and is gated by
//! a host-supplied [`LengthChangeAuthorizer`]. The clock itself has no
//! notion of who is asking.

use crate::checkpoint::Checkpoint;
use crate::clock::{ClockStatus, CycleClock, Segment};
use cycle_common::error::{ClockError, ClockResult};
use cycle_common::time::{CycleIndex, TimeSource, Timestamp};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Decides who may change the cycle length.
pub trait LengthChangeAuthorizer: Send + Sync {
    /// Whether `actor` may request a length change.
    fn authorize(&self, actor: &str) -> bool;
}

impl<F> LengthChangeAuthorizer for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn authorize(&self, actor: &str) -> bool {
        self(actor)
    }
}

/// Shared, clonable handle to one clock.
#[derive(Clone)]
pub struct SharedCycleClock {
    clock: Arc<RwLock<CycleClock>>,
    time: Arc<dyn TimeSource>,
    authorizer: Arc<dyn LengthChangeAuthorizer>,
}

impl std::fmt::Debug for SharedCycleClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCycleClock")
            .field("clock", &*self.read())
            .finish_non_exhaustive()
    }
}

impl SharedCycleClock {
    /// Share `clock`, reading time from `time` and gating changes with `authorizer`.
    #[must_use]
    pub fn new(
        clock: CycleClock,
        time: Arc<dyn TimeSource>,
        authorizer: Arc<dyn LengthChangeAuthorizer>,
    ) -> Self {
        Self {
            clock: Arc::new(RwLock::new(clock)),
            time,
            authorizer,
        }
    }

    /// Current time according to the handle's time source.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.time.now()
    }

    /// Configured cycle length.
    #[must_use]
    pub fn cycle_length(&self) -> u64 {
        self.read().cycle_length()
    }

    /// Index of the running cycle.
    ///
    /// # Errors
    ///
    /// See [`CycleClock::current_cycle`].
    pub fn current_cycle(&self) -> ClockResult<CycleIndex> {
        let clock = self.read();
        clock.current_cycle(self.time.now())
    }

    /// End of the running cycle.
    ///
    /// # Errors
    ///
    /// See [`CycleClock::current_cycle_end`].
    pub fn current_cycle_end(&self) -> ClockResult<Timestamp> {
        let clock = self.read();
        clock.current_cycle_end(self.time.now())
    }

    /// Presentation snapshot for the current time.
    ///
    /// # Errors
    ///
    /// See [`CycleClock::status`].
    pub fn status(&self) -> ClockResult<ClockStatus> {
        let clock = self.read();
        clock.status(self.time.now())
    }

    /// Snapshot of the complete state.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.read().checkpoint()
    }

    /// Change the cycle length on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// [`ClockError::Unauthorized`] if the authorizer denies `actor`, or any
    /// error from [`CycleClock::request_length_change`].
    pub fn request_length_change(&self, actor: &str, new_length: u64) -> ClockResult<Segment> {
        if !self.authorizer.authorize(actor) {
            warn!(actor, cycle_length = new_length, "Length change denied");
            return Err(ClockError::Unauthorized {
                actor: actor.to_string(),
            });
        }

        let mut clock = self.write();
        let now = self.time.now();
        clock.request_length_change(new_length, now).map_err(|e| {
            warn!(actor, cycle_length = new_length, error = %e, "Length change rejected");
            e
        })
    }

    // Every mutation validates before writing, so a poisoned lock still
    // guards a consistent clock.
    fn read(&self) -> RwLockReadGuard<'_, CycleClock> {
        self.clock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CycleClock> {
        self.clock.write().unwrap_or_else(PoisonError::into_inner)
    }
}
