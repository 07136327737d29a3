//! Time-derived cycle index computation.
//!
//! A [`CycleClock`] never stores "the current cycle". Every query maps a
//! timestamp to a cycle by plain arithmetic over the clock's segment
//! history:
//!
//! ```text
//!  init_time                pivot_start_time
//!     |  0  |  1  |  2  |  3  |4|5|6|7|8|9| ...
//!     '---- prior length ----''- cycle_length -'
//! ```
//!
//! A length change recorded at time `t` starts governing at the end of the
//! cycle containing `t`. Boundaries already handed out to other parties do
//! not move, and no separate "commit" step is needed to roll the cycle over.
//!
//! The configured length ([`CycleClock::cycle_length`]) changes the instant
//! a request is accepted; the effective length
//! ([`CycleClock::effective_length`]) for a given time only changes once that
//! time reaches the pivot.

use cycle_common::error::{overflow, ClockError, ClockResult};
use cycle_common::time::{CycleIndex, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A run of consecutive cycles sharing one length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Index of the first cycle in this segment.
    pub start_index: CycleIndex,
    /// Time at which `start_index` begins.
    pub start_time: Timestamp,
    /// Length of every cycle in this segment.
    pub length: u64,
}

impl Segment {
    /// Index of the cycle containing `now`, and the time elapsed within it.
    ///
    /// `now` must not precede `start_time`.
    fn locate(&self, now: Timestamp) -> ClockResult<(CycleIndex, u64)> {
        let elapsed = now
            .checked_since(self.start_time)
            .ok_or(ClockError::QueryBeforeInit {
                now,
                init_time: self.start_time,
            })?;
        let index = self
            .start_index
            .checked_add(elapsed / self.length)
            .ok_or_else(|| overflow("cycle index"))?;
        Ok((index, elapsed % self.length))
    }

    /// Bounds of the cycle containing `now`.
    fn bounds(&self, now: Timestamp) -> ClockResult<CycleBounds> {
        let (index, into_cycle) = self.locate(now)?;
        // into_cycle <= now - start_time, so this cannot underflow.
        let start = Timestamp(now.get() - into_cycle);
        let end = start
            .checked_add(self.length)
            .ok_or_else(|| overflow("cycle end"))?;
        Ok(CycleBounds { index, start, end })
    }
}

/// The cycle containing a query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleBounds {
    /// Cycle index.
    pub index: CycleIndex,
    /// First instant of the cycle.
    pub start: Timestamp,
    /// First instant of the following cycle.
    pub end: Timestamp,
}

/// Snapshot of the clock for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockStatus {
    /// Time the snapshot was taken for.
    pub now: Timestamp,
    /// Start of cycle 0.
    pub init_time: Timestamp,
    /// Configured cycle length.
    pub cycle_length: u64,
    /// Configured length that has not started governing yet.
    pub pending_cycle_length: Option<u64>,
    /// Length governing the current cycle.
    pub effective_cycle_length: u64,
    /// Length that governed every cycle before the pivot.
    pub prior_cycle_length: u64,
    /// First cycle governed by `cycle_length`.
    pub pivot_cycle_index: CycleIndex,
    /// Start of `pivot_cycle_index`.
    pub pivot_start_time: Timestamp,
    /// Current cycle index.
    pub current_cycle: CycleIndex,
    /// Start of the current cycle.
    pub current_cycle_start: Timestamp,
    /// End of the current cycle.
    pub current_cycle_end: Timestamp,
}

/// Wall-clock driven cycle counter with replay-safe length changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleClock {
    pub(crate) init_time: Timestamp,
    /// Ordered by start; never empty. The last entry is the pivot.
    pub(crate) segments: Vec<Segment>,
}

impl CycleClock {
    /// Start a clock whose cycle 0 begins at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidLength`] if `initial_length` is zero.
    pub fn new(initial_length: u64, now: Timestamp) -> ClockResult<Self> {
        if initial_length == 0 {
            return Err(ClockError::InvalidLength {
                length: initial_length,
            });
        }

        info!(init_time = %now, cycle_length = initial_length, "Cycle clock initialized");

        Ok(Self {
            init_time: now,
            segments: vec![Segment {
                start_index: CycleIndex::FIRST,
                start_time: now,
                length: initial_length,
            }],
        })
    }

    /// Start of cycle 0.
    #[must_use]
    pub fn init_time(&self) -> Timestamp {
        self.init_time
    }

    /// Configured cycle length, including a change that is not yet effective.
    #[must_use]
    pub fn cycle_length(&self) -> u64 {
        self.pivot().length
    }

    /// Length that governed all cycles before the pivot.
    #[must_use]
    pub fn prior_cycle_length(&self) -> u64 {
        match self.segments.len() {
            0 | 1 => self.cycle_length(),
            n => self.segments[n - 2].length,
        }
    }

    /// First cycle governed by the configured length.
    #[must_use]
    pub fn pivot_cycle_index(&self) -> CycleIndex {
        self.pivot().start_index
    }

    /// Start of [`CycleClock::pivot_cycle_index`].
    #[must_use]
    pub fn pivot_start_time(&self) -> Timestamp {
        self.pivot().start_time
    }

    /// Full length history, oldest first.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Index of the cycle containing `now`.
    ///
    /// # Errors
    ///
    /// [`ClockError::QueryBeforeInit`] if `now` precedes the init time,
    /// [`ClockError::Overflow`] if the index is not representable.
    pub fn current_cycle(&self, now: Timestamp) -> ClockResult<CycleIndex> {
        Ok(self.segment_at(now)?.locate(now)?.0)
    }

    /// End of the cycle containing `now`, i.e. the start of the next one.
    ///
    /// # Errors
    ///
    /// Same as [`CycleClock::current_cycle`].
    pub fn current_cycle_end(&self, now: Timestamp) -> ClockResult<Timestamp> {
        Ok(self.cycle_bounds(now)?.end)
    }

    /// Start of the cycle containing `now`.
    ///
    /// # Errors
    ///
    /// Same as [`CycleClock::current_cycle`].
    pub fn current_cycle_start(&self, now: Timestamp) -> ClockResult<Timestamp> {
        Ok(self.cycle_bounds(now)?.start)
    }

    /// Index, start and end of the cycle containing `now`.
    ///
    /// # Errors
    ///
    /// Same as [`CycleClock::current_cycle`].
    pub fn cycle_bounds(&self, now: Timestamp) -> ClockResult<CycleBounds> {
        self.segment_at(now)?.bounds(now)
    }

    /// Length actually used for the cycle containing `now`.
    ///
    /// # Errors
    ///
    /// [`ClockError::QueryBeforeInit`] if `now` precedes the init time.
    pub fn effective_length(&self, now: Timestamp) -> ClockResult<u64> {
        Ok(self.segment_at(now)?.length)
    }

    /// The configured length if it has not started governing at `now`.
    #[must_use]
    pub fn pending_length(&self, now: Timestamp) -> Option<u64> {
        let pivot = self.pivot();
        (self.segments.len() > 1 && now < pivot.start_time).then_some(pivot.length)
    }

    /// Record a new cycle length, effective from the next cycle.
    ///
    /// The cycle running at `now` keeps its end time. If an earlier change is
    /// still pending, only its length is replaced and its pivot is kept.
    /// Returns the pivot segment the new length governs from.
    ///
    /// # Errors
    ///
    /// - [`ClockError::InvalidLength`] if `new_length` is zero
    /// - [`ClockError::QueryBeforeInit`] if `now` precedes the init time
    /// - [`ClockError::NonMonotonicTime`] if `now` lies before the segment
    ///   that is running ahead of a pending pivot
    /// - [`ClockError::Overflow`] if the pivot is not representable
    ///
    /// State is unchanged on error.
    pub fn request_length_change(
        &mut self,
        new_length: u64,
        now: Timestamp,
    ) -> ClockResult<Segment> {
        if new_length == 0 {
            return Err(ClockError::InvalidLength { length: new_length });
        }
        self.check_initialized(now)?;

        let pivot = *self.pivot();
        if now < pivot.start_time {
            let running = self.segments[self.segments.len() - 2];
            if now < running.start_time {
                return Err(ClockError::NonMonotonicTime {
                    now,
                    earliest: running.start_time,
                });
            }

            debug!(
                pivot_cycle = %pivot.start_index,
                replaced = pivot.length,
                cycle_length = new_length,
                "Replacing pending cycle length"
            );
            let last = self.segments.len() - 1;
            self.segments[last].length = new_length;
            return Ok(self.segments[last]);
        }

        let running = pivot.bounds(now)?;
        let next = Segment {
            start_index: running
                .index
                .checked_next()
                .ok_or_else(|| overflow("pivot cycle index"))?,
            start_time: running.end,
            length: new_length,
        };
        self.segments.push(next);

        info!(
            prior_cycle_length = pivot.length,
            cycle_length = new_length,
            pivot_cycle = %next.start_index,
            pivot_start = %next.start_time,
            "Cycle length change scheduled"
        );
        Ok(next)
    }

    /// Presentation snapshot at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`CycleClock::current_cycle`].
    pub fn status(&self, now: Timestamp) -> ClockResult<ClockStatus> {
        let segment = self.segment_at(now)?;
        let bounds = segment.bounds(now)?;
        Ok(ClockStatus {
            now,
            init_time: self.init_time,
            cycle_length: self.cycle_length(),
            pending_cycle_length: self.pending_length(now),
            effective_cycle_length: segment.length,
            prior_cycle_length: self.prior_cycle_length(),
            pivot_cycle_index: self.pivot_cycle_index(),
            pivot_start_time: self.pivot_start_time(),
            current_cycle: bounds.index,
            current_cycle_start: bounds.start,
            current_cycle_end: bounds.end,
        })
    }

    fn pivot(&self) -> &Segment {
        // Construction and restore both guarantee at least one segment.
        &self.segments[self.segments.len() - 1]
    }

    fn check_initialized(&self, now: Timestamp) -> ClockResult<()> {
        if now < self.init_time {
            return Err(ClockError::QueryBeforeInit {
                now,
                init_time: self.init_time,
            });
        }
        Ok(())
    }

    fn segment_at(&self, now: Timestamp) -> ClockResult<&Segment> {
        self.check_initialized(now)?;
        let governing = self
            .segments
            .partition_point(|segment| segment.start_time <= now);
        Ok(&self.segments[governing - 1])
    }
}
