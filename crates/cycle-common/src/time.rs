//! Timestamps, cycle indices, and the time-source abstraction.
//!
//! All time values are whole, unsigned time units. The host binary uses
//! seconds since the Unix epoch; tests drive a [`ManualTimeSource`] to hit
//! cycle boundaries exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// A point in time, in whole time units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Raw value in time units.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Add `units`, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, units: u64) -> Option<Self> {
        self.0.checked_add(units).map(Self)
    }

    /// Time units elapsed since `earlier`, or `None` if `earlier` is later than `self`.
    #[must_use]
    pub fn checked_since(self, earlier: Timestamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

/// Zero-based index of a cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CycleIndex(pub u64);

impl CycleIndex {
    /// The first cycle.
    pub const FIRST: Self = Self(0);

    /// Raw index value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The following cycle, or `None` on overflow.
    #[must_use]
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Advance by `cycles`, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, cycles: u64) -> Option<Self> {
        self.0.checked_add(cycles).map(Self)
    }
}

impl fmt::Display for CycleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CycleIndex {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

/// Source of the current time.
///
/// Implementations must be monotonically non-decreasing for the cycle
/// arithmetic to be meaningful.
pub trait TimeSource: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Timestamp(elapsed.as_secs()),
            Err(e) => {
                warn!(error = %e, "System clock is before the Unix epoch");
                Timestamp::ZERO
            }
        }
    }
}

/// Settable time source for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    /// Create a source reading `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start.0),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now.0, Ordering::SeqCst);
    }

    /// Move forward by `units` (saturating at `u64::MAX`).
    pub fn advance(&self, units: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(units))
            });
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}
