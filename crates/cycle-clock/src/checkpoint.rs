//! Verbatim persistence of a [`CycleClock`].
//!
//! A checkpoint is the clock's complete state: the init time plus its
//! segment history. Restoring re-validates every invariant, so a
//! hand-edited or truncated file cannot produce a clock that answers
//! queries inconsistently.

use crate::clock::{CycleClock, Segment};
use cycle_common::error::{ClockError, ClockResult};
use cycle_common::time::{CycleIndex, Timestamp};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable clock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version.
    pub version: u32,
    /// Start of cycle 0.
    pub init_time: Timestamp,
    /// Segment history, oldest first; the last entry is the pivot.
    pub segments: Vec<Segment>,
}

impl Checkpoint {
    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Checkpoint`] if encoding fails.
    pub fn to_json(&self) -> ClockResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ClockError::Checkpoint(e.to_string()))
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Checkpoint`] if the text is not a checkpoint.
    pub fn from_json(json: &str) -> ClockResult<Self> {
        serde_json::from_str(json).map_err(|e| ClockError::Checkpoint(e.to_string()))
    }

    /// Write to `path`, replacing any existing file.
    ///
    /// The JSON is written to a uniquely named temporary file in the same
    /// directory, synced, and renamed into place, so readers never observe a
    /// partial checkpoint and concurrent writers never share a temp file.
    /// Serializing read-modify-write cycles is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Checkpoint`] on encoding or I/O failure.
    pub fn save(&self, path: &Path) -> ClockResult<()> {
        let json = self.to_json()?;
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| io_error("create temp file in", dir, &e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| io_error("write", tmp.path(), &e))?;
        tmp.persist(path).map_err(|e| io_error("rename into", path, &e.error))?;

        debug!(path = %path.display(), segments = self.segments.len(), "Checkpoint saved");
        Ok(())
    }

    /// Read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Checkpoint`] on I/O or decoding failure.
    pub fn load(path: &Path) -> ClockResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| io_error("read", path, &e))?;
        Self::from_json(&json)
    }

    /// Check every invariant a clock relies on.
    ///
    /// A segment may start many cycles after the one before it: a change
    /// pivots at the end of the cycle running when it was requested (for
    /// example `[0@0 len 100, 5@500 len 10]` after a request at t=450).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidCheckpoint`] describing the first violation.
    pub fn validate(&self) -> ClockResult<()> {
        if self.version != CHECKPOINT_VERSION {
            return Err(invalid(format!(
                "unsupported version {} (expected {CHECKPOINT_VERSION})",
                self.version
            )));
        }

        let Some(first) = self.segments.first() else {
            return Err(invalid("no segments".to_string()));
        };
        if first.start_index != CycleIndex::FIRST || first.start_time != self.init_time {
            return Err(invalid(format!(
                "first segment starts at cycle {} time {}, expected cycle 0 time {}",
                first.start_index, first.start_time, self.init_time
            )));
        }

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.length == 0 {
                return Err(invalid(format!("segment {i} has zero length")));
            }
        }

        for (i, pair) in self.segments.windows(2).enumerate() {
            let (prev, next) = (pair[0], pair[1]);
            let cycles = next
                .start_index
                .get()
                .checked_sub(prev.start_index.get())
                .filter(|&cycles| cycles > 0)
                .ok_or_else(|| {
                    invalid(format!(
                        "segment {} does not start after segment {i}",
                        i + 1
                    ))
                })?;

            let expected = cycles
                .checked_mul(prev.length)
                .and_then(|span| prev.start_time.checked_add(span));
            if expected != Some(next.start_time) {
                return Err(invalid(format!(
                    "segment {} starts at {} which is not a cycle boundary of segment {i}",
                    i + 1,
                    next.start_time
                )));
            }
        }

        Ok(())
    }
}

impl CycleClock {
    /// Capture the complete state.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            init_time: self.init_time,
            segments: self.segments.clone(),
        }
    }

    /// Rebuild a clock from a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidCheckpoint`] if the checkpoint violates
    /// a clock invariant.
    pub fn restore(checkpoint: Checkpoint) -> ClockResult<Self> {
        checkpoint.validate()?;

        let clock = Self {
            init_time: checkpoint.init_time,
            segments: checkpoint.segments,
        };
        info!(
            init_time = %clock.init_time,
            cycle_length = clock.cycle_length(),
            pivot_cycle = %clock.pivot_cycle_index(),
            "Cycle clock restored"
        );
        Ok(clock)
    }
}

fn invalid(reason: String) -> ClockError {
    ClockError::InvalidCheckpoint(reason)
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> ClockError {
    ClockError::Checkpoint(format!("failed to {action} {}: {err}", path.display()))
}
