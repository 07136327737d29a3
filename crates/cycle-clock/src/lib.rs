//! Cycle clock: which cycle are we in, and when does it end?
//!
//! The cycle index is derived from wall-clock time on every query. There is
//! no stored counter to advance, so any number of elapsed cycles is handled
//! without a keeper process.
//!
//! - [`clock`]: the [`CycleClock`] core and its segment history
//! - [`ticker`]: optional explicit-advance wrapper
//! - [`shared`]: thread-safe handle with an authorization seam
//! - [`checkpoint`]: verbatim state persistence
//!
//! # Example
//!
//! ```
//! use cycle_clock::CycleClock;
//! use cycle_common::{CycleIndex, Timestamp};
//!
//! let mut clock = CycleClock::new(100, Timestamp(0)).unwrap();
//! assert_eq!(clock.current_cycle(Timestamp(450)).unwrap(), CycleIndex(4));
//!
//! // Takes effect from the next cycle; cycle 4 still ends at 500.
//! clock.request_length_change(10, Timestamp(450)).unwrap();
//! assert_eq!(clock.cycle_length(), 10);
//! assert_eq!(clock.current_cycle_end(Timestamp(450)).unwrap(), Timestamp(500));
//! assert_eq!(clock.current_cycle(Timestamp(510)).unwrap(), CycleIndex(6));
//! ```

pub mod checkpoint;
pub mod clock;
pub mod shared;
pub mod ticker;

pub use checkpoint::Checkpoint;
pub use clock::{ClockStatus, CycleBounds, CycleClock, Segment};
pub use shared::{LengthChangeAuthorizer, SharedCycleClock};
pub use ticker::CycleTicker;
