//! Portable time values with nanosecond resolution.
//!
//! [`TimeValue`] is a single type for instants and intervals: whole seconds
//! plus a normalized nanosecond remainder, or one of the two infinities
//! [`INFINITE_PAST`] and [`INFINITE_FUTURE`]. Arithmetic saturates at the
//! infinities instead of wrapping, so deadline and backoff code never has to
//! check for overflow.
//!
//! ```
//! use timevalue::{TimeValue, INFINITE_FUTURE};
//!
//! let timeout = TimeValue::from_millis(1_500);
//! assert_eq!(timeout.as_parts(), Some((1, 500_000_000)));
//! assert_eq!(INFINITE_FUTURE + timeout, INFINITE_FUTURE);
//! ```
//!
//! Reading the platform clock and sleeping go through the [`Clock`] trait.
//! [`SystemClock`] is the real one, [`ManualClock`] is driven by hand in
//! tests.

#[macro_use]
mod result;

pub mod clock;
pub mod constant;
mod serialization;
pub mod structure;

pub use clock::{now, sleep_until, Clock, ClockType, ManualClock, SystemClock};
pub use result::{Error, Result};
#[cfg(unix)]
pub use structure::native::{from_native_interval, to_native_interval, NativeInterval};
pub use structure::{
  arithmetic::{add, negate, similar, sub},
  time_value::{
    compare, infinite_future, infinite_past, zero, TimeValue, INFINITE_FUTURE, INFINITE_PAST, ZERO,
  },
};
