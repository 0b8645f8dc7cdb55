use std::{
  cmp::Ordering,
  convert::{From, TryFrom},
  fmt,
};

use log::debug;
use num_traits::Bounded;
use serde::{Deserialize, Serialize};

use crate::{
  constant::{
    MS_PER_SEC, NS_PER_MS, NS_PER_SEC, NS_PER_US, SEC_PER_HOUR, SEC_PER_MIN, US_PER_SEC,
  },
  result::Error,
};

/// A point in time or a time interval, with nanosecond resolution.
///
/// Finite values are whole seconds (possibly negative) plus a nanosecond
/// remainder that is always in `0..1_000_000_000`. A negative interval
/// borrows from the seconds, so -1ns is `seconds = -1, nanos = 999_999_999`.
///
/// In addition to finite values there are two infinities,
/// [`TimeValue::INFINITE_PAST`] and [`TimeValue::INFINITE_FUTURE`], which
/// order below and above every finite value. They are tagged separately, so
/// a finite value with `seconds == i64::MAX` is still finite.
///
/// Whether a value means an instant (relative to the clock's epoch) or an
/// interval is up to the caller.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Repr", into = "Repr")]
pub struct TimeValue(pub(crate) Repr);

// Variant order is the ordering of time values. Keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) enum Repr {
  InfinitePast,
  Finite { seconds: i64, nanos: u32 },
  InfiniteFuture,
}

impl TimeValue {
  pub const ZERO: TimeValue = TimeValue(Repr::Finite {
    seconds: 0,
    nanos: 0,
  });
  pub const INFINITE_FUTURE: TimeValue = TimeValue(Repr::InfiniteFuture);
  pub const INFINITE_PAST: TimeValue = TimeValue(Repr::InfinitePast);

  /// Builds a finite value from seconds and any number of nanoseconds.
  ///
  /// Nanoseconds outside `0..1_000_000_000`, including negative ones, are
  /// carried into the seconds. A result beyond the `i64` seconds range
  /// saturates to the matching infinity.
  pub fn new(seconds: i64, nanos: i64) -> TimeValue {
    TimeValue::saturating_from_parts(i128::from(seconds), i128::from(nanos))
  }

  pub(crate) const fn finite(seconds: i64, nanos: u32) -> TimeValue {
    TimeValue(Repr::Finite { seconds, nanos })
  }

  /// Normalizes a wide (seconds, nanos) pair, saturating on overflow.
  pub(crate) fn saturating_from_parts(seconds: i128, nanos: i128) -> TimeValue {
    let ns_per_sec = i128::from(NS_PER_SEC);
    let seconds = seconds + nanos.div_euclid(ns_per_sec);
    let nanos = nanos.rem_euclid(ns_per_sec) as u32;
    match i64::try_from(seconds) {
      Ok(seconds) => TimeValue::finite(seconds, nanos),
      Err(_) if seconds > 0 => {
        debug!("Time value overflow at {} seconds, saturating to +inf", seconds);
        TimeValue::INFINITE_FUTURE
      }
      Err(_) => {
        debug!("Time value overflow at {} seconds, saturating to -inf", seconds);
        TimeValue::INFINITE_PAST
      }
    }
  }

  /// Units smaller than a second. `i64::MIN` and `i64::MAX` are the infinities.
  fn from_sub_second_units(x: i64, units_per_sec: i64, nanos_per_unit: i64) -> TimeValue {
    match x {
      i64::MIN => TimeValue::INFINITE_PAST,
      i64::MAX => TimeValue::INFINITE_FUTURE,
      x => TimeValue::finite(
        x.div_euclid(units_per_sec),
        (x.rem_euclid(units_per_sec) * nanos_per_unit) as u32,
      ),
    }
  }

  /// Units of one second or more. `i64::MIN` and `i64::MAX` are the
  /// infinities, other values too large for the seconds field saturate.
  fn from_whole_second_units(x: i64, secs_per_unit: i64) -> TimeValue {
    match x {
      i64::MIN => TimeValue::INFINITE_PAST,
      i64::MAX => TimeValue::INFINITE_FUTURE,
      x => match x.checked_mul(secs_per_unit) {
        Some(seconds) => TimeValue::finite(seconds, 0),
        None => {
          debug!("{} x {}s does not fit a time value, saturating", x, secs_per_unit);
          if x < 0 {
            TimeValue::INFINITE_PAST
          } else {
            TimeValue::INFINITE_FUTURE
          }
        }
      },
    }
  }

  pub fn from_nanos(x: i64) -> TimeValue {
    TimeValue::from_sub_second_units(x, NS_PER_SEC, 1)
  }

  pub fn from_micros(x: i64) -> TimeValue {
    TimeValue::from_sub_second_units(x, US_PER_SEC, NS_PER_US)
  }

  pub fn from_millis(x: i64) -> TimeValue {
    TimeValue::from_sub_second_units(x, MS_PER_SEC, NS_PER_MS)
  }

  pub fn from_seconds(x: i64) -> TimeValue {
    TimeValue::from_whole_second_units(x, 1)
  }

  pub fn from_minutes(x: i64) -> TimeValue {
    TimeValue::from_whole_second_units(x, SEC_PER_MIN)
  }

  pub fn from_hours(x: i64) -> TimeValue {
    TimeValue::from_whole_second_units(x, SEC_PER_HOUR)
  }

  pub fn is_finite(&self) -> bool {
    matches!(self.0, Repr::Finite { .. })
  }

  pub fn is_infinite_future(&self) -> bool {
    self.0 == Repr::InfiniteFuture
  }

  pub fn is_infinite_past(&self) -> bool {
    self.0 == Repr::InfinitePast
  }

  /// Seconds and nanoseconds of a finite value, `None` for the infinities.
  pub fn as_parts(&self) -> Option<(i64, u32)> {
    match self.0 {
      Repr::Finite { seconds, nanos } => Some((seconds, nanos)),
      _ => None,
    }
  }

  /// Whole seconds of a finite value.
  ///
  /// Calling this on an infinity is a caller error. The returned number
  /// (`i64::MAX` or `i64::MIN`) is reserved and means nothing.
  pub fn seconds(&self) -> i64 {
    match self.0 {
      Repr::Finite { seconds, .. } => seconds,
      Repr::InfiniteFuture => i64::MAX,
      Repr::InfinitePast => i64::MIN,
    }
  }

  /// Nanosecond remainder of a finite value, always below one second.
  /// Same precondition as [`TimeValue::seconds`]; infinities yield 0.
  pub fn subsec_nanos(&self) -> u32 {
    match self.0 {
      Repr::Finite { nanos, .. } => nanos,
      _ => 0,
    }
  }

  /// Whole milliseconds, rounded up so that a deadline is never reported
  /// early. Infinities map to `i64::MAX` / `i64::MIN`, and finite values
  /// beyond the `i64` range clamp to those.
  pub fn to_millis(self) -> i64 {
    self.to_units_rounding_up(NS_PER_MS)
  }

  /// Whole microseconds, rounded up like [`TimeValue::to_millis`].
  pub fn to_micros(self) -> i64 {
    self.to_units_rounding_up(NS_PER_US)
  }

  fn to_units_rounding_up(self, nanos_per_unit: i64) -> i64 {
    match self.0 {
      Repr::InfiniteFuture => i64::MAX,
      Repr::InfinitePast => i64::MIN,
      Repr::Finite { seconds, nanos } => {
        let total = i128::from(seconds) * i128::from(NS_PER_SEC) + i128::from(nanos);
        let units = div_ceil_i128(total, i128::from(nanos_per_unit));
        i64::try_from(units).unwrap_or(if units < 0 { i64::MIN } else { i64::MAX })
      }
    }
  }
}

fn div_ceil_i128(a: i128, b: i128) -> i128 {
  let q = a.div_euclid(b);
  if a.rem_euclid(b) == 0 {
    q
  } else {
    q + 1
  }
}

pub const ZERO: TimeValue = TimeValue::ZERO;
pub const INFINITE_FUTURE: TimeValue = TimeValue::INFINITE_FUTURE;
pub const INFINITE_PAST: TimeValue = TimeValue::INFINITE_PAST;

pub fn zero() -> TimeValue {
  TimeValue::ZERO
}

pub fn infinite_future() -> TimeValue {
  TimeValue::INFINITE_FUTURE
}

pub fn infinite_past() -> TimeValue {
  TimeValue::INFINITE_PAST
}

/// Total order: -inf, then finite values by seconds and nanos, then +inf.
pub fn compare(a: TimeValue, b: TimeValue) -> Ordering {
  a.cmp(&b)
}

impl Default for TimeValue {
  fn default() -> TimeValue {
    TimeValue::ZERO
  }
}

impl Bounded for TimeValue {
  fn min_value() -> TimeValue {
    TimeValue::INFINITE_PAST
  }
  fn max_value() -> TimeValue {
    TimeValue::INFINITE_FUTURE
  }
}

impl fmt::Display for TimeValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Repr::InfinitePast => write!(f, "-inf"),
      Repr::InfiniteFuture => write!(f, "+inf"),
      Repr::Finite { seconds, nanos } if seconds < 0 && nanos > 0 => {
        // -1ns is stored as (-1, 999_999_999)
        write!(f, "-{}.{:09}s", -(seconds + 1), NS_PER_SEC as u32 - nanos)
      }
      Repr::Finite { seconds, nanos } => write!(f, "{}.{:09}s", seconds, nanos),
    }
  }
}

impl fmt::Debug for TimeValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TimeValue({})", self)
  }
}

// serde goes through Repr so that decoded values are checked for normalization.
impl TryFrom<Repr> for TimeValue {
  type Error = Error;

  fn try_from(repr: Repr) -> Result<TimeValue, Error> {
    match repr {
      Repr::Finite { nanos, .. } if i64::from(nanos) >= NS_PER_SEC => {
        Err(Error::NotRepresentable {
          reason: format!("nanosecond field {} is not below one second", nanos),
        })
      }
      repr => Ok(TimeValue(repr)),
    }
  }
}

impl From<TimeValue> for Repr {
  fn from(t: TimeValue) -> Repr {
    t.0
  }
}
