use std::{
  convert::{From, TryFrom},
  time::{Duration as StdDuration, SystemTime, UNIX_EPOCH},
};

use crate::{
  constant::NS_PER_US,
  result::{Error, Result},
};
use super::time_value::{Repr, TimeValue};

/// The host's own interval type, used at the system call boundary.
#[cfg(unix)]
pub type NativeInterval = libc::timeval;

/// Converts to the host interval, dropping sub-microsecond precision.
///
/// Nanoseconds are floored, so the microsecond field stays in
/// `0..1_000_000` for negative values too. The infinities become the
/// `time_t` extremes. Finite seconds that do not fit `time_t` clamp to those
/// same extremes and therefore read back as infinities.
#[cfg(unix)]
pub fn to_native_interval(t: TimeValue) -> NativeInterval {
  let (tv_sec, tv_usec) = match t.0 {
    Repr::InfiniteFuture => (libc::time_t::MAX, 0),
    Repr::InfinitePast => (libc::time_t::MIN, 0),
    Repr::Finite { seconds, nanos } => {
      #[allow(clippy::useless_conversion)]
      let tv_sec = libc::time_t::try_from(seconds).unwrap_or(if seconds < 0 {
        libc::time_t::MIN
      } else {
        libc::time_t::MAX
      });
      (tv_sec, (nanos / NS_PER_US as u32) as libc::suseconds_t)
    }
  };
  libc::timeval { tv_sec, tv_usec }
}

/// Converts from the host interval. Microseconds are zero-extended, and an
/// out-of-range microsecond field is carried into the seconds.
#[cfg(unix)]
pub fn from_native_interval(tv: NativeInterval) -> TimeValue {
  if tv.tv_sec == libc::time_t::MAX {
    TimeValue::INFINITE_FUTURE
  } else if tv.tv_sec == libc::time_t::MIN {
    TimeValue::INFINITE_PAST
  } else {
    #[allow(clippy::useless_conversion)]
    let seconds = i128::from(tv.tv_sec);
    #[allow(clippy::useless_conversion)]
    let micros = i128::from(tv.tv_usec);
    TimeValue::saturating_from_parts(seconds, micros * i128::from(NS_PER_US))
  }
}

#[cfg(unix)]
impl From<TimeValue> for libc::timeval {
  fn from(t: TimeValue) -> Self {
    to_native_interval(t)
  }
}

#[cfg(unix)]
impl From<libc::timeval> for TimeValue {
  fn from(tv: libc::timeval) -> Self {
    from_native_interval(tv)
  }
}

impl From<StdDuration> for TimeValue {
  fn from(duration: StdDuration) -> Self {
    TimeValue::saturating_from_parts(
      i128::from(duration.as_secs()),
      i128::from(duration.subsec_nanos()),
    )
  }
}

impl TryFrom<TimeValue> for StdDuration {
  type Error = Error;

  fn try_from(t: TimeValue) -> Result<StdDuration> {
    match t.0 {
      Repr::Finite { seconds, nanos } if seconds >= 0 => {
        Ok(StdDuration::new(seconds as u64, nanos))
      }
      Repr::Finite { .. } => log_and_err_negative!("{} into std::time::Duration", t),
      _ => log_and_err_not_representable!("{} into std::time::Duration", t),
    }
  }
}

/// Seconds since the Unix epoch, negative before it.
impl From<SystemTime> for TimeValue {
  fn from(time: SystemTime) -> Self {
    match time.duration_since(UNIX_EPOCH) {
      Ok(since) => TimeValue::from(since),
      Err(e) => -TimeValue::from(e.duration()),
    }
  }
}

impl TryFrom<TimeValue> for SystemTime {
  type Error = Error;

  fn try_from(t: TimeValue) -> Result<SystemTime> {
    let shifted = match t.0 {
      Repr::Finite { seconds, .. } if seconds >= 0 => {
        StdDuration::try_from(t).ok().and_then(|d| UNIX_EPOCH.checked_add(d))
      }
      Repr::Finite { .. } => StdDuration::try_from(-t)
        .ok()
        .and_then(|d| UNIX_EPOCH.checked_sub(d)),
      _ => None,
    };
    match shifted {
      Some(time) => Ok(time),
      None => log_and_err_not_representable!("{} into std::time::SystemTime", t),
    }
  }
}

impl From<chrono::Duration> for TimeValue {
  fn from(duration: chrono::Duration) -> Self {
    // num_seconds truncates toward zero and subsec_nanos carries the same sign
    TimeValue::saturating_from_parts(
      i128::from(duration.num_seconds()),
      i128::from(duration.subsec_nanos()),
    )
  }
}

impl TryFrom<TimeValue> for chrono::Duration {
  type Error = Error;

  fn try_from(t: TimeValue) -> Result<chrono::Duration> {
    match t
      .as_parts()
      .and_then(|(seconds, nanos)| chrono::Duration::new(seconds, nanos))
    {
      Some(duration) => Ok(duration),
      None => log_and_err_not_representable!("{} into chrono::Duration", t),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  macro_rules! conversion_test {
    ($({
      $name:ident,
      time = $time:expr,
      timeval = ($sec:expr, $usec:expr),
      back = $back:expr,
    }),+) => {
      $(#[cfg(unix)]
        mod $name {
          use super::*;

          #[test]
          fn time_value_into_timeval() {
            let tv = to_native_interval($time);
            assert_eq!(tv.tv_sec, $sec);
            assert_eq!(tv.tv_usec, $usec);
          }

          #[test]
          fn timeval_into_time_value() {
            let tv: libc::timeval = $time.into();
            assert_eq!(from_native_interval(tv), $back);
            assert_eq!(TimeValue::from(tv), $back);
          }
      })+
    }
  }

  conversion_test!(
  {
      convert_zero,
      time = TimeValue::ZERO,
      timeval = (0, 0),
      back = TimeValue::ZERO,
  },
  {
      convert_truncates_sub_micro,
      time = TimeValue::new(12, 345_678_901),
      timeval = (12, 345_678),
      back = TimeValue::new(12, 345_678_000),
  },
  {
      convert_negative_floors,
      time = TimeValue::from_nanos(-1),
      timeval = (-1, 999_999),
      back = TimeValue::from_micros(-1),
  },
  {
      convert_infinite_future,
      time = TimeValue::INFINITE_FUTURE,
      timeval = (libc::time_t::MAX, 0),
      back = TimeValue::INFINITE_FUTURE,
  },
  {
      convert_infinite_past,
      time = TimeValue::INFINITE_PAST,
      timeval = (libc::time_t::MIN, 0),
      back = TimeValue::INFINITE_PAST,
  });

  #[cfg(unix)]
  #[test]
  fn unnormalized_timeval_is_carried() {
    let tv = libc::timeval {
      tv_sec: 1,
      tv_usec: 2_500_000,
    };
    assert_eq!(from_native_interval(tv), TimeValue::new(3, 500_000_000));
    let tv = libc::timeval {
      tv_sec: 0,
      tv_usec: -1,
    };
    assert_eq!(from_native_interval(tv), TimeValue::from_micros(-1));
  }

  #[test]
  fn std_duration_round_trip() {
    let d = StdDuration::new(1_519_152_760, 328_210_046);
    let t = TimeValue::from(d);
    assert_eq!(t, TimeValue::new(1_519_152_760, 328_210_046));
    assert_eq!(StdDuration::try_from(t), Ok(d));
  }

  #[test]
  fn std_duration_rejects_negative_and_infinite() {
    assert!(matches!(
      StdDuration::try_from(TimeValue::from_nanos(-1)),
      Err(Error::Negative { .. })
    ));
    assert!(matches!(
      StdDuration::try_from(TimeValue::INFINITE_FUTURE),
      Err(Error::NotRepresentable { .. })
    ));
  }

  #[test]
  fn huge_std_duration_saturates() {
    assert_eq!(
      TimeValue::from(StdDuration::new(u64::MAX, 0)),
      TimeValue::INFINITE_FUTURE
    );
  }

  #[test]
  fn system_time_relative_to_epoch() {
    let after = UNIX_EPOCH + StdDuration::new(10, 5);
    assert_eq!(TimeValue::from(after), TimeValue::new(10, 5));
    assert_eq!(SystemTime::try_from(TimeValue::new(10, 5)), Ok(after));

    let before = UNIX_EPOCH - StdDuration::from_millis(1_500);
    assert_eq!(TimeValue::from(before), TimeValue::from_millis(-1_500));
    assert_eq!(SystemTime::try_from(TimeValue::from_millis(-1_500)), Ok(before));

    assert!(SystemTime::try_from(TimeValue::INFINITE_PAST).is_err());
  }

  #[test]
  fn chrono_duration_conversions() {
    let d = chrono::Duration::milliseconds(-1_500);
    assert_eq!(TimeValue::from(d), TimeValue::from_millis(-1_500));
    assert_eq!(chrono::Duration::try_from(TimeValue::from_millis(-1_500)), Ok(d));
    assert_eq!(
      TimeValue::from(chrono::Duration::nanoseconds(1_000_000_007)),
      TimeValue::new(1, 7)
    );
    assert!(chrono::Duration::try_from(TimeValue::INFINITE_FUTURE).is_err());
    assert!(chrono::Duration::try_from(TimeValue::from_seconds(i64::MAX - 1)).is_err());
  }
}
