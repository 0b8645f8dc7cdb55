//! Clock and sleep providers.
//!
//! Code that needs "now" or has to wait for a deadline takes a [`Clock`]
//! instead of calling the platform directly, so tests can drive time with a
//! [`ManualClock`].

use std::{
  convert::TryFrom,
  sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError},
  thread,
  time::{Duration as StdDuration, Instant, SystemTime},
};

#[allow(unused_imports)]
use log::{debug, trace, warn};

use crate::structure::time_value::TimeValue;

/// Upper bound for one `thread::sleep` call. Longer waits, including waits
/// for `INFINITE_FUTURE`, are done in several steps.
const MAX_SLEEP_STEP: StdDuration = StdDuration::from_secs(24 * 60 * 60);

pub trait Clock: Send + Sync {
  /// Current instant, relative to the epoch of this clock.
  fn now(&self) -> TimeValue;

  /// Blocks the calling thread until `now()` has reached `deadline`.
  ///
  /// Returns at once if the deadline has already passed. Waiting for
  /// `INFINITE_FUTURE` never returns. There is no way to interrupt the wait.
  fn sleep_until(&self, deadline: TimeValue);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
  fn now(&self) -> TimeValue {
    (**self).now()
  }
  fn sleep_until(&self, deadline: TimeValue) {
    (**self).sleep_until(deadline)
  }
}

impl<C: Clock + ?Sized> Clock for &C {
  fn now(&self) -> TimeValue {
    (**self).now()
  }
  fn sleep_until(&self, deadline: TimeValue) {
    (**self).sleep_until(deadline)
  }
}

/// Which platform clock a [`SystemClock`] reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClockType {
  /// Wall clock, seconds since the Unix epoch. May jump.
  #[default]
  Realtime,
  /// Never goes backwards. The epoch is the first monotonic reading taken
  /// by this process.
  Monotonic,
}

fn monotonic_epoch() -> Instant {
  static EPOCH: OnceLock<Instant> = OnceLock::new();
  *EPOCH.get_or_init(Instant::now)
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock {
  clock_type: ClockType,
}

impl SystemClock {
  pub fn new(clock_type: ClockType) -> SystemClock {
    SystemClock { clock_type }
  }

  pub fn monotonic() -> SystemClock {
    SystemClock::new(ClockType::Monotonic)
  }

  pub fn clock_type(&self) -> ClockType {
    self.clock_type
  }
}

impl Clock for SystemClock {
  fn now(&self) -> TimeValue {
    match self.clock_type {
      ClockType::Realtime => {
        let now = TimeValue::from(SystemTime::now());
        if now < TimeValue::ZERO {
          warn!("System clock reads {} which is before the Unix epoch", now);
        }
        now
      }
      ClockType::Monotonic => TimeValue::from(monotonic_epoch().elapsed()),
    }
  }

  fn sleep_until(&self, deadline: TimeValue) {
    loop {
      let now = self.now();
      if deadline <= now {
        return;
      }
      // Err only for an infinite or out-of-range remainder
      let step = StdDuration::try_from(deadline - now)
        .map(|remaining| remaining.min(MAX_SLEEP_STEP))
        .unwrap_or(MAX_SLEEP_STEP);
      trace!("sleep_until {}: now {}, sleeping {:?}", deadline, now, step);
      thread::sleep(step);
    }
  }
}

#[derive(Debug)]
struct ManualClockInner {
  now: Mutex<TimeValue>,
  moved: Condvar,
}

/// Clock that only moves when told to.
///
/// Clones share the same time. `sleep_until` blocks until some other thread
/// sets or advances the clock to the deadline.
#[derive(Debug, Clone)]
pub struct ManualClock {
  inner: Arc<ManualClockInner>,
}

impl ManualClock {
  pub fn new(start: TimeValue) -> ManualClock {
    ManualClock {
      inner: Arc::new(ManualClockInner {
        now: Mutex::new(start),
        moved: Condvar::new(),
      }),
    }
  }

  // The guarded TimeValue is always valid, so a poisoned lock is still usable.
  fn lock(&self) -> MutexGuard<'_, TimeValue> {
    self.inner.now.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Moves the clock to `t`, also backwards, and wakes sleepers.
  pub fn set(&self, t: TimeValue) {
    *self.lock() = t;
    self.inner.moved.notify_all();
  }

  /// Moves the clock by `by` (saturating) and wakes sleepers.
  pub fn advance(&self, by: TimeValue) -> TimeValue {
    let now = {
      let mut now = self.lock();
      *now += by;
      *now
    };
    debug!("ManualClock advanced by {} to {}", by, now);
    self.inner.moved.notify_all();
    now
  }
}

impl Default for ManualClock {
  fn default() -> ManualClock {
    ManualClock::new(TimeValue::ZERO)
  }
}

impl Clock for ManualClock {
  fn now(&self) -> TimeValue {
    *self.lock()
  }

  fn sleep_until(&self, deadline: TimeValue) {
    let mut now = self.lock();
    while *now < deadline {
      now = self
        .inner
        .moved
        .wait(now)
        .unwrap_or_else(PoisonError::into_inner);
    }
  }
}

/// Current time from the default (realtime) system clock.
pub fn now() -> TimeValue {
  SystemClock::default().now()
}

/// Sleeps on the default (realtime) system clock.
pub fn sleep_until(deadline: TimeValue) {
  SystemClock::default().sleep_until(deadline)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::mpsc;

  #[test]
  fn realtime_is_after_epoch() {
    let now = SystemClock::default().now();
    assert!(now > TimeValue::from_seconds(1_500_000_000));
    assert!(now.is_finite());
  }

  #[test]
  fn default_clock_is_realtime() {
    assert_eq!(ClockType::default(), ClockType::Realtime);
    assert_eq!(SystemClock::default().clock_type(), ClockType::Realtime);
  }

  #[test]
  fn monotonic_does_not_go_backwards() {
    let clock = SystemClock::monotonic();
    assert_eq!(clock.clock_type(), ClockType::Monotonic);
    let a = clock.now();
    let b = clock.now();
    assert!(a >= TimeValue::ZERO);
    assert!(b >= a);
  }

  #[test]
  fn system_sleep_until_past_returns() {
    let clock = SystemClock::monotonic();
    clock.sleep_until(TimeValue::INFINITE_PAST);
    clock.sleep_until(clock.now() - TimeValue::from_seconds(1));
  }

  #[test]
  fn system_sleep_until_waits_for_deadline() {
    let clock = SystemClock::monotonic();
    let deadline = clock.now() + TimeValue::from_millis(20);
    clock.sleep_until(deadline);
    assert!(clock.now() >= deadline);
  }

  #[test]
  fn manual_clock_set_and_advance() {
    let clock = ManualClock::new(TimeValue::from_seconds(10));
    assert_eq!(clock.now(), TimeValue::from_seconds(10));
    assert_eq!(
      clock.advance(TimeValue::from_millis(250)),
      TimeValue::new(10, 250_000_000)
    );
    clock.set(TimeValue::from_seconds(3));
    assert_eq!(clock.clone().now(), TimeValue::from_seconds(3));
    clock.advance(TimeValue::INFINITE_FUTURE);
    assert_eq!(clock.now(), TimeValue::INFINITE_FUTURE);
  }

  #[test]
  fn manual_clock_sleep_wakes_on_advance() {
    let clock = ManualClock::default();
    let sleeper = clock.clone();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
      sleeper.sleep_until(TimeValue::from_seconds(5));
      tx.send(sleeper.now()).unwrap();
    });

    clock.advance(TimeValue::from_seconds(2));
    assert!(rx.recv_timeout(StdDuration::from_millis(50)).is_err());

    clock.advance(TimeValue::from_seconds(3));
    let woke_at = rx.recv_timeout(StdDuration::from_secs(5)).unwrap();
    assert!(woke_at >= TimeValue::from_seconds(5));
    handle.join().unwrap();
  }

  #[test]
  fn manual_clock_sleep_on_infinite_future() {
    let clock = ManualClock::default();
    let sleeper = clock.clone();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
      sleeper.sleep_until(TimeValue::INFINITE_FUTURE);
      tx.send(sleeper.now()).unwrap();
    });

    // largest finite value is still before +inf
    clock.set(TimeValue::new(i64::MAX, 999_999_999));
    assert!(rx.recv_timeout(StdDuration::from_millis(50)).is_err());

    clock.set(TimeValue::INFINITE_FUTURE);
    let woke_at = rx.recv_timeout(StdDuration::from_secs(5)).unwrap();
    assert_eq!(woke_at, TimeValue::INFINITE_FUTURE);
    handle.join().unwrap();
  }

  #[test]
  fn manual_clock_survives_poisoned_lock() {
    let clock = ManualClock::new(TimeValue::from_seconds(1));
    let holder = clock.clone();
    let panicked = thread::spawn(move || {
      let _guard = holder.inner.now.lock().unwrap();
      panic!("panic while holding the clock lock");
    })
    .join();
    assert!(panicked.is_err());
    assert!(clock.inner.now.is_poisoned());

    let other = clock.clone();
    assert_eq!(other.now(), TimeValue::from_seconds(1));
    assert_eq!(
      other.advance(TimeValue::from_seconds(1)),
      TimeValue::from_seconds(2)
    );
    other.sleep_until(TimeValue::from_seconds(2));

    let sleeper = clock.clone();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
      sleeper.sleep_until(TimeValue::from_seconds(3));
      tx.send(sleeper.now()).unwrap();
    });
    assert!(rx.recv_timeout(StdDuration::from_millis(50)).is_err());
    other.advance(TimeValue::from_seconds(1));
    let woke_at = rx.recv_timeout(StdDuration::from_secs(5)).unwrap();
    assert_eq!(woke_at, TimeValue::from_seconds(3));
    handle.join().unwrap();
  }

  #[test]
  fn clock_trait_objects() {
    let manual = ManualClock::new(TimeValue::from_hours(1));
    let shared: Arc<dyn Clock> = Arc::new(manual.clone());
    assert_eq!(shared.now(), TimeValue::from_seconds(3_600));
    shared.sleep_until(TimeValue::from_minutes(59));

    fn read<C: Clock>(clock: C) -> TimeValue {
      clock.now()
    }
    assert_eq!(read(&manual), TimeValue::from_hours(1));
    assert_eq!(read(shared), TimeValue::from_hours(1));
  }

  #[test]
  fn free_functions_use_realtime() {
    let before = now();
    sleep_until(before);
    assert!(now() >= before);
  }
}
