//! Saturating arithmetic on [`TimeValue`].
//!
//! Infinities absorb finite operands. Combining the two opposite infinities
//! (`+inf + -inf`, `+inf - +inf`, and so on) has no meaningful answer and
//! always yields `INFINITE_PAST`. Finite results that leave the `i64`
//! seconds range saturate to the infinity in the direction of overflow.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use num_traits::{Saturating, Zero};

use super::time_value::{Repr, TimeValue};

pub fn add(a: TimeValue, b: TimeValue) -> TimeValue {
  match (a.0, b.0) {
    (Repr::InfiniteFuture, Repr::InfinitePast) | (Repr::InfinitePast, Repr::InfiniteFuture) => {
      TimeValue::INFINITE_PAST
    }
    (Repr::InfiniteFuture, _) | (_, Repr::InfiniteFuture) => TimeValue::INFINITE_FUTURE,
    (Repr::InfinitePast, _) | (_, Repr::InfinitePast) => TimeValue::INFINITE_PAST,
    (
      Repr::Finite {
        seconds: sa,
        nanos: na,
      },
      Repr::Finite {
        seconds: sb,
        nanos: nb,
      },
    ) => TimeValue::saturating_from_parts(
      i128::from(sa) + i128::from(sb),
      i128::from(na) + i128::from(nb),
    ),
  }
}

/// `a - b`, behaving as `add(a, negate(b))`.
pub fn sub(a: TimeValue, b: TimeValue) -> TimeValue {
  match (a.0, b.0) {
    // Computed directly: negating i64::MIN seconds on its own would saturate.
    (
      Repr::Finite {
        seconds: sa,
        nanos: na,
      },
      Repr::Finite {
        seconds: sb,
        nanos: nb,
      },
    ) => TimeValue::saturating_from_parts(
      i128::from(sa) - i128::from(sb),
      i128::from(na) - i128::from(nb),
    ),
    _ => add(a, negate(b)),
  }
}

/// Flips the sign of a finite value and swaps the infinities.
pub fn negate(t: TimeValue) -> TimeValue {
  match t.0 {
    Repr::InfiniteFuture => TimeValue::INFINITE_PAST,
    Repr::InfinitePast => TimeValue::INFINITE_FUTURE,
    Repr::Finite { seconds, nanos } => {
      TimeValue::saturating_from_parts(-i128::from(seconds), -i128::from(nanos))
    }
  }
}

/// True if `a` and `b` are equal, or both finite and no further apart than
/// `threshold` in either direction. `threshold` should be non-negative; a
/// negative one only matches equal values.
pub fn similar(a: TimeValue, b: TimeValue, threshold: TimeValue) -> bool {
  if a == b {
    return true;
  }
  if !a.is_finite() || !b.is_finite() {
    return false;
  }
  let diff = sub(a, b);
  negate(threshold) <= diff && diff <= threshold
}

impl Add for TimeValue {
  type Output = TimeValue;
  fn add(self, rhs: TimeValue) -> TimeValue {
    add(self, rhs)
  }
}

impl Sub for TimeValue {
  type Output = TimeValue;
  fn sub(self, rhs: TimeValue) -> TimeValue {
    sub(self, rhs)
  }
}

impl Neg for TimeValue {
  type Output = TimeValue;
  fn neg(self) -> TimeValue {
    negate(self)
  }
}

impl AddAssign for TimeValue {
  fn add_assign(&mut self, rhs: TimeValue) {
    *self = add(*self, rhs);
  }
}

impl SubAssign for TimeValue {
  fn sub_assign(&mut self, rhs: TimeValue) {
    *self = sub(*self, rhs);
  }
}

impl Zero for TimeValue {
  fn zero() -> TimeValue {
    TimeValue::ZERO
  }
  fn is_zero(&self) -> bool {
    *self == TimeValue::ZERO
  }
}

// Plain + and - already saturate.
impl Saturating for TimeValue {
  fn saturating_add(self, v: TimeValue) -> TimeValue {
    add(self, v)
  }
  fn saturating_sub(self, v: TimeValue) -> TimeValue {
    sub(self, v)
  }
}
