use std::{fmt, result};

/// This is a specialized Result, similar to std::io::Result
pub type Result<T> = result::Result<T, Error>;

/// Failures of conversions into types that cannot hold every `TimeValue`.
///
/// The arithmetic itself never fails: it saturates. Only conversions out of
/// this crate into narrower representations return these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// The value is infinite, or finite but outside the range of the target type.
  NotRepresentable { reason: String },
  /// The target type is unsigned and the value is below zero.
  Negative { reason: String },
}

impl Error {
  pub fn not_representable<T>(reason: &str) -> Result<T> {
    Err(Error::NotRepresentable {
      reason: reason.to_string(),
    })
  }

  pub fn negative<T>(reason: &str) -> Result<T> {
    Err(Error::Negative {
      reason: reason.to_string(),
    })
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::NotRepresentable { reason } => write!(f, "time value not representable: {}", reason),
      Error::Negative { reason } => write!(f, "negative time value: {}", reason),
    }
  }
}

impl std::error::Error for Error {}

#[doc(hidden)]
#[macro_export]
macro_rules! log_and_err_not_representable {
  ($($arg:tt)*) => (
      { log::debug!($($arg)*);
        $crate::Error::not_representable(&format!($($arg)*))
      }
    )
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_and_err_negative {
  ($($arg:tt)*) => (
      { log::debug!($($arg)*);
        $crate::Error::negative(&format!($($arg)*))
      }
    )
}
