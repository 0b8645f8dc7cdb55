//! Unit scale constants for manual scaling between time units.

use static_assertions::const_assert_eq;

pub const MS_PER_SEC: i64 = 1_000;
pub const US_PER_SEC: i64 = 1_000_000;
pub const NS_PER_SEC: i64 = 1_000_000_000;
pub const NS_PER_MS: i64 = 1_000_000;
pub const NS_PER_US: i64 = 1_000;
pub const US_PER_MS: i64 = 1_000;

pub const SEC_PER_MIN: i64 = 60;
pub const SEC_PER_HOUR: i64 = 3_600;

const_assert_eq!(NS_PER_SEC, NS_PER_MS * MS_PER_SEC);
const_assert_eq!(NS_PER_SEC, NS_PER_US * US_PER_SEC);
const_assert_eq!(US_PER_SEC, US_PER_MS * MS_PER_SEC);
const_assert_eq!(SEC_PER_HOUR, SEC_PER_MIN * 60);

// Normalized nanos must fit the u32 field, and so must the sum of two.
const_assert_eq!((2 * NS_PER_SEC) as u32 as i64, 2 * NS_PER_SEC);
