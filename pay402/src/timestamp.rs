//! Unix timestamp utilities for payment expiry and payment times.
//!
//! [`UnixTimestamp`] is used for the `expiry` of a
//! [`PaymentRequirements`](crate::PaymentRequirements) and the `timestamp` of
//! a [`Payment`](crate::Payment).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::{Duration, SystemTime};

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Serialization
///
/// Serialized as a plain JSON integer:
///
/// ```json
/// 1699999999
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl Add<Duration> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self + rhs.as_secs()
    }
}

impl From<SystemTime> for UnixTimestamp {
    fn from(time: SystemTime) -> Self {
        let secs = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(secs)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A clock set before the epoch reads as `0`.
    #[must_use]
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_integer() {
        let ts = UnixTimestamp::from_secs(1_699_999_999);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1699999999");
        let back: UnixTimestamp = serde_json::from_str("1699999999").unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn rejects_string_encoding() {
        assert!(serde_json::from_str::<UnixTimestamp>("\"1699999999\"").is_err());
    }

    #[test]
    fn adds_durations_in_whole_seconds() {
        let ts = UnixTimestamp::from_secs(100);
        assert_eq!((ts + Duration::from_millis(5_900)).as_secs(), 105);
        assert_eq!((UnixTimestamp::from_secs(u64::MAX) + 1).as_secs(), u64::MAX);
    }
}
