// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Time

use core::fmt;
use core::ops::{Add, Sub};
use core::str::FromStr;
use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Unix timestamp in seconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Get UNIX timestamp
    pub fn now() -> Self {
        let ts: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(ts)
    }

    /// Construct from seconds since the UNIX epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Zero timestamp
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Check if timestamp is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Get timestamp as [`u64`]
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Get timestamp as [`i64`]
    #[inline]
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl From<u64> for Timestamp {
    fn from(timestamp: u64) -> Self {
        Self(timestamp)
    }
}

impl FromStr for Timestamp {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<u64>()?))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self + rhs.as_secs()
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        self - rhs.as_secs()
    }
}

impl Add<u64> for Timestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub<u64> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_sub(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_arithmetic() {
        let ts = Timestamp::from(10);
        assert_eq!(ts - 20u64, Timestamp::zero());
        assert_eq!(ts + 5u64, Timestamp::from(15));
        assert_eq!(ts - Duration::from_secs(3), Timestamp::from(7));
    }

    #[test]
    fn test_serde_plain_number() {
        let ts = Timestamp::from(1682060685);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1682060685");
        let back: Timestamp = serde_json::from_str("1682060685").unwrap();
        assert_eq!(back, ts);
    }
}
