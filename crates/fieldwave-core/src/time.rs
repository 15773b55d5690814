//! Time primitives for the fieldwave runtime
//!
//! Logical time is a real number of seconds handed to a device by whoever
//! schedules its rounds. Devices never read a wall clock.

use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// Logical time in seconds
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct LogicalTime(pub f64);

impl LogicalTime {
    pub const ZERO: LogicalTime = LogicalTime(0.0);
    pub const INFINITY: LogicalTime = LogicalTime(f64::INFINITY);
    pub const NEG_INFINITY: LogicalTime = LogicalTime(f64::NEG_INFINITY);

    #[inline]
    pub fn from_secs(secs: f64) -> Self {
        LogicalTime(secs)
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative
    #[inline]
    pub fn elapsed_since(self, earlier: LogicalTime) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    /// Total order (NaN sorts last), for queues and sorting
    #[inline]
    pub fn total_cmp(&self, other: &LogicalTime) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_bits().to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        LogicalTime(f64::from_bits(u64::from_le_bytes(bytes)))
    }
}

impl Add<f64> for LogicalTime {
    type Output = LogicalTime;

    #[inline]
    fn add(self, rhs: f64) -> Self::Output {
        LogicalTime(self.0 + rhs)
    }
}

impl Sub<f64> for LogicalTime {
    type Output = LogicalTime;

    #[inline]
    fn sub(self, rhs: f64) -> Self::Output {
        LogicalTime(self.0 - rhs)
    }
}

impl Sub<LogicalTime> for LogicalTime {
    type Output = f64;

    #[inline]
    fn sub(self, rhs: LogicalTime) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::fmt::Debug for LogicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3})", self.0)
    }
}

impl std::fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Current and previous round times of one device
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundClock {
    pub current: LogicalTime,
    pub previous: Option<LogicalTime>,
}

impl RoundClock {
    pub fn new(current: LogicalTime, previous: Option<LogicalTime>) -> Self {
        RoundClock { current, previous }
    }

    /// Clock of a device's very first round
    pub fn first(current: LogicalTime) -> Self {
        RoundClock {
            current,
            previous: None,
        }
    }

    /// Time elapsed since the previous round.
    ///
    /// 1 on the first round. Clamped to 0 when the clock did not advance.
    pub fn delta(&self) -> f64 {
        match self.previous {
            None => 1.0,
            Some(previous) => self.current.elapsed_since(previous),
        }
    }

    /// True when the current time does not lie after the previous one
    pub fn is_non_monotonic(&self) -> bool {
        matches!(self.previous, Some(previous) if !(self.current > previous))
    }

    /// Clock of the round following this one
    pub fn advance(&self, next: LogicalTime) -> RoundClock {
        RoundClock {
            current: next,
            previous: Some(self.current),
        }
    }
}
