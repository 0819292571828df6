//! Virtual simulation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// A point in virtual time, in integer nanoseconds since simulation start.
///
/// Virtual time is independent of wall-clock time. It only advances when the
/// event queue pops an entry. [`SimTime::MAX`] stands for "infinity" and is
/// used as a drain limit when running as fast as possible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// Simulation start.
    pub const ZERO: SimTime = SimTime(0);

    /// The end of time. Draining up to `MAX` drains everything.
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Create a time from nanoseconds since start.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since start.
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Create a time from a duration since start, saturating at [`SimTime::MAX`].
    pub fn from_duration(since_start: Duration) -> Self {
        Self(u64::try_from(since_start.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Duration since start.
    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.0)
    }

    /// Add a duration, saturating at [`SimTime::MAX`].
    pub fn saturating_add(self, offset: Duration) -> Self {
        let offset = u64::try_from(offset.as_nanos()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(offset))
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is later.
    pub fn saturating_since(self, earlier: SimTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        self.saturating_add(rhs)
    }
}

impl From<u64> for SimTime {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

/// Seconds with millisecond precision, e.g. `1.371 s`.
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == SimTime::MAX {
            return write!(f, "inf");
        }
        write!(f, "{:.3} s", self.0 as f64 / 1_000_000_000.0)
    }
}
