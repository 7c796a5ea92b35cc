//! Timestamp resolutions and conversion between ticks and civil date/times.
//!
//! A tick count is always interpreted relative to the Unix epoch
//! (1970-01-01T00:00:00). Conversions here are exact integer scaling; no
//! floating point is involved anywhere.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

use crate::error::{OffsetError, Result};

/// The unit of a timestamp's tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Resolution {
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ns")]
    Nanoseconds,
}

impl Resolution {
    /// Number of ticks in one second.
    pub const fn ticks_per_second(self) -> i64 {
        match self {
            Resolution::Milliseconds => 1_000,
            Resolution::Microseconds => 1_000_000,
            Resolution::Nanoseconds => 1_000_000_000,
        }
    }

    /// Number of nanoseconds in one tick.
    pub const fn nanos_per_tick(self) -> i64 {
        1_000_000_000 / self.ticks_per_second()
    }

    /// Scale a signed nanosecond count to ticks.
    ///
    /// Sub-tick remainders are truncated toward zero, so `-1500us` on a
    /// millisecond timestamp moves it back by exactly one tick.
    pub fn nanos_to_ticks(self, nanos: i128) -> i128 {
        nanos / i128::from(self.nanos_per_tick())
    }

    /// Decompose a tick count into a UTC civil date/time.
    ///
    /// # Errors
    ///
    /// Returns [`OffsetError::OutOfRange`] if the instant lies outside the
    /// years chrono can represent (only reachable at `ms`/`us` resolution).
    pub fn to_civil(self, ticks: i64) -> Result<NaiveDateTime> {
        let tps = self.ticks_per_second();
        let secs = ticks.div_euclid(tps);
        let nanos = ticks.rem_euclid(tps) * self.nanos_per_tick();
        // rem_euclid keeps nanos in 0..1_000_000_000
        DateTime::from_timestamp(secs, nanos as u32)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| {
                OffsetError::OutOfRange(format!("{ticks}{self} cannot be represented as a date"))
            })
    }

    /// Encode a UTC civil date/time as a tick count.
    ///
    /// Nanoseconds finer than one tick are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`OffsetError::ResolutionOverflow`] if the tick count does not
    /// fit in an `i64`.
    pub fn from_civil(self, dt: NaiveDateTime) -> Result<i64> {
        let utc = dt.and_utc();
        let ticks = i128::from(utc.timestamp()) * i128::from(self.ticks_per_second())
            + i128::from(utc.timestamp_subsec_nanos()) / i128::from(self.nanos_per_tick());
        i64::try_from(ticks).map_err(|_| OffsetError::ResolutionOverflow {
            resolution: self,
            detail: format!("datetime {dt}"),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Milliseconds => "ms",
            Resolution::Microseconds => "us",
            Resolution::Nanoseconds => "ns",
        }
    }
}

impl FromStr for Resolution {
    type Err = OffsetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ms" => Ok(Resolution::Milliseconds),
            "us" => Ok(Resolution::Microseconds),
            "ns" => Ok(Resolution::Nanoseconds),
            _ => Err(OffsetError::InvalidResolution(format!(
                "'{s}' (expected one of 'ms', 'us', 'ns')"
            ))),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
