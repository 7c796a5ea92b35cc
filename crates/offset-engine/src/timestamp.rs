//! Timestamps: a tick count travelling together with its resolution and zone.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::calendar::CivilDateTime;
use crate::dst::localize;
use crate::error::{OffsetError, Result};
use crate::options::OffsetOptions;
use crate::resolution::Resolution;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA time zone name into a [`Tz`].
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| OffsetError::InvalidTimeZone(format!("'{name}'")))
}

/// Ticks since the Unix epoch at a given [`Resolution`], optionally zoned.
///
/// A zoned timestamp denotes an absolute instant. A naive timestamp (no
/// zone) denotes a wall-clock value, with ticks counted as if in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    ticks: i64,
    resolution: Resolution,
    time_zone: Option<Tz>,
}

impl Timestamp {
    pub fn new(ticks: i64, resolution: Resolution, time_zone: Option<Tz>) -> Self {
        Self {
            ticks,
            resolution,
            time_zone,
        }
    }

    pub fn naive(ticks: i64, resolution: Resolution) -> Self {
        Self::new(ticks, resolution, None)
    }

    pub fn zoned(ticks: i64, resolution: Resolution, time_zone: Tz) -> Self {
        Self::new(ticks, resolution, Some(time_zone))
    }

    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn time_zone(&self) -> Option<Tz> {
        self.time_zone
    }

    /// Same resolution and zone, different tick count.
    pub fn with_ticks(&self, ticks: i64) -> Self {
        Self { ticks, ..*self }
    }

    /// The UTC reading of this timestamp (the naive reading if not zoned).
    pub fn to_utc_civil(&self) -> Result<CivilDateTime> {
        self.resolution.to_civil(self.ticks)
    }

    /// The wall-clock reading of this timestamp in its own zone.
    pub fn to_local_civil(&self) -> Result<CivilDateTime> {
        let utc = self.to_utc_civil()?;
        Ok(match self.time_zone {
            Some(tz) => tz.from_utc_datetime(&utc).naive_local(),
            None => utc,
        })
    }

    /// Build a timestamp from a wall-clock reading in `time_zone`.
    ///
    /// Gaps and overlaps are resolved with the DST policies in `options`.
    pub fn from_local_civil(
        local: CivilDateTime,
        resolution: Resolution,
        time_zone: Option<Tz>,
        options: &OffsetOptions,
    ) -> Result<Self> {
        let utc = match time_zone {
            Some(tz) => localize(local, &tz, options.ambiguous, options.nonexistent)?.naive_utc(),
            None => local,
        };
        Ok(Self::new(resolution.from_civil(utc)?, resolution, time_zone))
    }

    /// Parse timestamp text.
    ///
    /// Accepts RFC 3339 (`2020-01-01T00:00:00+01:00`), a naive date/time
    /// (`2020-01-01T00:00:00.123`, `2020-01-01 00:00`) or a bare date
    /// (`2020-01-01`, midnight). Naive text is read as wall clock in
    /// `time_zone`; RFC 3339 text denotes an instant, and for a naive
    /// timestamp its UTC reading is kept.
    ///
    /// # Errors
    ///
    /// Returns [`OffsetError::InvalidDatetime`] if no format matches, plus any
    /// error from localizing or encoding the value.
    pub fn parse(
        text: &str,
        resolution: Resolution,
        time_zone: Option<Tz>,
        options: &OffsetOptions,
    ) -> Result<Self> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            let ticks = resolution.from_civil(dt.naive_utc())?;
            return Ok(Self::new(ticks, resolution, time_zone));
        }
        let local = parse_naive(text)
            .ok_or_else(|| OffsetError::InvalidDatetime(format!("'{text}'")))?;
        Self::from_local_civil(local, resolution, time_zone, options)
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Timestamp {
    /// Local wall clock at the precision of the resolution, with the UTC
    /// offset appended when zoned.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(utc) = self.to_utc_civil() else {
            return write!(f, "{}{}", self.ticks, self.resolution);
        };
        let fraction = match self.resolution {
            Resolution::Milliseconds => "%.3f",
            Resolution::Microseconds => "%.6f",
            Resolution::Nanoseconds => "%.9f",
        };
        match self.time_zone {
            Some(tz) => {
                let local = tz.from_utc_datetime(&utc);
                let pattern = format!("%Y-%m-%dT%H:%M:%S{fraction}%:z");
                write!(f, "{}", local.format(&pattern))
            }
            None => {
                let pattern = format!("%Y-%m-%dT%H:%M:%S{fraction}");
                write!(f, "{}", utc.format(&pattern))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::NonexistentPolicy;
    use chrono::Timelike;

    fn london() -> Tz {
        parse_time_zone("Europe/London").unwrap()
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(parse_time_zone("Asia/Kathmandu").unwrap(), chrono_tz::Asia::Kathmandu);
        let err = parse_time_zone("Invalid/Zone").unwrap_err().to_string();
        assert!(err.contains("Invalid timezone"), "got: {err}");
    }

    #[test]
    fn test_parse_bare_date_naive() {
        let ts = Timestamp::parse(
            "2020-01-01",
            Resolution::Milliseconds,
            None,
            &OffsetOptions::default(),
        )
        .unwrap();
        assert_eq!(ts.ticks(), 1_577_836_800_000);
        assert_eq!(ts.time_zone(), None);
    }

    #[test]
    fn test_parse_naive_text_in_zone_is_wall_clock() {
        // Kathmandu is UTC+05:45
        let ts = Timestamp::parse(
            "2020-01-01T00:00:00",
            Resolution::Milliseconds,
            Some(chrono_tz::Asia::Kathmandu),
            &OffsetOptions::default(),
        )
        .unwrap();
        assert_eq!(ts.ticks(), 1_577_836_800_000 - (5 * 3600 + 45 * 60) * 1000);
        assert_eq!(
            ts.to_local_civil().unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rfc3339_is_an_instant() {
        let ts = Timestamp::parse(
            "2020-06-01T12:00:00+01:00",
            Resolution::Microseconds,
            Some(london()),
            &OffsetOptions::default(),
        )
        .unwrap();
        let local = ts.to_local_civil().unwrap();
        assert_eq!(local.hour(), 12);
        assert_eq!(ts.to_utc_civil().unwrap().hour(), 11);
    }

    #[test]
    fn test_parse_fractional_seconds_keep_precision() {
        let ts = Timestamp::parse(
            "1970-01-01T00:00:00.000000123",
            Resolution::Nanoseconds,
            None,
            &OffsetOptions::default(),
        )
        .unwrap();
        assert_eq!(ts.ticks(), 123);
    }

    #[test]
    fn test_parse_space_separated_minutes() {
        let ts = Timestamp::parse(
            "1970-01-01 00:07",
            Resolution::Milliseconds,
            None,
            &OffsetOptions::default(),
        )
        .unwrap();
        assert_eq!(ts.ticks(), 7 * 60 * 1000);
    }

    #[test]
    fn test_parse_invalid_text() {
        let err = Timestamp::parse(
            "not-a-datetime",
            Resolution::Milliseconds,
            None,
            &OffsetOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OffsetError::InvalidDatetime(_)));
    }

    #[test]
    fn test_parse_nonexistent_local_time_respects_policy() {
        let options = OffsetOptions {
            nonexistent: NonexistentPolicy::Raise,
            ..Default::default()
        };
        let result = Timestamp::parse(
            "2026-03-29T01:30:00",
            Resolution::Milliseconds,
            Some(london()),
            &options,
        );
        assert!(matches!(result, Err(OffsetError::NonexistentLocalTime(_))));
    }

    #[test]
    fn test_with_ticks_keeps_metadata() {
        let ts = Timestamp::zoned(5, Resolution::Microseconds, london());
        let moved = ts.with_ticks(10);
        assert_eq!(moved.ticks(), 10);
        assert_eq!(moved.resolution(), Resolution::Microseconds);
        assert_eq!(moved.time_zone(), Some(london()));
    }

    #[test]
    fn test_display_naive_and_zoned() {
        let naive = Timestamp::naive(1_577_836_800_123, Resolution::Milliseconds);
        assert_eq!(naive.to_string(), "2020-01-01T00:00:00.123");

        let zoned = Timestamp::zoned(1_590_969_600_000_000, Resolution::Microseconds, london());
        assert_eq!(zoned.to_string(), "2020-06-01T01:00:00.000000+01:00");

        let nanos = Timestamp::naive(1, Resolution::Nanoseconds);
        assert_eq!(nanos.to_string(), "1970-01-01T00:00:00.000000001");
    }

    #[test]
    fn test_display_out_of_range_falls_back_to_ticks() {
        let ts = Timestamp::naive(i64::MAX, Resolution::Milliseconds);
        assert_eq!(ts.to_string(), format!("{}ms", i64::MAX));
    }
}
