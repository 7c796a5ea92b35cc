//! Duration specifications: the `"1y2mo3d4h"` grammar.
//!
//! A duration string is an optional leading `-` followed by one or more
//! `<integer><unit>` pairs with no separators. The sign applies to the
//! whole specification. Units are matched longest-first so that `mo`
//! (months) and `ms` (milliseconds) win over `m` (minutes).
//!
//! | unit | meaning     | kind     |
//! |------|-------------|----------|
//! | `y`  | year        | calendar |
//! | `q`  | quarter     | calendar |
//! | `mo` | month       | calendar |
//! | `w`  | week        | calendar |
//! | `d`  | day         | calendar |
//! | `h`  | hour        | physical |
//! | `m`  | minute      | physical |
//! | `s`  | second      | physical |
//! | `ms` | millisecond | physical |
//! | `us` | microsecond | physical |
//! | `ns` | nanosecond  | physical |
//!
//! Repeated units accumulate (`"2d24h"` is two days plus twenty-four hours,
//! not normalized into three days).

use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{OffsetError, Result};

pub(crate) const NS_MICROSECOND: u64 = 1_000;
pub(crate) const NS_MILLISECOND: u64 = 1_000_000;
pub(crate) const NS_SECOND: i128 = 1_000_000_000;
pub(crate) const NS_DAY: i128 = 86_400 * NS_SECOND;

/// The single sign governing a whole [`DurationSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    /// `1` or `-1`.
    pub fn as_i64(self) -> i64 {
        match self {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }
}

impl Neg for Sign {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

/// A parsed duration: calendar units (`years`..`days`) applied on the wall
/// clock and physical units (`hours`..`subsecond_ns`) applied as elapsed time.
///
/// All magnitudes are non-negative; `sign` applies to every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct DurationSpec {
    pub sign: Sign,
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub subsecond_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

/// Unit spellings, longest first. Tokenization picks the first entry that
/// prefixes the remaining input.
const UNITS: &[(&str, Unit)] = &[
    ("mo", Unit::Month),
    ("ms", Unit::Millisecond),
    ("us", Unit::Microsecond),
    ("ns", Unit::Nanosecond),
    ("y", Unit::Year),
    ("q", Unit::Quarter),
    ("w", Unit::Week),
    ("d", Unit::Day),
    ("h", Unit::Hour),
    ("m", Unit::Minute),
    ("s", Unit::Second),
];

impl DurationSpec {
    /// Parse a duration string such as `"2d24h"`, `"-2mo"` or `"1500us"`.
    ///
    /// # Errors
    ///
    /// Returns [`OffsetError::InvalidDurationSyntax`] if the text is empty, is a
    /// bare sign, contains a unit without a preceding integer, an integer
    /// without a unit, an unknown token, or a magnitude too large to hold.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_engine::DurationSpec;
    ///
    /// let spec = DurationSpec::parse("2d24h").unwrap();
    /// assert_eq!(spec.days, 2);
    /// assert_eq!(spec.hours, 24);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(OffsetError::InvalidDurationSyntax(
                "empty duration".to_string(),
            ));
        }

        let (sign, mut rest) = match text.strip_prefix('-') {
            Some(rest) => (Sign::Negative, rest),
            None => (Sign::Positive, text),
        };

        if rest.is_empty() {
            return Err(OffsetError::InvalidDurationSyntax(format!(
                "duration has no components: '{text}'"
            )));
        }

        let mut spec = DurationSpec {
            sign,
            ..Default::default()
        };

        while !rest.is_empty() {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err(OffsetError::InvalidDurationSyntax(format!(
                    "expected integer at '{rest}' in '{text}'"
                )));
            }
            let n: u64 = rest[..digits].parse().map_err(|_| {
                OffsetError::InvalidDurationSyntax(format!(
                    "integer '{}' too large in '{text}'",
                    &rest[..digits]
                ))
            })?;
            rest = &rest[digits..];

            let (token, unit) = UNITS
                .iter()
                .find(|(token, _)| rest.starts_with(token))
                .ok_or_else(|| {
                    if rest.is_empty() {
                        OffsetError::InvalidDurationSyntax(format!(
                            "number without unit at end of '{text}'"
                        ))
                    } else {
                        OffsetError::InvalidDurationSyntax(format!(
                            "unknown unit at '{rest}' in '{text}'; available units are: \
                             'y', 'q', 'mo', 'w', 'd', 'h', 'm', 's', 'ms', 'us', 'ns'"
                        ))
                    }
                })?;
            rest = &rest[token.len()..];

            spec.accumulate(*unit, n).ok_or_else(|| {
                OffsetError::InvalidDurationSyntax(format!(
                    "'{n}{token}' overflows the duration in '{text}'"
                ))
            })?;
        }

        debug!(duration = text, spec = %spec, "parsed duration");
        Ok(spec)
    }

    fn accumulate(&mut self, unit: Unit, n: u64) -> Option<()> {
        fn add_u32(field: &mut u32, n: u64) -> Option<()> {
            *field = field.checked_add(u32::try_from(n).ok()?)?;
            Some(())
        }
        fn add_u64(field: &mut u64, n: u64) -> Option<()> {
            *field = field.checked_add(n)?;
            Some(())
        }

        match unit {
            Unit::Year => add_u32(&mut self.years, n),
            Unit::Quarter => add_u32(&mut self.months, n.checked_mul(3)?),
            Unit::Month => add_u32(&mut self.months, n),
            Unit::Week => add_u32(&mut self.weeks, n),
            Unit::Day => add_u32(&mut self.days, n),
            Unit::Hour => add_u64(&mut self.hours, n),
            Unit::Minute => add_u64(&mut self.minutes, n),
            Unit::Second => add_u64(&mut self.seconds, n),
            Unit::Millisecond => add_u64(&mut self.subsecond_ns, n.checked_mul(NS_MILLISECOND)?),
            Unit::Microsecond => add_u64(&mut self.subsecond_ns, n.checked_mul(NS_MICROSECOND)?),
            Unit::Nanosecond => add_u64(&mut self.subsecond_ns, n),
        }
    }

    /// `true` if every magnitude is zero.
    pub fn is_zero(&self) -> bool {
        !self.has_calendar() && !self.has_physical()
    }

    /// `true` if any of years, months, weeks or days is non-zero.
    pub fn has_calendar(&self) -> bool {
        self.years != 0 || self.months != 0 || self.weeks != 0 || self.days != 0
    }

    /// `true` if any of hours, minutes, seconds or sub-seconds is non-zero.
    pub fn has_physical(&self) -> bool {
        self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.subsecond_ns != 0
    }

    /// Signed month count of the calendar part: `sign * (years * 12 + months)`.
    pub fn calendar_months(&self) -> i64 {
        self.sign.as_i64() * (i64::from(self.years) * 12 + i64::from(self.months))
    }

    /// Signed day count of the calendar part: `sign * (weeks * 7 + days)`.
    pub fn calendar_days(&self) -> i64 {
        self.sign.as_i64() * (i64::from(self.weeks) * 7 + i64::from(self.days))
    }

    /// Signed nanosecond count of the physical part.
    ///
    /// Every representable spec fits in an `i128`, so this never overflows.
    pub fn physical_nanos(&self) -> i128 {
        let whole_seconds = i128::from(self.hours) * 3600
            + i128::from(self.minutes) * 60
            + i128::from(self.seconds);
        let nanos = whole_seconds * NS_SECOND + i128::from(self.subsecond_ns);
        i128::from(self.sign.as_i64()) * nanos
    }

    /// Returns whether the physical part is a whole number of 24-hour days.
    ///
    /// Note that this says nothing about calendar days in a zone with DST.
    pub fn is_full_days(&self) -> bool {
        self.physical_nanos() % NS_DAY == 0
    }
}

impl Neg for DurationSpec {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            sign: -self.sign,
            ..self
        }
    }
}

impl FromStr for DurationSpec {
    type Err = OffsetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0s");
        }
        if self.sign == Sign::Negative {
            write!(f, "-")?;
        }
        let parts: [(u64, &str); 7] = [
            (self.years.into(), "y"),
            (self.months.into(), "mo"),
            (self.weeks.into(), "w"),
            (self.days.into(), "d"),
            (self.hours, "h"),
            (self.minutes, "m"),
            (self.seconds, "s"),
        ];
        for (n, unit) in parts {
            if n != 0 {
                write!(f, "{n}{unit}")?;
            }
        }
        let ns = self.subsecond_ns;
        if ns != 0 {
            if ns % NS_MILLISECOND == 0 {
                write!(f, "{}ms", ns / NS_MILLISECOND)?;
            } else if ns % NS_MICROSECOND == 0 {
                write!(f, "{}us", ns / NS_MICROSECOND)?;
            } else {
                write!(f, "{ns}ns")?;
            }
        }
        Ok(())
    }
}
