//! Calendar arithmetic on wall-clock values in the proleptic Gregorian calendar.
//!
//! Months and years are added first, clamping the day-of-month to the end of
//! the target month (31 January + 1 month is 28 or 29 February, never March).
//! Weeks and days are then added as a literal day count starting from the
//! clamped date. Time of day is never touched here.
//!
//! Because of clamping this mapping is not injective: 2020-02-28 and
//! 2020-02-29 both land on 2019-02-28 when shifted by `-1y`, and undoing an
//! offset does not necessarily restore the original date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};

use crate::duration::DurationSpec;
use crate::error::{OffsetError, Result};

/// A wall-clock date and time with no time zone attached.
pub type CivilDateTime = NaiveDateTime;

const DAYS_PER_MONTH: [[u32; 12]; 2] = [
    [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
    [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
];

/// Gregorian leap-year rule: divisible by 4, except centuries not divisible by 400.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-12) of `year`.
///
/// # Panics
///
/// Panics if `month` is not in `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    DAYS_PER_MONTH[is_leap_year(year) as usize][(month - 1) as usize]
}

/// Add a signed number of months, clamping the day to the target month's length.
///
/// # Errors
///
/// Returns [`OffsetError::OutOfRange`] if the target year cannot be represented.
pub fn add_months(dt: CivilDateTime, months: i64) -> Result<CivilDateTime> {
    if months == 0 {
        return Ok(dt);
    }

    // months since year 0, with a 0-based month index
    let total = i64::from(dt.year()) * 12 + i64::from(dt.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).map_err(|_| out_of_range(&dt, "months"))?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = dt.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(dt.time()))
        .ok_or_else(|| out_of_range(&dt, "months"))
}

/// Add a signed number of whole days; rolls over month and year boundaries.
///
/// # Errors
///
/// Returns [`OffsetError::OutOfRange`] if the result leaves the representable range.
pub fn add_days(dt: CivilDateTime, days: i64) -> Result<CivilDateTime> {
    if days == 0 {
        return Ok(dt);
    }
    TimeDelta::try_days(days)
        .and_then(|delta| dt.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(&dt, "days"))
}

/// Apply the calendar part of `spec` (years, months, weeks, days) to `base`.
///
/// Months are resolved before days so that day addition starts from a valid,
/// already-clamped date. The physical part of `spec` is ignored.
///
/// # Errors
///
/// Returns [`OffsetError::OutOfRange`] only when the result would leave the
/// year range chrono can represent.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use offset_engine::{calendar::apply_calendar, DurationSpec};
///
/// let jan31 = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let spec = DurationSpec::parse("1mo").unwrap();
/// let result = apply_calendar(jan31, &spec).unwrap();
/// assert_eq!(result.date(), NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
/// ```
pub fn apply_calendar(base: CivilDateTime, spec: &DurationSpec) -> Result<CivilDateTime> {
    let shifted = add_months(base, spec.calendar_months())?;
    add_days(shifted, spec.calendar_days())
}

fn out_of_range(dt: &CivilDateTime, what: &str) -> OffsetError {
    OffsetError::OutOfRange(format!("adding {what} to {dt} leaves the supported year range"))
}
