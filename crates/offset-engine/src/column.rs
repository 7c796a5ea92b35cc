//! Column-wide offsetting.
//!
//! The duration text is parsed once, before any element is touched; a syntax
//! error fails the whole call with no partial output. Each element is then
//! offset independently and the output keeps input order. Nulls pass through.

use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::compose;
use crate::duration::{DurationSpec, Sign};
use crate::error::{OffsetError, Result};
use crate::options::{OffsetOptions, OverflowPolicy};
use crate::resolution::Resolution;
use crate::timestamp::{parse_time_zone, Timestamp};

const MS_PER_DAY: i64 = 86_400_000;

/// Nullable timestamps sharing one resolution and zero-or-one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatetimeColumn {
    values: Vec<Option<i64>>,
    resolution: Resolution,
    time_zone: Option<Tz>,
}

impl DatetimeColumn {
    pub fn new(values: Vec<Option<i64>>, resolution: Resolution, time_zone: Option<Tz>) -> Self {
        Self {
            values,
            resolution,
            time_zone,
        }
    }

    /// Build a column from textual metadata, e.g. `("ms", Some("Europe/London"))`.
    ///
    /// # Errors
    ///
    /// Returns [`OffsetError::InvalidResolution`] or [`OffsetError::InvalidTimeZone`].
    pub fn try_new(
        values: Vec<Option<i64>>,
        resolution: &str,
        time_zone: Option<&str>,
    ) -> Result<Self> {
        let resolution = resolution.parse()?;
        let time_zone = time_zone.map(parse_time_zone).transpose()?;
        Ok(Self::new(values, resolution, time_zone))
    }

    pub fn values(&self) -> &[Option<i64>] {
        &self.values
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn time_zone(&self) -> Option<Tz> {
        self.time_zone
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Timestamp> {
        self.values
            .get(index)
            .copied()
            .flatten()
            .map(|ticks| self.timestamp(ticks))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Timestamp>> + '_ {
        self.values
            .iter()
            .map(|value| value.map(|ticks| self.timestamp(ticks)))
    }

    fn timestamp(&self, ticks: i64) -> Timestamp {
        Timestamp::new(ticks, self.resolution, self.time_zone)
    }

    /// Offset every element by the duration text.
    ///
    /// # Errors
    ///
    /// Returns [`OffsetError::InvalidDurationSyntax`] before any element is
    /// processed, or the first element error under [`OverflowPolicy::Fail`].
    pub fn offset_by(&self, duration: &str, options: &OffsetOptions) -> Result<Self> {
        let spec = DurationSpec::parse(duration)?;
        self.offset_by_spec(&spec, options)
    }

    /// Offset every element by an already-parsed duration.
    pub fn offset_by_spec(&self, spec: &DurationSpec, options: &OffsetOptions) -> Result<Self> {
        debug!(
            len = self.len(),
            resolution = %self.resolution,
            zone = self.time_zone.map(|tz| tz.name()),
            duration = %spec,
            "offsetting datetime column"
        );
        let values = self
            .iter()
            .map(|value| match value {
                Some(ts) => offset_element(ts, spec, options).map(|out| out.map(|ts| ts.ticks())),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            nulls = values.iter().filter(|v| v.is_none()).count(),
            "offset datetime column"
        );
        Ok(Self::new(values, self.resolution, self.time_zone))
    }
}

/// Nullable calendar dates, as days since 1970-01-01.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateColumn {
    values: Vec<Option<i32>>,
}

impl DateColumn {
    pub fn new(values: Vec<Option<i32>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Option<i32>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Naive midnight timestamps at millisecond resolution.
    pub fn to_datetime(&self) -> DatetimeColumn {
        let values = self
            .values
            .iter()
            .map(|days| days.map(|days| i64::from(days) * MS_PER_DAY))
            .collect();
        DatetimeColumn::new(values, Resolution::Milliseconds, None)
    }

    /// Offset every date by the duration text.
    ///
    /// Stays a date column when the physical part is a whole number of days;
    /// otherwise the result is a naive millisecond datetime column.
    pub fn offset_by(&self, duration: &str, options: &OffsetOptions) -> Result<TemporalColumn> {
        let spec = DurationSpec::parse(duration)?;
        self.offset_by_spec(&spec, options)
    }

    pub fn offset_by_spec(
        &self,
        spec: &DurationSpec,
        options: &OffsetOptions,
    ) -> Result<TemporalColumn> {
        let shifted = self.to_datetime().offset_by_spec(spec, options)?;
        if !spec.is_full_days() {
            debug!(duration = %spec, "promoting date column to datetime");
            return Ok(TemporalColumn::Datetime(shifted));
        }
        let values = shifted
            .values()
            .iter()
            .map(|ticks| {
                ticks
                    .map(|ms| days_from_millis(ms, options.overflow))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TemporalColumn::Date(DateColumn::new(values)))
    }
}

/// Saturated datetimes (`i64::MIN`/`i64::MAX` ms) map to the date extremes.
fn days_from_millis(ms: i64, overflow: OverflowPolicy) -> Result<i32> {
    match i32::try_from(ms.div_euclid(MS_PER_DAY)) {
        Ok(days) => Ok(days),
        Err(_) if overflow == OverflowPolicy::Saturate => {
            Ok(if ms < 0 { i32::MIN } else { i32::MAX })
        }
        Err(_) => Err(OffsetError::OutOfRange(format!(
            "{ms}ms is beyond the date range"
        ))),
    }
}

/// A column the offset operation accepts: plain dates or datetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalColumn {
    Date(DateColumn),
    Datetime(DatetimeColumn),
}

impl TemporalColumn {
    pub fn len(&self) -> usize {
        match self {
            TemporalColumn::Date(column) => column.len(),
            TemporalColumn::Datetime(column) => column.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset every element by the duration text.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_engine::{DateColumn, OffsetOptions, TemporalColumn};
    ///
    /// // 2020-01-01 and 2020-01-02
    /// let dates = TemporalColumn::Date(DateColumn::new(vec![Some(18262), Some(18263)]));
    /// let result = dates.offset_by("-2mo", &OffsetOptions::default()).unwrap();
    /// // 2019-11-01 and 2019-11-02
    /// assert_eq!(result, TemporalColumn::Date(DateColumn::new(vec![Some(18201), Some(18202)])));
    /// ```
    pub fn offset_by(&self, duration: &str, options: &OffsetOptions) -> Result<Self> {
        let spec = DurationSpec::parse(duration)?;
        match self {
            TemporalColumn::Date(column) => column.offset_by_spec(&spec, options),
            TemporalColumn::Datetime(column) => column
                .offset_by_spec(&spec, options)
                .map(TemporalColumn::Datetime),
        }
    }
}

/// Offset a single timestamp by the duration text.
///
/// Returns `None` only under [`OverflowPolicy::Null`] when the result is out
/// of range.
pub fn offset_scalar(
    value: Timestamp,
    duration: &str,
    options: &OffsetOptions,
) -> Result<Option<Timestamp>> {
    let spec = DurationSpec::parse(duration)?;
    offset_element(value, &spec, options)
}

fn offset_element(
    value: Timestamp,
    spec: &DurationSpec,
    options: &OffsetOptions,
) -> Result<Option<Timestamp>> {
    // an input that cannot be read as a date is an error under every policy
    if spec.has_calendar() {
        value.to_local_civil()?;
    }
    match compose::offset_by(value, spec, options) {
        Ok(out) => Ok(Some(out)),
        Err(err @ (OffsetError::ResolutionOverflow { .. } | OffsetError::OutOfRange(_))) => {
            match options.overflow {
                OverflowPolicy::Fail => Err(err),
                OverflowPolicy::Saturate => {
                    let ticks = match spec.sign {
                        Sign::Positive => i64::MAX,
                        Sign::Negative => i64::MIN,
                    };
                    warn!(
                        input = value.ticks(),
                        saturated = ticks,
                        %err,
                        "saturating out-of-range element"
                    );
                    Ok(Some(value.with_ticks(ticks)))
                }
                OverflowPolicy::Null => {
                    warn!(input = value.ticks(), %err, "nulling out-of-range element");
                    Ok(None)
                }
            }
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms_column(values: Vec<Option<i64>>, zone: Option<&str>) -> DatetimeColumn {
        DatetimeColumn::try_new(values, "ms", zone).unwrap()
    }

    #[test]
    fn test_try_new_validates_metadata() {
        let err = DatetimeColumn::try_new(vec![], "s", None).unwrap_err();
        assert!(matches!(err, OffsetError::InvalidResolution(_)));
        let err = DatetimeColumn::try_new(vec![], "ms", Some("Mars/Olympus")).unwrap_err();
        assert!(matches!(err, OffsetError::InvalidTimeZone(_)));
    }

    #[test]
    fn test_invalid_duration_fails_before_elements() {
        let column = ms_column(vec![Some(0), None], None);
        let err = column.offset_by("1mo-3d", &OffsetOptions::default()).unwrap_err();
        assert!(matches!(err, OffsetError::InvalidDurationSyntax(_)));
    }

    #[test]
    fn test_nulls_pass_through_in_order() {
        let column = ms_column(vec![Some(0), None, Some(1_000)], Some("Europe/London"));
        let result = column.offset_by("1s", &OffsetOptions::default()).unwrap();
        assert_eq!(result.values(), &[Some(1_000), None, Some(2_000)]);
        assert_eq!(result.resolution(), Resolution::Milliseconds);
        assert_eq!(result.time_zone(), column.time_zone());
    }

    #[test]
    fn test_empty_column() {
        let column = ms_column(vec![], None);
        let result = column.offset_by("1d", &OffsetOptions::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_overflow_fails_by_default() {
        let column =
            DatetimeColumn::new(vec![Some(0), Some(i64::MAX - 1)], Resolution::Nanoseconds, None);
        let err = column.offset_by("1s", &OffsetOptions::default()).unwrap_err();
        assert!(matches!(err, OffsetError::ResolutionOverflow { .. }));
    }

    #[test]
    fn test_overflow_saturates_in_offset_direction() {
        let options = OffsetOptions {
            overflow: OverflowPolicy::Saturate,
            ..Default::default()
        };
        let column = DatetimeColumn::new(
            vec![Some(0), Some(i64::MAX - 1), Some(i64::MIN + 1)],
            Resolution::Nanoseconds,
            None,
        );
        let forward = column.offset_by("1s", &options).unwrap();
        assert_eq!(
            forward.values(),
            &[
                Some(1_000_000_000),
                Some(i64::MAX),
                Some(i64::MIN + 1_000_000_001)
            ]
        );
        let backward = column.offset_by("-1s", &options).unwrap();
        assert_eq!(backward.values()[2], Some(i64::MIN));
    }

    fn last_representable_day() -> i32 {
        let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        chrono::NaiveDate::MAX.signed_duration_since(epoch).num_days() as i32
    }

    fn first_representable_day() -> i32 {
        let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        chrono::NaiveDate::MIN.signed_duration_since(epoch).num_days() as i32
    }

    #[test]
    fn test_date_column_overflow_saturates_to_date_extremes() {
        let options = OffsetOptions {
            overflow: OverflowPolicy::Saturate,
            ..Default::default()
        };
        let dates = DateColumn::new(vec![Some(last_representable_day()), Some(0), None]);
        let forward = dates.offset_by("1y", &options).unwrap();
        assert_eq!(
            forward,
            TemporalColumn::Date(DateColumn::new(vec![Some(i32::MAX), Some(365), None]))
        );

        let dates = DateColumn::new(vec![Some(first_representable_day()), Some(0)]);
        let backward = dates.offset_by("-1y", &options).unwrap();
        assert_eq!(
            backward,
            TemporalColumn::Date(DateColumn::new(vec![Some(i32::MIN), Some(-365)]))
        );
    }

    #[test]
    fn test_date_column_overflow_null_and_fail() {
        let dates = DateColumn::new(vec![Some(last_representable_day()), Some(0)]);
        let options = OffsetOptions {
            overflow: OverflowPolicy::Null,
            ..Default::default()
        };
        let nulled = dates.offset_by("1d", &options).unwrap();
        assert_eq!(nulled, TemporalColumn::Date(DateColumn::new(vec![None, Some(1)])));

        let err = dates.offset_by("1d", &OffsetOptions::default()).unwrap_err();
        assert!(matches!(err, OffsetError::OutOfRange(_)));
    }

    #[test]
    fn test_unreadable_input_is_not_subject_to_overflow_policy() {
        // far beyond the last representable year at millisecond resolution
        let column = ms_column(vec![Some(i64::MAX - 1), Some(0)], None);
        for overflow in [OverflowPolicy::Saturate, OverflowPolicy::Null] {
            let options = OffsetOptions {
                overflow,
                ..Default::default()
            };
            let err = column.offset_by("-1d", &options).unwrap_err();
            assert!(matches!(err, OffsetError::OutOfRange(_)), "{overflow:?}");
        }
        // physical offsets never read the date
        let options = OffsetOptions {
            overflow: OverflowPolicy::Null,
            ..Default::default()
        };
        let shifted = column.offset_by("-1s", &options).unwrap();
        assert_eq!(shifted.values(), &[Some(i64::MAX - 1_001), Some(-1_000)]);
    }

    #[test]
    fn test_overflow_null_policy() {
        let options = OffsetOptions {
            overflow: OverflowPolicy::Null,
            ..Default::default()
        };
        // mid-2261; one year later is past the end of i64 nanoseconds
        let column = DatetimeColumn::new(
            vec![Some(9_200_000_000_000_000_000), Some(0)],
            Resolution::Nanoseconds,
            None,
        );
        let result = column.offset_by("1y", &options).unwrap();
        assert_eq!(result.values()[0], None);
        assert!(result.values()[1].is_some());
    }

    #[test]
    fn test_date_column_stays_date_for_whole_days() {
        let dates = DateColumn::new(vec![Some(18262), None]);
        for duration in ["3d", "72h", "2d24h"] {
            let result = dates.offset_by(duration, &OffsetOptions::default()).unwrap();
            assert_eq!(result, TemporalColumn::Date(DateColumn::new(vec![Some(18265), None])));
        }
    }

    #[test]
    fn test_date_column_negative_days_before_epoch() {
        let dates = DateColumn::new(vec![Some(0)]);
        let result = dates.offset_by("-1d", &OffsetOptions::default()).unwrap();
        assert_eq!(result, TemporalColumn::Date(DateColumn::new(vec![Some(-1)])));
    }

    #[test]
    fn test_date_column_promotes_for_sub_day_offsets() {
        let dates = DateColumn::new(vec![Some(18262)]);
        let result = dates.offset_by("7m", &OffsetOptions::default()).unwrap();
        let TemporalColumn::Datetime(column) = result else {
            panic!("expected datetime column");
        };
        assert_eq!(column.resolution(), Resolution::Milliseconds);
        assert_eq!(column.time_zone(), None);
        assert_eq!(column.get(0).unwrap().to_string(), "2020-01-01T00:07:00.000");
    }

    #[test]
    fn test_offset_scalar_matches_column() {
        let ts = Timestamp::naive(1_577_836_800_000, Resolution::Milliseconds);
        let scalar = offset_scalar(ts, "-2mo", &OffsetOptions::default()).unwrap().unwrap();
        let column = ms_column(vec![Some(ts.ticks())], None)
            .offset_by("-2mo", &OffsetOptions::default())
            .unwrap();
        assert_eq!(column.get(0), Some(scalar));
    }

    #[test]
    fn test_get_and_iter() {
        let column = ms_column(vec![Some(5), None], None);
        assert_eq!(column.get(0), Some(Timestamp::naive(5, Resolution::Milliseconds)));
        assert_eq!(column.get(1), None);
        assert_eq!(column.get(2), None);
        assert_eq!(column.iter().filter(Option::is_some).count(), 1);
    }
}
