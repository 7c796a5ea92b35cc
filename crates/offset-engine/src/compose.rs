//! Composition of calendar and physical arithmetic for a single timestamp.
//!
//! Calendar units run on the wall clock: a zoned instant is read in its zone,
//! shifted by years/months/weeks/days, and resolved back to an instant with
//! the DST policies. Physical units then run on the absolute tick count. So
//! `"3d"` keeps the local hour across a DST change while `"72h"` does not.

use chrono_tz::Tz;

use crate::calendar::apply_calendar;
use crate::duration::DurationSpec;
use crate::error::Result;
use crate::options::OffsetOptions;
use crate::physical::apply_physical;
use crate::timestamp::Timestamp;

/// Offset one timestamp by `spec`.
///
/// The result has the same resolution and zone as `instant`.
///
/// # Errors
///
/// Returns [`crate::OffsetError::ResolutionOverflow`] or
/// [`crate::OffsetError::OutOfRange`] if the result is not representable, and
/// [`crate::OffsetError::NonexistentLocalTime`] only when the caller opted into
/// [`crate::NonexistentPolicy::Raise`].
///
/// # Examples
///
/// ```
/// use offset_engine::{offset_by, DurationSpec, OffsetOptions, Resolution, Timestamp};
///
/// let options = OffsetOptions::default();
/// let jan31 = Timestamp::parse("2020-01-31", Resolution::Milliseconds, None, &options).unwrap();
/// let spec = DurationSpec::parse("1mo").unwrap();
/// let result = offset_by(jan31, &spec, &options).unwrap();
/// assert_eq!(result.to_string(), "2020-02-29T00:00:00.000");
/// ```
pub fn offset_by(instant: Timestamp, spec: &DurationSpec, options: &OffsetOptions) -> Result<Timestamp> {
    let shifted = if spec.has_calendar() {
        apply_calendar_on_wall_clock(instant, spec, options)?
    } else {
        instant
    };
    apply_physical(shifted, spec)
}

fn apply_calendar_on_wall_clock(
    instant: Timestamp,
    spec: &DurationSpec,
    options: &OffsetOptions,
) -> Result<Timestamp> {
    match instant.time_zone() {
        // UTC has a fixed offset, so it takes the naive path
        Some(tz) if tz != Tz::UTC => {
            let local = instant.to_local_civil()?;
            let target = apply_calendar(local, spec)?;
            Timestamp::from_local_civil(target, instant.resolution(), Some(tz), options)
        }
        _ => {
            let civil = instant.to_utc_civil()?;
            let target = apply_calendar(civil, spec)?;
            Ok(instant.with_ticks(instant.resolution().from_civil(target)?))
        }
    }
}
