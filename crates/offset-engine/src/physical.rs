//! Physical duration addition: hours, minutes, seconds and sub-seconds as
//! elapsed absolute time.
//!
//! This is a plain shift of the tick count. It knows nothing about calendars
//! or zones, so it never clamps, but a shift across a DST transition changes
//! the local hour it is read at.

use crate::duration::DurationSpec;
use crate::error::{OffsetError, Result};
use crate::timestamp::Timestamp;

/// Shift `instant` by the physical part of `spec`, keeping its resolution.
///
/// Nanosecond amounts finer than the resolution are truncated toward zero
/// (`1500us` on a millisecond timestamp is one tick).
///
/// # Errors
///
/// Returns [`OffsetError::ResolutionOverflow`] if the shifted tick count does
/// not fit in an `i64`.
///
/// # Examples
///
/// ```
/// use offset_engine::{physical::apply_physical, DurationSpec, Resolution, Timestamp};
///
/// let ts = Timestamp::naive(0, Resolution::Milliseconds);
/// let spec = DurationSpec::parse("-3m").unwrap();
/// assert_eq!(apply_physical(ts, &spec).unwrap().ticks(), -180_000);
/// ```
pub fn apply_physical(instant: Timestamp, spec: &DurationSpec) -> Result<Timestamp> {
    if !spec.has_physical() {
        return Ok(instant);
    }
    let resolution = instant.resolution();
    let delta = resolution.nanos_to_ticks(spec.physical_nanos());
    let ticks = i128::from(instant.ticks()) + delta;
    i64::try_from(ticks)
        .map(|ticks| instant.with_ticks(ticks))
        .map_err(|_| OffsetError::ResolutionOverflow {
            resolution,
            detail: format!("{}{resolution} shifted by {spec}", instant.ticks()),
        })
}
