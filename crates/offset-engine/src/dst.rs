//! DST transition policies for resolving wall-clock values back to instants.
//!
//! A local time can occur zero times (spring-forward gap) or twice (fall-back
//! overlap) in a zone. [`localize`] turns every local time into exactly one
//! instant according to two named rules:
//!
//! - [`NonexistentPolicy::ShiftForward`] (default): a time inside a gap moves
//!   to the first valid instant after the gap, i.e. the transition itself.
//! - [`AmbiguousPolicy::Earliest`] (default): a repeated time takes the
//!   earlier of its two instants (the pre-transition offset).

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::trace;

use crate::error::{OffsetError, Result};

/// How to resolve a local time that occurs twice (fall-back overlap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AmbiguousPolicy {
    /// Take the earlier instant.
    #[default]
    Earliest,
    /// Take the later instant.
    Latest,
}

/// How to resolve a local time that never occurs (spring-forward gap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NonexistentPolicy {
    /// Move to the first valid instant after the gap.
    #[default]
    ShiftForward,
    /// Fail with [`OffsetError::NonexistentLocalTime`].
    Raise,
}

/// Resolve a wall-clock value in `tz` to a single instant.
///
/// # Errors
///
/// Returns [`OffsetError::NonexistentLocalTime`] only for a gap under
/// [`NonexistentPolicy::Raise`], and [`OffsetError::OutOfRange`] if the gap
/// search leaves the representable range.
pub fn localize(
    local: NaiveDateTime,
    tz: &Tz,
    ambiguous: AmbiguousPolicy,
    nonexistent: NonexistentPolicy,
) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, latest) => {
            trace!(%local, zone = tz.name(), ?ambiguous, "resolving ambiguous local time");
            Ok(match ambiguous {
                AmbiguousPolicy::Earliest => earliest,
                AmbiguousPolicy::Latest => latest,
            })
        }
        LocalResult::None => match nonexistent {
            NonexistentPolicy::ShiftForward => {
                let dt = end_of_gap(local, tz)?;
                trace!(%local, zone = tz.name(), resolved = %dt, "shifted nonexistent local time");
                Ok(dt)
            }
            NonexistentPolicy::Raise => Err(OffsetError::NonexistentLocalTime(format!(
                "{local} does not exist in {}",
                tz.name()
            ))),
        },
    }
}

/// Find the transition instant that ends the gap containing `local`.
///
/// The local reading `u + offset(u)` of a UTC instant `u` jumps from below
/// `local` to above it at the transition. Offsets never exceed a day, so the
/// transition lies within one day either side of `local` read as UTC.
/// Transitions fall on whole seconds, so a search at second granularity is
/// exact.
fn end_of_gap(local: NaiveDateTime, tz: &Tz) -> Result<DateTime<Tz>> {
    let out_of_range =
        || OffsetError::OutOfRange(format!("cannot resolve {local} in {}", tz.name()));

    let reads_after = |secs: i64| -> Result<bool> {
        let utc = DateTime::from_timestamp(secs, 0)
            .ok_or_else(out_of_range)?
            .naive_utc();
        let offset = tz.offset_from_utc_datetime(&utc).fix().local_minus_utc();
        let reading = utc
            .checked_add_signed(TimeDelta::seconds(i64::from(offset)))
            .ok_or_else(out_of_range)?;
        Ok(reading > local)
    };

    let anchor = local.and_utc().timestamp();
    let mut lo = anchor - 86_400;
    let mut hi = anchor + 86_400 + 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if reads_after(mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let transition = DateTime::from_timestamp(hi, 0).ok_or_else(out_of_range)?;
    Ok(transition.with_timezone(tz))
}
