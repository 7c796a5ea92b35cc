//! # offset-engine
//!
//! Calendar- and time-zone-aware offsetting of timestamps.
//!
//! A duration such as `"1mo2d3h"` has two halves. Calendar units (years,
//! months, weeks, days) are applied on the wall clock, with the day-of-month
//! clamped to the target month. Physical units (hours down to nanoseconds)
//! are applied as elapsed absolute time. Every result keeps the input's
//! resolution and time zone.
//!
//! ## Modules
//!
//! - [`duration`] — duration text → [`DurationSpec`]
//! - [`calendar`] — month clamping, leap years, day arithmetic on civil date/times
//! - [`physical`] — exact, resolution-preserving shifts of tick counts
//! - [`dst`] — gap/overlap resolution policies for local times
//! - [`compose`] — wall-clock calendar step + absolute physical step for one value
//! - [`column`] — broadcast over nullable date/datetime columns
//! - [`timestamp`] — [`Timestamp`] value, parsing and formatting
//! - [`resolution`] — ms/us/ns ticks ↔ civil date/times
//! - [`options`] — [`OffsetOptions`] configuration
//! - [`error`] — Error types

pub mod calendar;
pub mod column;
pub mod compose;
pub mod dst;
pub mod duration;
pub mod error;
pub mod options;
pub mod physical;
pub mod resolution;
pub mod timestamp;

pub use calendar::{apply_calendar, days_in_month, is_leap_year, CivilDateTime};
pub use column::{offset_scalar, DateColumn, DatetimeColumn, TemporalColumn};
pub use compose::offset_by;
pub use dst::{localize, AmbiguousPolicy, NonexistentPolicy};
pub use duration::{DurationSpec, Sign};
pub use error::{OffsetError, Result};
pub use options::{OffsetOptions, OverflowPolicy};
pub use physical::apply_physical;
pub use resolution::Resolution;
pub use timestamp::{parse_time_zone, Timestamp};
