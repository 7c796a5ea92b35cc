//! Caller-facing configuration for offset operations.

use serde::Serialize;

use crate::dst::{AmbiguousPolicy, NonexistentPolicy};

/// What to do with an element whose result leaves the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OverflowPolicy {
    /// Fail the whole column computation.
    #[default]
    Fail,
    /// Clamp to `i64::MIN` / `i64::MAX` ticks in the direction of the offset.
    Saturate,
    /// Replace the element with null.
    Null,
}

/// Options for [`crate::offset_by`] and the column operations.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OffsetOptions {
    /// Handling of out-of-range results.
    pub overflow: OverflowPolicy,
    /// Resolution of repeated local times after calendar arithmetic.
    pub ambiguous: AmbiguousPolicy,
    /// Resolution of skipped local times after calendar arithmetic.
    pub nonexistent: NonexistentPolicy,
}
