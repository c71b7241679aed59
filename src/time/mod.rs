//! Temporal model: the discrete slot calendar every other layer works on.
//!
//! A project fixes an origin instant and a slot duration (15 minutes by
//! default). Slot 0 is the origin; slot `s` starts at `origin + s * slot`.
//! The solver only ever sees slot integers, so every boundary crossing from
//! wall-clock time goes through [`SlotGrid::datetime_to_slot`] with an
//! explicit [`Rounding`].
//!
//! # Week alignment
//! Week-relative quantities (time of day, weekday, week index) are computed
//! from the Monday 00:00 of the origin's ISO week, whose slot
//! [`SlotGrid::origin_monday_slot`] is zero or negative.

mod calendar;
mod grid;
mod parse;
mod week;

pub use calendar::{Calendar, SlotInterval};
pub use grid::{datetime_to_slot, slot_to_datetime, Rounding, SlotGrid};
pub use parse::{format_isocalendar, iso_date, parse_datetime, parse_duration};
pub use week::WeekStructure;

use thiserror::Error;

/// Errors raised by the temporal model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// A datetime string matched none of the accepted formats.
    #[error("invalid datetime '{0}'")]
    InvalidDateTime(String),

    /// A duration string such as `1w-2d-3h-15m` could not be parsed.
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    /// The year/week/weekday triple does not name a real ISO date.
    #[error("invalid ISO week date {year}-W{week:02}-{weekday}")]
    InvalidIsoDate {
        /// ISO year.
        year: i32,
        /// ISO week number.
        week: u32,
        /// ISO weekday (1 = Monday).
        weekday: u32,
    },

    /// Slot duration is not positive or does not divide 24 hours.
    #[error("slot duration of {0} s must be positive and divide one day")]
    InvalidSlotDuration(i64),

    /// Week-structure rows are malformed.
    #[error("invalid week structure: {0}")]
    InvalidWeekStructure(String),

    /// A shifted repetition left the representable date range.
    #[error("repetition out of range: {0}")]
    OutOfRange(String),
}
