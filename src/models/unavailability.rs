//! Unavailability windows attached to rooms, teachers and students groups.
//!
//! Two record shapes exist, distinguished by a `kind` tag:
//!
//! - `isocalendar`: explicit ISO year/week/weekday and intra-day slot for
//!   both ends, optionally repeated every `repeat_pad` slots (one week by
//!   default).
//! - `datetime`: start and end datetime strings, optionally repeated every
//!   `offset` (a duration string, `1w` by default).
//!
//! Every repetition is converted and clipped to the horizon on its own; a
//! repetition that falls entirely outside the horizon yields nothing.

use serde::{Deserialize, Serialize};

use crate::time::{parse_datetime, parse_duration, Rounding, SlotGrid, SlotInterval, TimeError};

fn one() -> u32 {
    1
}

fn one_week() -> String {
    "1w".to_string()
}

/// A recurring or one-off unavailability declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailabilityWindow {
    /// ISO calendar coordinates for both ends.
    Isocalendar {
        from_year: i32,
        from_week: u32,
        from_weekday: u32,
        from_dayslot: i64,
        to_year: i32,
        to_week: u32,
        to_weekday: u32,
        to_dayslot: i64,
        /// Number of occurrences.
        #[serde(default = "one")]
        repeat: u32,
        /// Slots between occurrences; one week when absent.
        #[serde(default)]
        repeat_pad: Option<i64>,
        #[serde(default)]
        description: String,
    },
    /// Datetime strings for both ends.
    Datetime {
        start: String,
        end: String,
        /// Number of occurrences.
        #[serde(default = "one")]
        repeat: u32,
        /// Duration string between occurrences.
        #[serde(default = "one_week")]
        offset: String,
        #[serde(default)]
        description: String,
    },
}

impl UnavailabilityWindow {
    /// One-off window between two datetime strings.
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::Datetime {
            start: start.into(),
            end: end.into(),
            repeat: 1,
            offset: one_week(),
            description: String::new(),
        }
    }

    /// Same intra-week window on `weeks` consecutive weeks.
    pub fn weekly(start: impl Into<String>, end: impl Into<String>, weeks: u32) -> Self {
        Self::Datetime {
            start: start.into(),
            end: end.into(),
            repeat: weeks,
            offset: one_week(),
            description: String::new(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Isocalendar { description, .. } | Self::Datetime { description, .. } => {
                description
            }
        }
    }

    /// Slot intervals of every repetition that intersects the horizon.
    ///
    /// Windows are widened to whole slots: starts round down, ends round up.
    pub fn to_slot_intervals(&self, grid: &SlotGrid) -> Result<Vec<SlotInterval>, TimeError> {
        let mut out = Vec::new();
        match self {
            Self::Isocalendar {
                from_year,
                from_week,
                from_weekday,
                from_dayslot,
                to_year,
                to_week,
                to_weekday,
                to_dayslot,
                repeat,
                repeat_pad,
                ..
            } => {
                let from =
                    grid.isocalendar_to_slot(*from_year, *from_week, *from_weekday, *from_dayslot)?;
                let to = grid.isocalendar_to_slot(*to_year, *to_week, *to_weekday, *to_dayslot)?;
                let pad = repeat_pad.unwrap_or_else(|| grid.slots_per_week());
                let overflow =
                    || TimeError::OutOfRange(format!("{repeat} repetitions every {pad} slots"));
                for i in 0..i64::from(*repeat) {
                    let shift = i.checked_mul(pad).ok_or_else(overflow)?;
                    let occurrence = SlotInterval::new(
                        from.checked_add(shift).ok_or_else(overflow)?,
                        to.checked_add(shift).ok_or_else(overflow)?,
                    );
                    if past_horizon(&occurrence, pad.signum(), grid.horizon()) {
                        break;
                    }
                    out.extend(occurrence.clipped(grid.horizon()));
                    if pad == 0 {
                        break;
                    }
                }
            }
            Self::Datetime {
                start,
                end,
                repeat,
                offset,
                ..
            } => {
                let start = parse_datetime(start)?;
                let end = parse_datetime(end)?;
                let step = parse_duration(offset)?;
                let direction = step.num_seconds().signum();
                let overflow =
                    || TimeError::OutOfRange(format!("{repeat} repetitions every '{offset}'"));
                for i in 0..*repeat {
                    let shift = i32::try_from(i)
                        .ok()
                        .and_then(|i| step.checked_mul(i))
                        .ok_or_else(overflow)?;
                    let from = start.checked_add_signed(shift).ok_or_else(overflow)?;
                    let to = end.checked_add_signed(shift).ok_or_else(overflow)?;
                    let occurrence = SlotInterval::new(
                        grid.datetime_to_slot(from, Rounding::Floor),
                        grid.datetime_to_slot(to, Rounding::Ceil),
                    );
                    if past_horizon(&occurrence, direction, grid.horizon()) {
                        break;
                    }
                    out.extend(occurrence.clipped(grid.horizon()));
                    if direction == 0 {
                        break;
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Whether every later repetition moving in `direction` misses the horizon.
fn past_horizon(occurrence: &SlotInterval, direction: i64, horizon: i64) -> bool {
    match direction {
        d if d > 0 => occurrence.start >= horizon,
        d if d < 0 => occurrence.end <= 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn grid(weeks: i64) -> SlotGrid {
        let origin = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        SlotGrid::with_minutes(origin, 15, weeks * 672).unwrap()
    }

    #[test]
    fn test_datetime_window() {
        let w = UnavailabilityWindow::between("2024-W36-2 08:00", "2024-W36-2 12:00");
        let slots = w.to_slot_intervals(&grid(2)).unwrap();
        assert_eq!(slots, vec![SlotInterval::new(96 + 32, 96 + 48)]);
    }

    #[test]
    fn test_datetime_window_widens_to_whole_slots() {
        let w = UnavailabilityWindow::between("02/09/2024 08:05", "02/09/2024 08:50");
        let slots = w.to_slot_intervals(&grid(1)).unwrap();
        assert_eq!(slots, vec![SlotInterval::new(32, 36)]);
    }

    #[test]
    fn test_weekly_repeat_clips_each_occurrence() {
        // Four occurrences but only two weeks of horizon.
        let w = UnavailabilityWindow::weekly("2024-W36-5 14:00", "2024-W36-5 18:00", 4);
        let slots = w.to_slot_intervals(&grid(2)).unwrap();
        assert_eq!(
            slots,
            vec![
                SlotInterval::new(4 * 96 + 56, 4 * 96 + 72),
                SlotInterval::new(672 + 4 * 96 + 56, 672 + 4 * 96 + 72),
            ]
        );
    }

    #[test]
    fn test_isocalendar_window_with_pad() {
        let json = r#"{
            "kind": "isocalendar",
            "from_year": 2024, "from_week": 36, "from_weekday": 1, "from_dayslot": 48,
            "to_year": 2024, "to_week": 36, "to_weekday": 1, "to_dayslot": 52,
            "repeat": 3, "repeat_pad": 96
        }"#;
        let w: UnavailabilityWindow = serde_json::from_str(json).unwrap();
        let slots = w.to_slot_intervals(&grid(1)).unwrap();
        assert_eq!(
            slots,
            vec![
                SlotInterval::new(48, 52),
                SlotInterval::new(144, 148),
                SlotInterval::new(240, 244),
            ]
        );
    }

    #[test]
    fn test_huge_repeat_stops_at_horizon() {
        let w = UnavailabilityWindow::weekly("2024-W36-1 08:00", "2024-W36-1 10:00", 20_000_000);
        let slots = w.to_slot_intervals(&grid(1)).unwrap();
        assert_eq!(slots, vec![SlotInterval::new(32, 40)]);

        let json = r#"{
            "kind": "isocalendar",
            "from_year": 2024, "from_week": 36, "from_weekday": 1, "from_dayslot": 48,
            "to_year": 2024, "to_week": 36, "to_weekday": 1, "to_dayslot": 52,
            "repeat": 4000000000, "repeat_pad": 4000000000000
        }"#;
        let w: UnavailabilityWindow = serde_json::from_str(json).unwrap();
        assert_eq!(w.to_slot_intervals(&grid(1)).unwrap(), vec![SlotInterval::new(48, 52)]);
    }

    #[test]
    fn test_zero_offset_yields_one_occurrence() {
        let w = UnavailabilityWindow::Datetime {
            start: "2024-W36-1 08:00".into(),
            end: "2024-W36-1 10:00".into(),
            repeat: 1_000_000,
            offset: "0m".into(),
            description: String::new(),
        };
        assert_eq!(w.to_slot_intervals(&grid(1)).unwrap(), vec![SlotInterval::new(32, 40)]);
    }

    #[test]
    fn test_window_before_origin_is_dropped() {
        let w = UnavailabilityWindow::between("2024-W35-1 08:00", "2024-W35-1 10:00");
        assert!(w.to_slot_intervals(&grid(1)).unwrap().is_empty());
    }

    #[test]
    fn test_straddling_origin_is_clipped() {
        let w = UnavailabilityWindow::between("2024-W35-7 22:00", "2024-W36-1 02:00");
        let slots = w.to_slot_intervals(&grid(1)).unwrap();
        assert_eq!(slots, vec![SlotInterval::new(0, 8)]);
    }

    #[test]
    fn test_malformed_datetime() {
        let w = UnavailabilityWindow::between("someday", "2024-W36-1 02:00");
        assert!(w.to_slot_intervals(&grid(1)).is_err());
    }

    #[test]
    fn test_serde_tag() {
        let w = UnavailabilityWindow::weekly("2024-W36-1 12:00", "2024-W36-1 13:00", 10);
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"kind\":\"datetime\""));
        let back: UnavailabilityWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
