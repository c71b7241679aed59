//! Activity kinds: which times of day and which weekdays an activity may start.

use serde::{Deserialize, Serialize};

use crate::time::SlotGrid;

/// A category of activities sharing start-time rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityKind {
    /// Kind label.
    pub id: String,
    /// Allowed intra-day start offsets (0 = midnight); empty means any.
    #[serde(default)]
    pub allowed_daily_starts: Vec<i64>,
    /// Forbidden ISO weekdays (1 = Monday .. 7 = Sunday).
    #[serde(default)]
    pub forbidden_weekdays: Vec<u32>,
}

impl ActivityKind {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_daily_starts<I: IntoIterator<Item = i64>>(mut self, starts: I) -> Self {
        self.allowed_daily_starts = starts.into_iter().collect();
        self
    }

    pub fn with_forbidden_weekdays<I: IntoIterator<Item = u32>>(mut self, days: I) -> Self {
        self.forbidden_weekdays = days.into_iter().collect();
        self
    }

    /// Intra-day offsets in `[0, slots_per_day)` that are not allowed.
    pub fn forbidden_daily_starts(&self, slots_per_day: i64) -> Vec<i64> {
        if self.allowed_daily_starts.is_empty() {
            return Vec::new();
        }
        (0..slots_per_day)
            .filter(|s| !self.allowed_daily_starts.contains(s))
            .collect()
    }

    /// Whether `start` satisfies the time-of-day and weekday rules on `grid`.
    pub fn allows_start(&self, grid: &SlotGrid, start: i64) -> bool {
        let week_slot = start - grid.origin_monday_slot();
        let time_of_day = week_slot.rem_euclid(grid.slots_per_day());
        let weekday = week_slot.rem_euclid(grid.slots_per_week()) / grid.slots_per_day() + 1;

        let time_ok = self.allowed_daily_starts.is_empty()
            || self.allowed_daily_starts.contains(&time_of_day);
        let day_ok = !self.forbidden_weekdays.iter().any(|&d| i64::from(d) == weekday);
        time_ok && day_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_forbidden_daily_starts() {
        let kind = ActivityKind::new("CM").with_daily_starts([0, 2]);
        assert_eq!(kind.forbidden_daily_starts(4), vec![1, 3]);
        assert!(ActivityKind::new("free").forbidden_daily_starts(4).is_empty());
    }

    #[test]
    fn test_allows_start_with_wednesday_origin() {
        // Origin on Wednesday 08:00: week-relative offsets must be realigned.
        let origin = NaiveDate::from_ymd_opt(2024, 9, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let grid = SlotGrid::with_minutes(origin, 15, 672).unwrap();
        let kind = ActivityKind::new("CM")
            .with_daily_starts([32, 40, 56])
            .with_forbidden_weekdays([3]);

        // Slot 0 is Wednesday 08:00: right time, forbidden day.
        assert!(!kind.allows_start(&grid, 0));
        // Thursday 10:00.
        assert!(kind.allows_start(&grid, 96 + 8));
        // Thursday 10:15.
        assert!(!kind.allows_start(&grid, 96 + 9));
    }
}
