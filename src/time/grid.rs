//! Slot grid: bidirectional mapping between wall-clock time and slots.

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::{iso_date, TimeError};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Rounding applied when a datetime falls inside a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round towards the earlier slot.
    #[default]
    Floor,
    /// Round towards the later slot.
    Ceil,
}

/// Converts a datetime into a slot index relative to `origin`.
///
/// `slot_duration` must be positive; [`SlotGrid`] guarantees this for
/// every grid it builds.
pub fn datetime_to_slot(
    dt: NaiveDateTime,
    origin: NaiveDateTime,
    slot_duration: TimeDelta,
    rounding: Rounding,
) -> i64 {
    divide((dt - origin).num_milliseconds(), slot_duration, rounding)
}

/// Converts a slot index back into the datetime at which the slot starts.
pub fn slot_to_datetime(
    slot: i64,
    origin: NaiveDateTime,
    slot_duration: TimeDelta,
) -> NaiveDateTime {
    origin + TimeDelta::milliseconds(slot_duration.num_milliseconds() * slot)
}

fn divide(elapsed_ms: i64, slot_duration: TimeDelta, rounding: Rounding) -> i64 {
    let slot_ms = slot_duration.num_milliseconds().max(1);
    match rounding {
        Rounding::Floor => elapsed_ms.div_euclid(slot_ms),
        Rounding::Ceil => -(-elapsed_ms).div_euclid(slot_ms),
    }
}

fn monday_of(dt: NaiveDateTime) -> NaiveDateTime {
    let date = dt.date();
    let back = i64::from(date.weekday().num_days_from_monday());
    (date - TimeDelta::days(back)).and_time(NaiveTime::MIN)
}

/// A fixed-width slot calendar anchored at an origin instant.
///
/// # Invariants
/// - `slot_duration` is positive and divides 24 hours exactly.
/// - `horizon >= 0`; schedulable quantities live in `[0, horizon]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    origin: NaiveDateTime,
    slot_duration: TimeDelta,
    horizon: i64,
    slots_per_day: i64,
}

impl SlotGrid {
    /// Creates a grid, rejecting slot durations that do not tile a day.
    pub fn new(
        origin: NaiveDateTime,
        slot_duration: TimeDelta,
        horizon: i64,
    ) -> Result<Self, TimeError> {
        let slot_ms = slot_duration.num_milliseconds();
        if slot_ms <= 0 || DAY_MS % slot_ms != 0 {
            return Err(TimeError::InvalidSlotDuration(slot_duration.num_seconds()));
        }
        Ok(Self {
            origin,
            slot_duration,
            horizon: horizon.max(0),
            slots_per_day: DAY_MS / slot_ms,
        })
    }

    /// Creates a grid with a slot duration given in minutes.
    pub fn with_minutes(
        origin: NaiveDateTime,
        minutes: i64,
        horizon: i64,
    ) -> Result<Self, TimeError> {
        Self::new(origin, TimeDelta::minutes(minutes), horizon)
    }

    /// Origin instant (slot 0).
    pub fn origin(&self) -> NaiveDateTime {
        self.origin
    }

    /// Duration of one slot.
    pub fn slot_duration(&self) -> TimeDelta {
        self.slot_duration
    }

    /// Number of slots in the planning window.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    #[inline]
    pub fn slots_per_day(&self) -> i64 {
        self.slots_per_day
    }

    #[inline]
    pub fn slots_per_week(&self) -> i64 {
        7 * self.slots_per_day
    }

    /// Slot index of `dt`, rounded as requested.
    pub fn datetime_to_slot(&self, dt: NaiveDateTime, rounding: Rounding) -> i64 {
        datetime_to_slot(dt, self.origin, self.slot_duration, rounding)
    }

    /// Start instant of `slot`.
    pub fn slot_to_datetime(&self, slot: i64) -> NaiveDateTime {
        slot_to_datetime(slot, self.origin, self.slot_duration)
    }

    /// Number of slots covering `duration`, rounded as requested.
    pub fn duration_to_slots(&self, duration: TimeDelta, rounding: Rounding) -> i64 {
        divide(duration.num_milliseconds(), self.slot_duration, rounding)
    }

    /// Real-world duration of `slots` slots.
    pub fn slots_to_duration(&self, slots: i64) -> TimeDelta {
        TimeDelta::milliseconds(self.slot_duration.num_milliseconds() * slots)
    }

    /// Instant at which the horizon ends.
    pub fn horizon_datetime(&self) -> NaiveDateTime {
        self.slot_to_datetime(self.horizon)
    }

    /// Monday 00:00 of the origin's ISO week.
    pub fn origin_monday(&self) -> NaiveDateTime {
        monday_of(self.origin)
    }

    /// Slot of [`Self::origin_monday`]; never positive.
    pub fn origin_monday_slot(&self) -> i64 {
        self.datetime_to_slot(self.origin_monday(), Rounding::Floor)
    }

    /// Number of ISO weeks touched by the horizon.
    ///
    /// Counted from the origin's Monday up to the Monday of the week that
    /// contains the last slot of the horizon, inclusive.
    pub fn max_weeks(&self) -> i64 {
        let last = self.slot_to_datetime((self.horizon - 1).max(0));
        (monday_of(last) - self.origin_monday()).num_days() / 7 + 1
    }

    /// Week index of `slot`, counted from the origin's Monday.
    pub fn week_of(&self, slot: i64) -> i64 {
        (slot - self.origin_monday_slot()).div_euclid(self.slots_per_week())
    }

    /// Slot of an ISO calendar date at midnight, plus `day_slot`.
    pub fn isocalendar_to_slot(
        &self,
        year: i32,
        week: u32,
        weekday: u32,
        day_slot: i64,
    ) -> Result<i64, TimeError> {
        let midnight = iso_date(year, week, weekday)?.and_time(NaiveTime::MIN);
        Ok(self.datetime_to_slot(midnight, Rounding::Floor) + day_slot)
    }

    /// Clamps `slot` into `[0, horizon]`.
    #[inline]
    pub fn clip(&self, slot: i64) -> i64 {
        slot.clamp(0, self.horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn monday_grid(weeks: i64) -> SlotGrid {
        // 2024-09-02 is a Monday.
        SlotGrid::with_minutes(at(2024, 9, 2, 0, 0), 15, weeks * 672).unwrap()
    }

    #[test]
    fn test_rounding_modes() {
        let origin = at(2024, 9, 2, 0, 0);
        let slot = TimeDelta::minutes(15);
        let dt = at(2024, 9, 2, 8, 10);
        assert_eq!(datetime_to_slot(dt, origin, slot, Rounding::Floor), 32);
        assert_eq!(datetime_to_slot(dt, origin, slot, Rounding::Ceil), 33);

        let exact = at(2024, 9, 2, 8, 0);
        assert_eq!(datetime_to_slot(exact, origin, slot, Rounding::Floor), 32);
        assert_eq!(datetime_to_slot(exact, origin, slot, Rounding::Ceil), 32);
    }

    #[test]
    fn test_rounding_before_origin() {
        let origin = at(2024, 9, 2, 0, 0);
        let slot = TimeDelta::minutes(15);
        let dt = at(2024, 9, 1, 23, 50);
        assert_eq!(datetime_to_slot(dt, origin, slot, Rounding::Floor), -1);
        assert_eq!(datetime_to_slot(dt, origin, slot, Rounding::Ceil), 0);
    }

    #[test]
    fn test_rejects_bad_slot_duration() {
        let origin = at(2024, 9, 2, 0, 0);
        assert!(SlotGrid::with_minutes(origin, 0, 10).is_err());
        assert!(SlotGrid::with_minutes(origin, 7, 10).is_err());
        assert!(SlotGrid::with_minutes(origin, 30, 10).is_ok());
    }

    #[test]
    fn test_slots_per_day_and_week() {
        let grid = monday_grid(1);
        assert_eq!(grid.slots_per_day(), 96);
        assert_eq!(grid.slots_per_week(), 672);
    }

    #[test]
    fn test_origin_monday_slot() {
        let grid = monday_grid(1);
        assert_eq!(grid.origin_monday_slot(), 0);

        // Wednesday 08:00 origin: Monday 00:00 is 2 days and 8 hours earlier.
        let grid = SlotGrid::with_minutes(at(2024, 9, 4, 8, 0), 15, 672).unwrap();
        assert_eq!(grid.origin_monday_slot(), -(2 * 96 + 32));
        assert_eq!(grid.origin_monday(), at(2024, 9, 2, 0, 0));
    }

    #[test]
    fn test_max_weeks() {
        assert_eq!(monday_grid(1).max_weeks(), 1);
        assert_eq!(monday_grid(12).max_weeks(), 12);

        // Starting on a Wednesday, one week of slots spans two ISO weeks.
        let grid = SlotGrid::with_minutes(at(2024, 9, 4, 0, 0), 15, 672).unwrap();
        assert_eq!(grid.max_weeks(), 2);
    }

    #[test]
    fn test_week_of() {
        let grid = monday_grid(3);
        assert_eq!(grid.week_of(0), 0);
        assert_eq!(grid.week_of(671), 0);
        assert_eq!(grid.week_of(672), 1);
        assert_eq!(grid.week_of(2015), 2);
    }

    #[test]
    fn test_isocalendar_to_slot() {
        let grid = monday_grid(4);
        // 2024-W36-1 is 2024-09-02, the origin.
        assert_eq!(grid.isocalendar_to_slot(2024, 36, 1, 0).unwrap(), 0);
        assert_eq!(grid.isocalendar_to_slot(2024, 37, 3, 48).unwrap(), 672 + 2 * 96 + 48);
        assert!(grid.isocalendar_to_slot(2024, 60, 1, 0).is_err());
    }

    #[test]
    fn test_duration_conversion() {
        let grid = monday_grid(1);
        assert_eq!(grid.duration_to_slots(TimeDelta::minutes(90), Rounding::Floor), 6);
        assert_eq!(grid.duration_to_slots(TimeDelta::minutes(100), Rounding::Ceil), 7);
        assert_eq!(grid.slots_to_duration(6), TimeDelta::minutes(90));
    }

    #[test]
    fn test_clip() {
        let grid = monday_grid(1);
        assert_eq!(grid.clip(-5), 0);
        assert_eq!(grid.clip(100), 100);
        assert_eq!(grid.clip(10_000), 672);
    }

    #[test]
    fn test_round_trip_random_slots() {
        let mut rng = StdRng::seed_from_u64(7);
        for minutes in [5, 10, 15, 30, 60] {
            let grid = SlotGrid::with_minutes(at(2024, 9, 4, 13, 0), minutes, 20_000).unwrap();
            for _ in 0..200 {
                let slot = rng.random_range(0..=grid.horizon());
                let dt = grid.slot_to_datetime(slot);
                assert_eq!(grid.datetime_to_slot(dt, Rounding::Floor), slot);
                assert_eq!(grid.datetime_to_slot(dt, Rounding::Ceil), slot);
            }
        }
    }
}
