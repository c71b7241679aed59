//! Activity model.
//!
//! An activity is one teaching event (lecture, tutorial, lab, exam) to be
//! placed on the slot grid. It belongs to a course, has a kind that governs
//! its allowed start times, serves one students group, and draws rooms and
//! teachers from candidate pools.
//!
//! # Resource pools
//! A pool lists candidate resources and how many of them the activity uses
//! simultaneously. Choosing `count` resources out of the candidates is a
//! k-combination; the activity's alternatives are the Cartesian product of
//! its room and teacher combinations.
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", *Artificial
//! Intelligence Review* 13(2)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::{Rounding, SlotGrid};

/// An activity to be timetabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity label (project-wide).
    pub id: String,
    /// Owning course label.
    #[serde(default)]
    pub course: String,
    /// Activity kind label (governs allowed start times).
    pub kind: String,
    /// Duration in slots.
    pub duration: i64,
    /// Students group attending; `None` for placeholders without students.
    #[serde(default)]
    pub students: Option<String>,
    /// Candidate rooms and required count.
    #[serde(default)]
    pub rooms: ResourcePool,
    /// Candidate teachers and required count.
    #[serde(default)]
    pub teachers: ResourcePool,
    /// Earliest allowed start slot.
    #[serde(default)]
    pub earliest_start: Option<i64>,
    /// Latest allowed start slot.
    #[serde(default)]
    pub latest_start: Option<i64>,
    /// Solved (or previously known) start slot, used as a search hint.
    #[serde(default)]
    pub start: Option<i64>,
    /// Rooms allocated by the last solve.
    #[serde(default)]
    pub allocated_rooms: Vec<String>,
    /// Teachers allocated by the last solve.
    #[serde(default)]
    pub allocated_teachers: Vec<String>,
}

impl Activity {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, duration: i64) -> Self {
        Self {
            id: id.into(),
            course: String::new(),
            kind: kind.into(),
            duration,
            students: None,
            rooms: ResourcePool::default(),
            teachers: ResourcePool::default(),
            earliest_start: None,
            latest_start: None,
            start: None,
            allocated_rooms: Vec::new(),
            allocated_teachers: Vec::new(),
        }
    }

    pub fn with_students(mut self, group: impl Into<String>) -> Self {
        self.students = Some(group.into());
        self
    }

    pub fn with_rooms(mut self, pool: ResourcePool) -> Self {
        self.rooms = pool;
        self
    }

    pub fn with_teachers(mut self, pool: ResourcePool) -> Self {
        self.teachers = pool;
        self
    }

    pub fn with_earliest_start(mut self, slot: i64) -> Self {
        self.earliest_start = Some(slot);
        self
    }

    pub fn with_latest_start(mut self, slot: i64) -> Self {
        self.latest_start = Some(slot);
        self
    }

    /// Earliest start from a datetime, rounded up to the next slot.
    pub fn not_before(mut self, grid: &SlotGrid, dt: NaiveDateTime) -> Self {
        self.earliest_start = Some(grid.datetime_to_slot(dt, Rounding::Ceil));
        self
    }

    /// Latest start from a datetime, rounded down to the previous slot.
    pub fn not_after(mut self, grid: &SlotGrid, dt: NaiveDateTime) -> Self {
        self.latest_start = Some(grid.datetime_to_slot(dt, Rounding::Floor));
        self
    }

    /// Records a known start used as a hint on the next solve.
    pub fn with_start(mut self, slot: i64) -> Self {
        self.start = Some(slot);
        self
    }

    /// Records previously allocated resources used as hints.
    pub fn with_allocation(mut self, rooms: Vec<String>, teachers: Vec<String>) -> Self {
        self.allocated_rooms = rooms;
        self.allocated_teachers = teachers;
        self
    }

    /// End slot of the recorded start, if any.
    pub fn end(&self) -> Option<i64> {
        self.start.map(|s| s + self.duration)
    }

    /// Start window `[lo, hi]` clipped to the grid horizon.
    pub fn start_window(&self, horizon: i64) -> (i64, i64) {
        let lo = self.earliest_start.unwrap_or(0).max(0);
        let hi = self.latest_start.unwrap_or(horizon).min(horizon);
        (lo, hi)
    }

    /// Number of (room combination, teacher combination) alternatives.
    pub fn alternative_count(&self) -> u128 {
        self.rooms
            .combination_count()
            .saturating_mul(self.teachers.combination_count())
    }
}

/// Candidate resources and the number used simultaneously.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Candidate resource labels.
    pub candidates: Vec<String>,
    /// Number of resources used at once.
    pub count: usize,
}

impl ResourcePool {
    pub fn new<I, S>(candidates: I, count: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            count,
        }
    }

    /// Exactly one fixed resource.
    pub fn single(id: impl Into<String>) -> Self {
        Self::new([id.into()], 1)
    }

    /// Any one resource out of `candidates`.
    pub fn one_of<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(candidates, 1)
    }

    /// Whether `count` resources can be drawn from the candidates.
    pub fn is_satisfiable(&self) -> bool {
        self.count <= self.candidates.len()
    }

    /// Binomial coefficient `C(candidates, count)`, saturating.
    pub fn combination_count(&self) -> u128 {
        let n = self.candidates.len() as u128;
        let k = self.count as u128;
        if k > n {
            return 0;
        }
        let k = k.min(n - k);
        (0..k).fold(1u128, |acc, i| acc.saturating_mul(n - i) / (i + 1))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.candidates.iter().any(|c| c == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_activity_builder() {
        let act = Activity::new("MATH501_CM1", "CM", 6)
            .with_students("MECA5")
            .with_rooms(ResourcePool::one_of(["A120", "A121"]))
            .with_teachers(ResourcePool::single("T1"))
            .with_earliest_start(96)
            .with_latest_start(500)
            .with_start(120);

        assert_eq!(act.id, "MATH501_CM1");
        assert_eq!(act.duration, 6);
        assert_eq!(act.students.as_deref(), Some("MECA5"));
        assert_eq!(act.rooms.candidates.len(), 2);
        assert_eq!(act.end(), Some(126));
        assert_eq!(act.start_window(672), (96, 500));
        assert_eq!(act.alternative_count(), 2);
    }

    #[test]
    fn test_start_window_defaults_to_horizon() {
        let act = Activity::new("A", "CM", 4).with_latest_start(10_000);
        assert_eq!(act.start_window(672), (0, 672));
    }

    #[test]
    fn test_datetime_bounds_round_inwards() {
        let origin = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let grid = SlotGrid::with_minutes(origin, 15, 672).unwrap();
        let at = |h, m| NaiveDate::from_ymd_opt(2024, 9, 2).unwrap().and_hms_opt(h, m, 0).unwrap();

        let act = Activity::new("A", "CM", 4)
            .not_before(&grid, at(8, 10))
            .not_after(&grid, at(17, 50));
        assert_eq!(act.earliest_start, Some(33));
        assert_eq!(act.latest_start, Some(71));
    }

    #[test]
    fn test_combination_count() {
        assert_eq!(ResourcePool::new(["a", "b", "c", "d"], 2).combination_count(), 6);
        assert_eq!(ResourcePool::new(["a", "b"], 0).combination_count(), 1);
        assert_eq!(ResourcePool::new(["a"], 2).combination_count(), 0);
        assert_eq!(ResourcePool::default().combination_count(), 1);
        let big: Vec<String> = (0..60).map(|i| format!("r{i}")).collect();
        assert_eq!(ResourcePool::new(big, 30).combination_count(), 118_264_581_564_861_424);
    }

    #[test]
    fn test_pool_satisfiable() {
        assert!(ResourcePool::single("T1").is_satisfiable());
        assert!(!ResourcePool::new(["T1"], 2).is_satisfiable());
        assert!(ResourcePool::one_of(["R1", "R2"]).contains("R2"));
    }

    #[test]
    fn test_serde_defaults() {
        let act: Activity = serde_json::from_str(
            r#"{"id": "TP1", "kind": "TP", "duration": 8,
                "rooms": {"candidates": ["L1", "L2"], "count": 1}}"#,
        )
        .unwrap();
        assert_eq!(act.teachers, ResourcePool::default());
        assert!(act.students.is_none());
        assert_eq!(act.rooms.count, 1);
    }
}
