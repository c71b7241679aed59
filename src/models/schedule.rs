//! Timetable (solution) model.
//!
//! A timetable places every activity on the slot grid with the rooms and
//! teachers of its chosen alternative. Audits of a timetable produce
//! [`Violation`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Project;

/// A solved timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    /// One placement per activity.
    pub placements: Vec<Placement>,
    /// Objective value reported with the solution, if any.
    pub objective: Option<i64>,
}

/// Where and with what an activity takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Activity label.
    pub activity: String,
    /// Start slot.
    pub start: i64,
    /// End slot (exclusive).
    pub end: i64,
    /// Allocated rooms.
    pub rooms: Vec<String>,
    /// Allocated teachers.
    pub teachers: Vec<String>,
}

impl Placement {
    pub fn new(activity: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            activity: activity.into(),
            start,
            end,
            rooms: Vec::new(),
            teachers: Vec::new(),
        }
    }

    pub fn with_rooms(mut self, rooms: Vec<String>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_teachers(mut self, teachers: Vec<String>) -> Self {
        self.teachers = teachers;
        self
    }

    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    pub fn uses_room(&self, room: &str) -> bool {
        self.rooms.iter().any(|r| r == room)
    }

    pub fn uses_teacher(&self, teacher: &str) -> bool {
        self.teachers.iter().any(|t| t == teacher)
    }
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_placement(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    pub fn placement(&self, activity: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.activity == activity)
    }

    pub fn placements_for_room(&self, room: &str) -> Vec<&Placement> {
        self.placements.iter().filter(|p| p.uses_room(room)).collect()
    }

    pub fn placements_for_teacher(&self, teacher: &str) -> Vec<&Placement> {
        self.placements.iter().filter(|p| p.uses_teacher(teacher)).collect()
    }

    /// Latest end slot across all placements.
    pub fn makespan(&self) -> i64 {
        self.placements.iter().map(|p| p.end).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Writes start and allocated resources back onto the project's
    /// activities. Returns the number of activities updated.
    pub fn apply_to(&self, project: &mut Project) -> usize {
        let by_id: HashMap<&str, &Placement> = self
            .placements
            .iter()
            .map(|p| (p.activity.as_str(), p))
            .collect();
        let mut updated = 0;
        for activity in project.activities_mut() {
            if let Some(p) = by_id.get(activity.id.as_str()) {
                activity.start = Some(p.start);
                activity.allocated_rooms = p.rooms.clone();
                activity.allocated_teachers = p.teachers.clone();
                updated += 1;
            }
        }
        updated
    }
}

/// A problem found when auditing a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (activity, room, teacher or student).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of timetable violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two occupations of one resource share a slot.
    Overlap,
    /// Placement intersects a declared unavailability window.
    Unavailable,
    /// Student-bearing placement intersects closed hours of the week.
    OutsideOpeningHours,
    /// A starts-after constraint is not met.
    Precedence,
    /// Start outside the activity's window or the horizon.
    OutOfBounds,
    /// Start not among the kind's allowed times of day.
    ForbiddenStartTime,
    /// Start on a weekday forbidden by the kind.
    ForbiddenWeekday,
    /// Allocated resources do not form a valid alternative.
    AllocationMismatch,
    /// Activity has no placement.
    MissingPlacement,
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        severity: i32,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn overlap(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::Overlap, resource, message, 100)
    }

    pub fn unavailable(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::Unavailable, resource, message, 90)
    }

    pub fn outside_opening_hours(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::OutsideOpeningHours, activity, message, 80)
    }

    pub fn precedence(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::Precedence, activity, message, 95)
    }

    pub fn out_of_bounds(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::OutOfBounds, activity, message, 90)
    }

    pub fn forbidden_start_time(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::ForbiddenStartTime, activity, message, 70)
    }

    pub fn forbidden_weekday(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::ForbiddenWeekday, activity, message, 70)
    }

    pub fn allocation_mismatch(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::AllocationMismatch, activity, message, 85)
    }

    pub fn missing_placement(activity: impl Into<String>) -> Self {
        Self::new(ViolationType::MissingPlacement, activity, "activity has no placement", 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectSetup;
    use crate::models::{Activity, Course};
    use chrono::NaiveDate;

    fn sample_timetable() -> Timetable {
        let mut t = Timetable::new();
        t.add_placement(
            Placement::new("A1", 0, 4)
                .with_rooms(vec!["R1".into()])
                .with_teachers(vec!["T1".into()]),
        );
        t.add_placement(
            Placement::new("A2", 4, 10)
                .with_rooms(vec!["R2".into()])
                .with_teachers(vec!["T1".into()]),
        );
        t.add_placement(Placement::new("A3", 8, 12).with_rooms(vec!["R1".into()]));
        t
    }

    #[test]
    fn test_makespan_and_lookup() {
        let t = sample_timetable();
        assert_eq!(t.makespan(), 12);
        assert_eq!(t.len(), 3);
        assert_eq!(t.placement("A2").map(Placement::duration), Some(6));
        assert!(t.placement("A9").is_none());
        assert!(Timetable::new().is_empty());
        assert_eq!(Timetable::new().makespan(), 0);
    }

    #[test]
    fn test_placements_by_resource() {
        let t = sample_timetable();
        assert_eq!(t.placements_for_room("R1").len(), 2);
        assert_eq!(t.placements_for_teacher("T1").len(), 2);
        assert!(t.placements_for_teacher("T2").is_empty());
    }

    #[test]
    fn test_apply_to_project() {
        let origin = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut project = Project::new(ProjectSetup::new(origin, 672)).with_course(
            Course::new("C")
                .with_activity(Activity::new("A1", "CM", 4))
                .with_activity(Activity::new("A4", "CM", 4)),
        );

        let updated = sample_timetable().apply_to(&mut project);
        assert_eq!(updated, 1);

        let a1 = project.activity("A1").unwrap();
        assert_eq!(a1.start, Some(0));
        assert_eq!(a1.allocated_rooms, vec!["R1"]);
        assert_eq!(a1.allocated_teachers, vec!["T1"]);
        assert_eq!(project.activity("A4").unwrap().start, None);
    }

    #[test]
    fn test_violation_factories() {
        let v = Violation::overlap("R1", "A1 and A3 overlap");
        assert_eq!(v.violation_type, ViolationType::Overlap);
        assert_eq!(v.entity_id, "R1");
        assert_eq!(v.severity, 100);

        let v = Violation::precedence("B", "starts too early");
        assert_eq!(v.violation_type, ViolationType::Precedence);

        let v = Violation::missing_placement("A9");
        assert_eq!(v.violation_type, ViolationType::MissingPlacement);
        assert_eq!(v.entity_id, "A9");
    }
}
