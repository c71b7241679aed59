//! Timetable quality metrics (KPIs).
//!
//! Computes workload indicators from a solved timetable and its project.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Weekly load | Slots attended by an atomic student per week of the horizon |
//! | Mean week load | Student total / number of weeks (integer division) |
//! | Residual | Sum over weeks of \|weekly load - mean\| |
//! | Room/teacher busy | Slots during which a room or teacher is allocated |
//! | Utilization | Busy slots / horizon |
//!
//! The total residual is the quantity minimized by the load-balance
//! objective, so a solver's reported objective can be cross-checked here.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Project, Timetable};

/// Load of one atomic student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentLoad {
    /// Slots attended per week, `max_weeks` entries.
    pub weekly: Vec<i64>,
    /// Total attended slots, including any week past the horizon.
    pub total: i64,
    /// `total / max_weeks`.
    pub mean: i64,
    /// Sum of absolute deviations from `mean`.
    pub residual: i64,
}

/// Timetable performance indicators.
///
/// All durations are in slots.
#[derive(Debug, Clone)]
pub struct LoadBalanceKpi {
    /// Per atomic student, for students attending at least one activity.
    pub students: BTreeMap<String, StudentLoad>,
    /// Sum of student residuals.
    pub total_residual: i64,
    /// Largest single-student residual.
    pub max_residual: i64,
    /// Busy slots per allocated room.
    pub room_busy: BTreeMap<String, i64>,
    /// Busy slots per allocated teacher.
    pub teacher_busy: BTreeMap<String, i64>,
    /// Mean busy fraction of allocated rooms and teachers (0.0..1.0).
    pub avg_utilization: f64,
}

impl LoadBalanceKpi {
    /// Computes KPIs from a timetable and the project it solves.
    ///
    /// Placements of unknown activities count for rooms and teachers but
    /// not for students.
    pub fn calculate(project: &Project, timetable: &Timetable) -> Result<Self> {
        let grid = project.setup.grid()?;
        let max_weeks = grid.max_weeks();
        let horizon = grid.horizon();

        let mut students: BTreeMap<String, StudentLoad> = BTreeMap::new();
        let mut room_busy: BTreeMap<String, i64> = BTreeMap::new();
        let mut teacher_busy: BTreeMap<String, i64> = BTreeMap::new();

        for placement in &timetable.placements {
            let duration = placement.duration();
            for room in &placement.rooms {
                *room_busy.entry(room.clone()).or_insert(0) += duration;
            }
            for teacher in &placement.teachers {
                *teacher_busy.entry(teacher.clone()).or_insert(0) += duration;
            }

            let attendees = project
                .activity(&placement.activity)
                .and_then(|a| a.students.as_deref())
                .and_then(|group| project.atomic_students_of(group))
                .unwrap_or(&[]);
            let week = grid.week_of(placement.start);
            for student in attendees {
                let load = students.entry(student.clone()).or_insert_with(|| StudentLoad {
                    weekly: vec![0; max_weeks.max(0) as usize],
                    total: 0,
                    mean: 0,
                    residual: 0,
                });
                load.total += duration;
                if (0..max_weeks).contains(&week) {
                    load.weekly[week as usize] += duration;
                }
            }
        }

        for load in students.values_mut() {
            load.mean = if max_weeks > 0 { load.total / max_weeks } else { 0 };
            load.residual = load.weekly.iter().map(|w| (w - load.mean).abs()).sum();
        }
        let total_residual = students.values().map(|l| l.residual).sum();
        let max_residual = students.values().map(|l| l.residual).max().unwrap_or(0);

        let busy: Vec<i64> = room_busy.values().chain(teacher_busy.values()).copied().collect();
        let avg_utilization = if busy.is_empty() || horizon == 0 {
            0.0
        } else {
            busy.iter().map(|&b| b as f64 / horizon as f64).sum::<f64>() / busy.len() as f64
        };

        Ok(Self {
            students,
            total_residual,
            max_residual,
            room_busy,
            teacher_busy,
            avg_utilization,
        })
    }

    /// Busy fraction of a room or teacher over `horizon`.
    pub fn utilization(&self, resource: &str, horizon: i64) -> f64 {
        let busy = self
            .room_busy
            .get(resource)
            .or_else(|| self.teacher_busy.get(resource))
            .copied()
            .unwrap_or(0);
        if horizon == 0 {
            0.0
        } else {
            busy as f64 / horizon as f64
        }
    }

    /// Whether every student's residual is within `max_residual`.
    pub fn meets_threshold(&self, max_residual: i64) -> bool {
        self.max_residual <= max_residual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectSetup;
    use crate::models::{Activity, Course, Placement, StudentsGroup};
    use chrono::NaiveDate;

    fn project() -> Project {
        let origin = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Project::new(ProjectSetup::new(origin, 2 * 672))
            .with_students_group(StudentsGroup::new("ALL", ["S1", "S2"]))
            .with_students_group(StudentsGroup::atomic("S3"))
            .with_course(
                Course::new("C")
                    .with_activity(Activity::new("A", "CM", 4).with_students("ALL"))
                    .with_activity(Activity::new("B", "CM", 4).with_students("ALL"))
                    .with_activity(Activity::new("C", "CM", 8).with_students("S3")),
            )
    }

    fn placement(id: &str, start: i64, duration: i64, room: &str, teacher: &str) -> Placement {
        Placement::new(id, start, start + duration)
            .with_rooms(vec![room.into()])
            .with_teachers(vec![teacher.into()])
    }

    #[test]
    fn test_balanced_weeks() {
        let mut timetable = Timetable::new();
        timetable.add_placement(placement("A", 0, 4, "R1", "T1"));
        timetable.add_placement(placement("B", 672, 4, "R1", "T1"));

        let kpi = LoadBalanceKpi::calculate(&project(), &timetable).unwrap();
        let s1 = &kpi.students["S1"];
        assert_eq!(s1.weekly, vec![4, 4]);
        assert_eq!(s1.mean, 4);
        assert_eq!(s1.residual, 0);
        assert_eq!(kpi.total_residual, 0);
        assert!(!kpi.students.contains_key("S3"));
    }

    #[test]
    fn test_unbalanced_weeks() {
        let mut timetable = Timetable::new();
        timetable.add_placement(placement("A", 0, 4, "R1", "T1"));
        timetable.add_placement(placement("B", 100, 4, "R2", "T1"));
        timetable.add_placement(placement("C", 700, 8, "R2", "T2"));

        let kpi = LoadBalanceKpi::calculate(&project(), &timetable).unwrap();
        // S1 and S2: [8, 0], mean 4, residual 8. S3: [0, 8], residual 8.
        assert_eq!(kpi.students["S2"].weekly, vec![8, 0]);
        assert_eq!(kpi.students["S1"].residual, 8);
        assert_eq!(kpi.students["S3"].residual, 8);
        assert_eq!(kpi.total_residual, 24);
        assert_eq!(kpi.max_residual, 8);
        assert!(kpi.meets_threshold(8));
        assert!(!kpi.meets_threshold(7));
    }

    #[test]
    fn test_resource_busy() {
        let mut timetable = Timetable::new();
        timetable.add_placement(placement("A", 0, 4, "R1", "T1"));
        timetable.add_placement(placement("B", 8, 4, "R1", "T2"));

        let kpi = LoadBalanceKpi::calculate(&project(), &timetable).unwrap();
        assert_eq!(kpi.room_busy["R1"], 8);
        assert_eq!(kpi.teacher_busy["T2"], 4);
        assert!((kpi.utilization("R1", 1344) - 8.0 / 1344.0).abs() < 1e-12);
        assert!((kpi.utilization("T1", 1344) - 4.0 / 1344.0).abs() < 1e-12);
        assert_eq!(kpi.utilization("R9", 1344), 0.0);
        // (8 + 4 + 4) / 3 / 1344
        assert!((kpi.avg_utilization - 16.0 / 3.0 / 1344.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_timetable() {
        let kpi = LoadBalanceKpi::calculate(&project(), &Timetable::new()).unwrap();
        assert!(kpi.students.is_empty());
        assert_eq!(kpi.total_residual, 0);
        assert_eq!(kpi.avg_utilization, 0.0);
    }
}
