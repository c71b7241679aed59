//! CP formulation of a timetabling project.
//!
//! Translates a [`Project`] into a [`CpModel`] in a single pass:
//!
//! 1. Unavailability windows, static activities and the weekly structure
//!    become fixed intervals ([`availability`]).
//! 2. Every activity gets start/end variables and one optional interval per
//!    resource alternative ([`activities`], [`alternatives`]).
//! 3. Precedence, start-time rules and no-overlap are wired over the
//!    collected interval maps ([`assembler`]).
//! 4. Optionally, the weekly load-balance cost is minimized ([`objective`]).
//!
//! The interval maps are owned by the builder for the duration of a build;
//! nothing is shared between builds, so encoding the same project twice
//! yields structurally identical models.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

pub mod activities;
pub mod alternatives;
pub mod assembler;
pub mod availability;
pub mod objective;

use std::collections::HashMap;

use tracing::info;

pub use activities::{ActivityVars, AlternativeVars};
pub use alternatives::{Alternative, ALTERNATIVES_SOFT_CAP};
pub use availability::{IntervalMap, IntervalOwner};
pub use objective::LoadBalanceVars;

use crate::config::BuildOptions;
use crate::cp::{CpModel, CpSolution, ModelStats};
use crate::error::{Result, TimetableError};
use crate::models::{Placement, Project, Timetable};
use crate::time::SlotGrid;

/// Builds a CP model from a timetabling project.
///
/// # Example
/// ```no_run
/// use u_timetable::encoding::TimetableCpBuilder;
/// use u_timetable::models::Project;
///
/// let project = Project::from_yaml_file("project.yaml").unwrap();
/// let built = TimetableCpBuilder::new(&project).build().unwrap();
/// println!("{:?}", built.model.stats());
/// ```
pub struct TimetableCpBuilder<'a> {
    project: &'a Project,
    options: BuildOptions,
}

impl<'a> TimetableCpBuilder<'a> {
    /// Creates a builder with default options.
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the model.
    ///
    /// Fails before any solver call on an invalid setup, pools that cannot
    /// supply their count, unresolvable group or kind references, and
    /// malformed temporal data.
    pub fn build(&self) -> Result<TimetableModel> {
        let project = self.project;
        let setup = &project.setup;
        setup.validate()?;
        let grid = setup.grid()?;
        let week = setup.week_structure(&grid);
        let mut model = CpModel::new();

        let unavailable = availability::encode_unavailability(&mut model, project, &grid)?;
        let statics = availability::encode_static_activities(&mut model, project, &grid)?;
        let weekly = availability::encode_weekly(&mut model, &week, &grid);

        let mut dynamic = IntervalMap::new();
        let mut vars = Vec::with_capacity(project.activity_count());
        for activity in project.activities() {
            let students: &[String] = match &activity.students {
                Some(group) => project
                    .atomic_students_of(group)
                    .ok_or_else(|| TimetableError::UnknownStudentsGroup {
                        owner: activity.id.clone(),
                        group: group.clone(),
                    })?,
                None => &[],
            };
            vars.push(activities::encode_activity(
                &mut model,
                activity,
                students,
                grid.horizon(),
                self.options.max_alternatives,
                &mut dynamic,
            )?);
        }

        let index: HashMap<&str, &ActivityVars> =
            vars.iter().map(|v| (v.id.as_str(), v)).collect();
        let factor = setup.succession_relaxation_factor;
        assembler::add_precedences(&mut model, project, &index, factor)?;
        let placed = project.activities().zip(&vars);
        assembler::add_kind_restrictions(&mut model, project, &grid, placed)?;
        assembler::add_no_overlaps(&mut model, &dynamic, &unavailable);
        assembler::add_static_overlaps(&mut model, &dynamic, &statics);
        assembler::add_weekly_overlaps(&mut model, &dynamic, &weekly);

        let objective = if self.options.with_objective {
            objective::add_load_balance(&mut model, &grid, &vars)
        } else {
            None
        };

        let stats = model.stats();
        let alternatives: usize = vars.iter().map(|v| v.alternatives.len()).sum();
        info!(
            event = "model_built",
            activities = vars.len(),
            alternatives,
            variables = stats.variables,
            constraints = stats.constraints,
            intervals = stats.intervals,
            objective = objective.is_some(),
        );

        Ok(TimetableModel {
            model,
            grid,
            activities: vars,
            objective,
        })
    }
}

/// A built model together with the handles needed to read a solution.
#[derive(Debug, Clone)]
pub struct TimetableModel {
    pub model: CpModel,
    pub grid: SlotGrid,
    /// Variables per activity, in project order.
    pub activities: Vec<ActivityVars>,
    /// Load-balance handles, when the objective was requested and some
    /// activity has students.
    pub objective: Option<LoadBalanceVars>,
}

impl TimetableModel {
    pub fn stats(&self) -> ModelStats {
        self.model.stats()
    }

    pub fn activity(&self, id: &str) -> Option<&ActivityVars> {
        self.activities.iter().find(|v| v.id == id)
    }

    /// Reads start and chosen alternative of every activity.
    ///
    /// Fails with [`TimetableError::InconsistentSolution`] when the answer
    /// carries no values or when an activity does not have exactly one
    /// present alternative.
    pub fn decode_solution(&self, solution: &CpSolution) -> Result<Timetable> {
        if solution.values.len() != self.model.num_variables() {
            return Err(TimetableError::InconsistentSolution {
                activity: self.activities.first().map(|v| v.id.clone()).unwrap_or_default(),
                reason: format!(
                    "expected {} values, got {}",
                    self.model.num_variables(),
                    solution.values.len()
                ),
            });
        }

        let mut timetable = Timetable::new();
        for vars in &self.activities {
            let mut chosen = vars.alternatives.iter().filter(|a| solution.bool_value(a.presence));
            let (Some(alt), None) = (chosen.next(), chosen.next()) else {
                return Err(TimetableError::InconsistentSolution {
                    activity: vars.id.clone(),
                    reason: "not exactly one alternative present".into(),
                });
            };
            timetable.add_placement(
                Placement::new(&vars.id, solution.value(vars.start), solution.value(vars.end))
                    .with_rooms(alt.rooms.clone())
                    .with_teachers(alt.teachers.clone()),
            );
        }
        timetable.objective = solution.objective;
        Ok(timetable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectSetup;
    use crate::cp::{ConstraintKind, CpStatus, Literal};
    use crate::models::{
        Activity, ActivityGroup, ActivityKind, Course, GroupRef, ResourcePool,
        StartsAfterConstraint, StudentsGroup,
    };
    use crate::time::WeekStructure;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn setup(weeks: i64) -> ProjectSetup {
        let origin = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ProjectSetup::new(origin, weeks * 672)
    }

    fn lunch_break() -> WeekStructure {
        WeekStructure::always_available(96).with_daily_break(40, 44)
    }

    fn feasibility() -> BuildOptions {
        BuildOptions::default().without_objective()
    }

    /// Full assignment placing each activity at its start with its first
    /// alternative. Only valid for models without kind rules or objective.
    fn place(built: &TimetableModel, starts: &[(&str, i64)]) -> Vec<i64> {
        let mut values = vec![0; built.model.num_variables()];
        for &(id, s) in starts {
            let v = built.activity(id).unwrap();
            values[v.start.index()] = s;
            values[v.end.index()] = s + v.duration;
            let alt = &v.alternatives[0];
            values[alt.presence.index()] = 1;
            values[alt.start.index()] = s;
            values[alt.end.index()] = s + v.duration;
        }
        values
    }

    fn two_activities(constraint: Option<StartsAfterConstraint>) -> Project {
        let mut course = Course::new("C")
            .with_activity(Activity::new("A", "CM", 4).with_students("G"))
            .with_activity(Activity::new("B", "CM", 4).with_students("G"))
            .with_group(ActivityGroup::new("GA", ["A"]))
            .with_group(ActivityGroup::new("GB", ["B"]));
        if let Some(c) = constraint {
            course = course.with_constraint(c);
        }
        Project::new(setup(1))
            .with_kind(ActivityKind::new("CM"))
            .with_students_group(StudentsGroup::atomic("G"))
            .with_course(course)
    }

    #[test]
    fn test_two_rooms_give_two_alternatives() {
        let project = Project::new(setup(1)).with_kind(ActivityKind::new("CM")).with_course(
            Course::new("C").with_activity(
                Activity::new("A", "CM", 4)
                    .with_rooms(ResourcePool::one_of(["R1", "R2"]))
                    .with_teachers(ResourcePool::single("T1")),
            ),
        );
        let built = TimetableCpBuilder::new(&project).with_options(feasibility()).build().unwrap();

        let vars = built.activity("A").unwrap();
        assert_eq!(vars.alternatives.len(), 2);
        let exactly_one: Vec<_> = built
            .model
            .constraints()
            .iter()
            .filter(|c| matches!(c.kind, ConstraintKind::ExactlyOne(_)))
            .collect();
        assert_eq!(exactly_one.len(), 1);
        let expected: Vec<Literal> = vars.presences().map(Literal::from).collect();
        assert_eq!(exactly_one[0].kind, ConstraintKind::ExactlyOne(expected));
        // T1 is shared by both alternatives.
        assert_eq!(built.stats().constraints_by_kind["no_overlap"], 1);
    }

    #[test]
    fn test_precedence_between_groups() {
        let c = StartsAfterConstraint::new(GroupRef::inner("GA"), GroupRef::inner("GB"))
            .with_min_offset(2);
        let project = two_activities(Some(c));
        let built = TimetableCpBuilder::new(&project).with_options(feasibility()).build().unwrap();

        assert!(built.model.check(&place(&built, &[("A", 0), ("B", 6)])).is_empty());
        assert!(!built.model.check(&place(&built, &[("A", 0), ("B", 5)])).is_empty());
        // Same students group: overlap is forbidden too.
        assert!(!built.model.check(&place(&built, &[("A", 10), ("B", 12)])).is_empty());
    }

    #[test]
    fn test_weekly_break_blocks_students() {
        let project = Project::new(setup(2).with_week_structure(lunch_break()))
            .with_kind(ActivityKind::new("CM"))
            .with_students_group(StudentsGroup::atomic("G"))
            .with_course(
                Course::new("C").with_activity(Activity::new("A", "CM", 4).with_students("G")),
            );
        let built = TimetableCpBuilder::new(&project).with_options(feasibility()).build().unwrap();

        for week in 0..2 {
            let base = 672 * week;
            assert!(!built.model.check(&place(&built, &[("A", base + 38)])).is_empty());
            assert!(!built.model.check(&place(&built, &[("A", base + 40)])).is_empty());
            assert!(built.model.check(&place(&built, &[("A", base + 36)])).is_empty());
            assert!(built.model.check(&place(&built, &[("A", base + 44)])).is_empty());
        }
    }

    #[test]
    fn test_break_does_not_apply_without_students() {
        let project = Project::new(setup(1).with_week_structure(lunch_break()))
            .with_kind(ActivityKind::new("CM"))
            .with_course(Course::new("C").with_activity(Activity::new("A", "CM", 4)));
        let built = TimetableCpBuilder::new(&project).with_options(feasibility()).build().unwrap();
        assert!(built.model.check(&place(&built, &[("A", 40)])).is_empty());
    }

    #[test]
    fn test_week_structure_mismatch_rejected() {
        // 30-minute week structure on a 15-minute grid.
        let week = WeekStructure::always_available(48).with_daily_break(24, 26);
        let project = Project::new(setup(1).with_week_structure(week))
            .with_kind(ActivityKind::new("CM"))
            .with_students_group(StudentsGroup::atomic("G"))
            .with_course(
                Course::new("C").with_activity(Activity::new("A", "CM", 4).with_students("G")),
            );
        assert!(matches!(
            TimetableCpBuilder::new(&project).build(),
            Err(TimetableError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_students_group() {
        let project = Project::new(setup(1))
            .with_kind(ActivityKind::new("CM"))
            .with_course(
                Course::new("C").with_activity(Activity::new("A", "CM", 4).with_students("NOPE")),
            );
        match TimetableCpBuilder::new(&project).build() {
            Err(TimetableError::UnknownStudentsGroup { owner, group }) => {
                assert_eq!(owner, "A");
                assert_eq!(group, "NOPE");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_pool_error_aborts_build() {
        let greedy = Activity::new("A", "CM", 4).with_teachers(ResourcePool::new(["T1"], 2));
        let project = Project::new(setup(1))
            .with_kind(ActivityKind::new("CM"))
            .with_course(Course::new("C").with_activity(greedy));
        assert!(matches!(
            TimetableCpBuilder::new(&project).build(),
            Err(TimetableError::ResourceCountExceedsPool { .. })
        ));
    }

    #[test]
    fn test_objective_is_optional() {
        let project = two_activities(None);
        let with = TimetableCpBuilder::new(&project).build().unwrap();
        let without = TimetableCpBuilder::new(&project)
            .with_options(feasibility())
            .build()
            .unwrap();
        assert!(with.objective.is_some());
        assert!(with.model.objective().is_some());
        assert!(without.objective.is_none());
        assert!(without.model.objective().is_none());
        assert!(with.stats().variables > without.stats().variables);
    }

    #[test]
    fn test_decode_solution() {
        let project = Project::new(setup(1)).with_kind(ActivityKind::new("CM")).with_course(
            Course::new("C").with_activity(
                Activity::new("A", "CM", 4)
                    .with_rooms(ResourcePool::one_of(["R1", "R2"]))
                    .with_teachers(ResourcePool::single("T1")),
            ),
        );
        let built = TimetableCpBuilder::new(&project).with_options(feasibility()).build().unwrap();
        let vars = built.activity("A").unwrap();

        let mut values = vec![0; built.model.num_variables()];
        values[vars.start.index()] = 20;
        values[vars.end.index()] = 24;
        let alt = &vars.alternatives[1];
        values[alt.presence.index()] = 1;
        values[alt.start.index()] = 20;
        values[alt.end.index()] = 24;
        assert!(built.model.check(&values).is_empty());

        let solution = CpSolution::with_values(CpStatus::Feasible, &built.model, values.clone());
        let timetable = built.decode_solution(&solution).unwrap();
        let p = timetable.placement("A").unwrap();
        assert_eq!((p.start, p.end), (20, 24));
        assert_eq!(p.rooms, vec!["R2"]);
        assert_eq!(p.teachers, vec!["T1"]);

        // Two present alternatives.
        values[vars.alternatives[0].presence.index()] = 1;
        let solution = CpSolution::with_values(CpStatus::Feasible, &built.model, values);
        assert!(matches!(
            built.decode_solution(&solution),
            Err(TimetableError::InconsistentSolution { .. })
        ));

        // No values at all.
        let solution = CpSolution::without_values(CpStatus::Infeasible);
        assert!(built.decode_solution(&solution).is_err());
    }

    #[test]
    fn test_encoding_twice_is_identical() {
        let c = StartsAfterConstraint::new(GroupRef::inner("GA"), GroupRef::inner("GB"))
            .with_min_offset(2)
            .with_max_offset(96);
        let project = two_activities(Some(c));
        let a = TimetableCpBuilder::new(&project).build().unwrap();
        let b = TimetableCpBuilder::new(&project).build().unwrap();
        assert_eq!(a.stats(), b.stats());
        assert_eq!(a.model.constraints(), b.model.constraints());
    }

    fn random_project(rng: &mut StdRng) -> Project {
        let rooms: Vec<String> = (0..4).map(|i| format!("R{i}")).collect();
        let teachers: Vec<String> = (0..3).map(|i| format!("T{i}")).collect();
        let mut course = Course::new("C");
        for i in 0..rng.random_range(1..6) {
            let room_count = rng.random_range(0..=2);
            let teacher_count = rng.random_range(0..=1);
            let mut activity = Activity::new(format!("A{i}"), "CM", rng.random_range(1..8))
                .with_rooms(ResourcePool::new(rooms.clone(), room_count))
                .with_teachers(ResourcePool::new(teachers.clone(), teacher_count));
            if rng.random_bool(0.5) {
                activity = activity.with_students("ALL");
            }
            course = course.with_activity(activity);
        }
        Project::new(setup(2))
            .with_kind(ActivityKind::new("CM").with_daily_starts([32, 40, 48]))
            .with_students_group(StudentsGroup::new("ALL", ["S1", "S2"]))
            .with_course(course)
    }

    #[test]
    fn test_random_projects_encode_identically() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let project = random_project(&mut rng);
            let a = TimetableCpBuilder::new(&project).build().unwrap();
            let b = TimetableCpBuilder::new(&project).build().unwrap();
            assert_eq!(a.stats(), b.stats());
            assert_eq!(a.model.num_variables(), b.model.num_variables());
            assert_eq!(a.model.constraints().len(), b.model.constraints().len());
        }
    }
}
