//! Constraint assembler: precedence, start-time rules and no-overlap.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::activities::ActivityVars;
use super::availability::{IntervalMap, IntervalOwner};
use crate::cp::{CpModel, IntervalVar};
use crate::error::{Result, TimetableError};
use crate::models::{Activity, GroupRef, Project};
use crate::time::SlotGrid;

fn group_members<'v>(
    project: &Project,
    vars: &HashMap<&str, &'v ActivityVars>,
    course: &str,
    group: &GroupRef,
) -> Result<Vec<&'v ActivityVars>> {
    let resolved = project
        .resolve_group(course, group)
        .ok_or_else(|| TimetableError::UnknownActivityGroup {
            course: course.to_string(),
            group: group.to_string(),
        })?;
    resolved
        .activities
        .iter()
        .map(|id| {
            vars.get(id.as_str())
                .copied()
                .ok_or_else(|| TimetableError::UnknownActivity {
                    group: group.to_string(),
                    activity: id.clone(),
                })
        })
        .collect()
}

/// Adds `to.start >= from.end + min_offset` (and `<= from.end + max_offset`
/// when bounded) for every member pair of every starts-after constraint,
/// after relaxing offsets by `factor`. Returns the number of linear
/// constraints added.
pub fn add_precedences(
    model: &mut CpModel,
    project: &Project,
    vars: &HashMap<&str, &ActivityVars>,
    factor: f64,
) -> Result<usize> {
    let mut added = 0;
    for course in &project.courses {
        for constraint in &course.constraints {
            let constraint = constraint.relaxed(factor);
            let from = group_members(project, vars, &course.id, &constraint.from)?;
            let to = group_members(project, vars, &course.id, &constraint.to)?;
            for f in &from {
                for t in &to {
                    model
                        .add_ge(t.start, f.end + constraint.min_offset)
                        .with_name(format!("{}_after_{}", t.id, f.id));
                    added += 1;
                    if let Some(max) = constraint.max_offset {
                        model
                            .add_le(t.start, f.end + max)
                            .with_name(format!("{}_within_{}", t.id, f.id));
                        added += 1;
                    }
                }
            }
        }
    }
    debug!(stage = "precedence", constraints = added);
    Ok(added)
}

/// Restricts each activity's start to its kind's allowed times of day and
/// weekdays.
///
/// The time of day is `(start - origin_monday_slot) mod slots_per_day`; each
/// forbidden offset gets its own `!=`. The weekday is the week-relative
/// slot divided by `slots_per_day`.
pub fn add_kind_restrictions<'a, I>(
    model: &mut CpModel,
    project: &Project,
    grid: &SlotGrid,
    activities: I,
) -> Result<usize>
where
    I: IntoIterator<Item = (&'a Activity, &'a ActivityVars)>,
{
    let spd = grid.slots_per_day();
    let spw = grid.slots_per_week();
    let oms = grid.origin_monday_slot();
    let mut added = 0;

    for (activity, vars) in activities {
        let kind = project
            .kind(&activity.kind)
            .ok_or_else(|| TimetableError::UnknownActivityKind {
                activity: activity.id.clone(),
                kind: activity.kind.clone(),
            })?;
        let id = &vars.id;

        let forbidden = kind.forbidden_daily_starts(spd);
        if !forbidden.is_empty() {
            let time_of_day = model.new_int_var(0, spd - 1, format!("{id}_time_of_day"));
            model.add_modulo_equality(time_of_day, vars.start - oms, spd);
            for value in forbidden {
                model.add_ne(time_of_day, value);
                added += 1;
            }
        }

        if !kind.forbidden_weekdays.is_empty() {
            let week_slot = model.new_int_var(0, spw - 1, format!("{id}_week_slot"));
            model.add_modulo_equality(week_slot, vars.start - oms, spw);
            let weekday = model.new_int_var(0, 6, format!("{id}_weekday"));
            model.add_division_equality(weekday, week_slot, spd);
            for &day in &kind.forbidden_weekdays {
                model.add_ne(weekday, i64::from(day) - 1);
                added += 1;
            }
        }
    }
    debug!(stage = "kinds", constraints = added);
    Ok(added)
}

/// One no-overlap per resource over its activity intervals and its
/// unavailability intervals, when it has more than one.
pub fn add_no_overlaps(
    model: &mut CpModel,
    dynamic: &IntervalMap,
    unavailable: &IntervalMap,
) -> usize {
    let owners: BTreeSet<_> = dynamic.keys().chain(unavailable.keys()).collect();
    let mut added = 0;
    for (owner, label) in owners {
        let intervals: Vec<IntervalVar> = dynamic
            .get(owner, label)
            .iter()
            .chain(unavailable.get(owner, label))
            .copied()
            .collect();
        if intervals.len() > 1 {
            model
                .add_no_overlap(intervals)
                .with_name(format!("{}_{label}_no_overlap", owner.tag()));
            added += 1;
        }
    }
    debug!(stage = "no_overlap", constraints = added);
    added
}

/// Pairwise no-overlap between each static interval of a resource and each
/// of its activity intervals.
pub fn add_static_overlaps(
    model: &mut CpModel,
    dynamic: &IntervalMap,
    statics: &IntervalMap,
) -> usize {
    let mut added = 0;
    for (owner, label, fixed) in statics.iter() {
        for &s in fixed {
            for &d in dynamic.get(owner, label) {
                model.add_no_overlap([s, d]);
                added += 1;
            }
        }
    }
    debug!(stage = "static_overlap", constraints = added);
    added
}

/// Pairwise no-overlap between every closed period of the week template and
/// every interval attended by students.
pub fn add_weekly_overlaps(
    model: &mut CpModel,
    dynamic: &IntervalMap,
    weekly: &[IntervalVar],
) -> usize {
    let attended: BTreeSet<IntervalVar> = dynamic
        .iter()
        .filter(|(owner, _, _)| *owner == IntervalOwner::Student)
        .flat_map(|(_, _, intervals)| intervals.iter().copied())
        .collect();
    let mut added = 0;
    for &interval in &attended {
        for &closed in weekly {
            model.add_no_overlap([closed, interval]);
            added += 1;
        }
    }
    debug!(stage = "weekly_overlap", constraints = added);
    added
}
