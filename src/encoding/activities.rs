//! Activity variable builder.
//!
//! Every activity gets a start/end pair tied by a mandatory interval, and
//! one optional interval per resource alternative. The optional intervals
//! are what rooms, teachers and atomic students see in their no-overlap
//! sets; exactly one of them is present.

use tracing::debug;

use super::alternatives::{alternatives, check_alternatives};
use super::availability::{IntervalMap, IntervalOwner};
use crate::cp::{BoolVar, CpModel, IntVar, IntervalVar};
use crate::error::Result;
use crate::models::{Activity, ResourcePool};

/// Variables of one resource alternative.
#[derive(Debug, Clone)]
pub struct AlternativeVars {
    /// True when this alternative is the chosen one.
    pub presence: BoolVar,
    /// Shadow start, equal to the activity start when present.
    pub start: IntVar,
    /// Shadow end, equal to the activity end when present.
    pub end: IntVar,
    pub interval: IntervalVar,
    pub rooms: Vec<String>,
    pub teachers: Vec<String>,
}

/// Variables of one activity.
#[derive(Debug, Clone)]
pub struct ActivityVars {
    /// Activity label.
    pub id: String,
    /// Duration in slots.
    pub duration: i64,
    pub start: IntVar,
    pub end: IntVar,
    /// Mandatory interval `[start, end)`.
    pub interval: IntervalVar,
    /// Atomic students attending.
    pub students: Vec<String>,
    pub alternatives: Vec<AlternativeVars>,
}

impl ActivityVars {
    pub fn presences(&self) -> impl Iterator<Item = BoolVar> + '_ {
        self.alternatives.iter().map(|a| a.presence)
    }
}

/// Creates the variables of `activity` and registers its alternative
/// intervals against rooms, teachers and `students` in `intervals`.
pub fn encode_activity(
    model: &mut CpModel,
    activity: &Activity,
    students: &[String],
    horizon: i64,
    max_alternatives: Option<u64>,
    intervals: &mut IntervalMap,
) -> Result<ActivityVars> {
    check_alternatives(activity, max_alternatives)?;

    let id = activity.id.as_str();
    let duration = activity.duration;
    let start = model.new_int_var(0, horizon, format!("{id}_start"));
    let end = model.new_int_var(0, horizon, format!("{id}_end"));
    let interval = model.new_interval_var(start, duration, end, format!("{id}_interval"));

    if let Some(hint) = activity.start {
        model.add_hint(start, hint);
    }
    if let Some(earliest) = activity.earliest_start {
        model.add_ge(start, earliest).with_name(format!("{id}_earliest_start"));
    }
    if let Some(latest) = activity.latest_start {
        model.add_le(start, latest).with_name(format!("{id}_latest_start"));
    }

    // Hint alternatives only when both sides of the allocation are known.
    let known =
        |allocated: &[String], pool: &ResourcePool| !allocated.is_empty() || pool.count == 0;
    let has_allocation = known(&activity.allocated_rooms, &activity.rooms)
        && known(&activity.allocated_teachers, &activity.teachers);
    let mut alts = Vec::new();
    for (k, alternative) in alternatives(activity).enumerate() {
        let presence = model.new_bool_var(format!("{id}_alt{k}_presence"));
        let alt_start = model.new_int_var(0, horizon, format!("{id}_alt{k}_start"));
        let alt_end = model.new_int_var(0, horizon, format!("{id}_alt{k}_end"));
        model.add_eq(alt_start, start).only_enforce_if(presence);
        model.add_eq(alt_end, end).only_enforce_if(presence);
        let alt_interval = model.new_optional_interval_var(
            alt_start,
            duration,
            alt_end,
            presence,
            format!("{id}_alt{k}_interval"),
        );

        if has_allocation {
            let chosen =
                alternative.matches(&activity.allocated_rooms, &activity.allocated_teachers);
            model.add_bool_hint(presence, chosen);
        }

        for room in &alternative.rooms {
            intervals.push(IntervalOwner::Room, room, alt_interval);
        }
        for teacher in &alternative.teachers {
            intervals.push(IntervalOwner::Teacher, teacher, alt_interval);
        }
        for student in students {
            intervals.push(IntervalOwner::Student, student, alt_interval);
        }

        alts.push(AlternativeVars {
            presence,
            start: alt_start,
            end: alt_end,
            interval: alt_interval,
            rooms: alternative.rooms,
            teachers: alternative.teachers,
        });
    }

    model
        .add_exactly_one(alts.iter().map(|a| a.presence))
        .with_name(format!("{id}_one_alternative"));

    debug!(activity = id, alternatives = alts.len(), "activity encoded");

    Ok(ActivityVars {
        id: activity.id.clone(),
        duration,
        start,
        end,
        interval,
        students: students.to_vec(),
        alternatives: alts,
    })
}
