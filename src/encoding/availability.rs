//! Availability encoder.
//!
//! Turns declared unavailability windows, static activities and the weekly
//! opening-hours template into fixed intervals, keyed by the resource they
//! block.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cp::{CpModel, IntervalVar};
use crate::error::{Result, TimetableError};
use crate::models::{Project, Resource, UnavailabilityWindow};
use crate::time::{SlotGrid, SlotInterval, WeekStructure};

/// What kind of resource an interval is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntervalOwner {
    Room,
    Teacher,
    /// An atomic student.
    Student,
}

impl IntervalOwner {
    /// Lowercase label used in constraint names.
    pub fn tag(self) -> &'static str {
        match self {
            IntervalOwner::Room => "room",
            IntervalOwner::Teacher => "teacher",
            IntervalOwner::Student => "student",
        }
    }
}

/// Intervals registered per resource.
///
/// Keys are ordered so that iterating a map is deterministic.
#[derive(Debug, Clone, Default)]
pub struct IntervalMap {
    by_owner: BTreeMap<(IntervalOwner, String), Vec<IntervalVar>>,
}

impl IntervalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, owner: IntervalOwner, label: &str, interval: IntervalVar) {
        self.by_owner
            .entry((owner, label.to_string()))
            .or_default()
            .push(interval);
    }

    /// Intervals of one resource; empty when none were registered.
    pub fn get(&self, owner: IntervalOwner, label: &str) -> &[IntervalVar] {
        self.by_owner
            .get(&(owner, label.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (IntervalOwner, &str, &[IntervalVar])> + '_ {
        self.by_owner
            .iter()
            .map(|((owner, label), intervals)| (*owner, label.as_str(), intervals.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = (IntervalOwner, &str)> + '_ {
        self.by_owner.keys().map(|(owner, label)| (*owner, label.as_str()))
    }

    /// Number of resources with at least one interval.
    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }

    /// Total registrations across resources.
    pub fn registrations(&self) -> usize {
        self.by_owner.values().map(Vec::len).sum()
    }
}

fn window_intervals(
    model: &mut CpModel,
    grid: &SlotGrid,
    windows: &[UnavailabilityWindow],
    prefix: &str,
) -> Result<Vec<IntervalVar>> {
    let mut out = Vec::new();
    for (w, window) in windows.iter().enumerate() {
        for (r, slots) in window.to_slot_intervals(grid)?.into_iter().enumerate() {
            out.push(model.new_fixed_interval_var(
                slots.start,
                slots.duration(),
                format!("{prefix}_unavailable{w}_rep{r}"),
            ));
        }
    }
    Ok(out)
}

fn encode_resources(
    model: &mut CpModel,
    grid: &SlotGrid,
    resources: &[Resource],
    owner: IntervalOwner,
    map: &mut IntervalMap,
) -> Result<()> {
    for resource in resources {
        for interval in window_intervals(model, grid, &resource.unavailable, &resource.id)? {
            map.push(owner, &resource.id, interval);
        }
    }
    Ok(())
}

/// Fixed intervals for every unavailability window of rooms, teachers and
/// students groups. A students group window blocks each of its atomic
/// students through one shared interval.
pub fn encode_unavailability(
    model: &mut CpModel,
    project: &Project,
    grid: &SlotGrid,
) -> Result<IntervalMap> {
    let mut map = IntervalMap::new();
    encode_resources(model, grid, &project.rooms, IntervalOwner::Room, &mut map)?;
    encode_resources(model, grid, &project.teachers, IntervalOwner::Teacher, &mut map)?;

    for group in &project.students_groups {
        for interval in window_intervals(model, grid, &group.unavailable, &group.id)? {
            for student in &group.students {
                map.push(IntervalOwner::Student, student, interval);
            }
        }
    }

    debug!(
        stage = "unavailability",
        resources = map.len(),
        intervals = map.registrations(),
    );
    Ok(map)
}

/// Fixed intervals for static activities, registered against their rooms,
/// teachers and the atomic students of their group. Occupations outside the
/// horizon are clipped or dropped.
pub fn encode_static_activities(
    model: &mut CpModel,
    project: &Project,
    grid: &SlotGrid,
) -> Result<IntervalMap> {
    let mut map = IntervalMap::new();
    for activity in &project.static_activities {
        let Some(slots) = activity.interval().clipped(grid.horizon()) else {
            continue;
        };
        let name = format!("static_{}", activity.id);
        let interval = model.new_fixed_interval_var(slots.start, slots.duration(), name);

        if let Some(group) = &activity.students {
            let students = project
                .atomic_students_of(group)
                .ok_or_else(|| TimetableError::UnknownStudentsGroup {
                    owner: activity.id.clone(),
                    group: group.clone(),
                })?;
            for student in students {
                map.push(IntervalOwner::Student, student, interval);
            }
        }
        for room in &activity.rooms {
            map.push(IntervalOwner::Room, room, interval);
        }
        for teacher in &activity.teachers {
            map.push(IntervalOwner::Teacher, teacher, interval);
        }
    }

    debug!(
        stage = "static_activities",
        resources = map.len(),
        intervals = map.registrations(),
    );
    Ok(map)
}

/// Fixed intervals for the closed hours of every week of the horizon.
pub fn encode_weekly(
    model: &mut CpModel,
    week: &WeekStructure,
    grid: &SlotGrid,
) -> Vec<IntervalVar> {
    let spw = grid.slots_per_week();
    let intervals: Vec<IntervalVar> = week
        .forbidden_intervals(grid)
        .into_iter()
        .map(|SlotInterval { start, end }| {
            let w = (start - grid.origin_monday_slot()).div_euclid(spw);
            model.new_fixed_interval_var(start, end - start, format!("weekly_closed_w{w}_{start}"))
        })
        .collect();
    debug!(stage = "weekly", intervals = intervals.len());
    intervals
}
