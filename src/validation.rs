//! Input validation and timetable audit.
//!
//! [`validate_project`] checks the structural integrity of a project before
//! it is encoded and reports every problem at once:
//! - Duplicate IDs
//! - Unknown kind, students group, room, teacher, activity or group references
//! - Resource counts larger than their candidate pool
//! - Non-positive durations and inverted start or offset bounds
//! - Circular precedence between activity groups (DAG validation)
//!
//! [`verify_timetable`] audits a solved timetable independently of the CP
//! model and returns the [`Violation`]s it finds.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::Result;
use crate::models::{
    Activity, Placement, Project, ResourcePool, Timetable, UnavailabilityWindow, Violation,
};
use crate::time::{Calendar, SlotGrid, SlotInterval};

/// Validation result.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// The project setup is unusable.
    InvalidSetup,
    /// A pool or static activity references a room or teacher that doesn't exist.
    InvalidResourceReference,
    /// A students group reference doesn't resolve.
    UnknownStudentsGroup,
    /// An activity kind reference doesn't resolve.
    UnknownKind,
    /// An activity group lists an activity that doesn't exist.
    UnknownActivity,
    /// A precedence endpoint names a group that doesn't exist.
    UnknownGroup,
    /// A pool asks for more resources than it holds.
    ResourceCountExceedsPool,
    /// A duration is zero or negative.
    InvalidDuration,
    /// A lower bound exceeds its upper bound.
    InvertedBounds,
    /// Precedence graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

fn check_duplicates<'a>(
    errors: &mut Vec<ValidationError>,
    what: &str,
    ids: impl IntoIterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
}

fn check_pool(
    errors: &mut Vec<ValidationError>,
    activity: &Activity,
    pool: &ResourcePool,
    what: &str,
    known: &HashSet<&str>,
) {
    for candidate in &pool.candidates {
        if !known.contains(candidate.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidResourceReference,
                format!("Activity '{}' references unknown {what} '{candidate}'", activity.id),
            ));
        }
    }
    if !pool.is_satisfiable() {
        errors.push(ValidationError::new(
            ValidationErrorKind::ResourceCountExceedsPool,
            format!(
                "Activity '{}' requests {} {what}(s) from a pool of {}",
                activity.id,
                pool.count,
                pool.candidates.len()
            ),
        ));
    }
}

/// Validates a project before encoding.
///
/// Checks:
/// 1. The setup (horizon, slot duration, week structure, relaxation factor)
/// 2. No duplicate course, activity, room, teacher, students group, kind,
///    static activity or per-course group IDs
/// 3. Every activity: positive duration, `earliest <= latest`, known kind,
///    known students group, known pool candidates, `count <= pool size`
/// 4. Every static activity: positive duration, known references
/// 5. Every group member and precedence endpoint resolves;
///    `min_offset <= max_offset`
/// 6. No circular precedence between groups
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_project(project: &Project) -> ValidationResult {
    let mut errors = Vec::new();

    if let Err(e) = project.setup.validate() {
        errors.push(ValidationError::new(ValidationErrorKind::InvalidSetup, e.to_string()));
    }

    check_duplicates(&mut errors, "course", project.courses.iter().map(|c| c.id.as_str()));
    check_duplicates(&mut errors, "activity", project.activities().map(|a| a.id.as_str()));
    check_duplicates(&mut errors, "room", project.rooms.iter().map(|r| r.id.as_str()));
    check_duplicates(&mut errors, "teacher", project.teachers.iter().map(|r| r.id.as_str()));
    let group_ids = project.students_groups.iter().map(|g| g.id.as_str());
    check_duplicates(&mut errors, "students group", group_ids);
    check_duplicates(&mut errors, "kind", project.kinds.iter().map(|k| k.id.as_str()));
    let statics = project.static_activities.iter().map(|s| s.id.as_str());
    check_duplicates(&mut errors, "static activity", statics);
    for course in &project.courses {
        check_duplicates(
            &mut errors,
            &format!("group in course '{}'", course.id),
            course.groups.iter().map(|g| g.id.as_str()),
        );
    }

    let rooms: HashSet<&str> = project.rooms.iter().map(|r| r.id.as_str()).collect();
    let teachers: HashSet<&str> = project.teachers.iter().map(|r| r.id.as_str()).collect();
    let groups: HashSet<&str> = project.students_groups.iter().map(|g| g.id.as_str()).collect();
    let kinds: HashSet<&str> = project.kinds.iter().map(|k| k.id.as_str()).collect();
    let activity_ids: HashSet<&str> = project.activities().map(|a| a.id.as_str()).collect();

    for act in project.activities() {
        if act.duration <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Activity '{}' has duration {}", act.id, act.duration),
            ));
        }
        if let (Some(lo), Some(hi)) = (act.earliest_start, act.latest_start) {
            if lo > hi {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvertedBounds,
                    format!(
                        "Activity '{}' has earliest start {lo} after latest start {hi}",
                        act.id
                    ),
                ));
            }
        }
        if !kinds.contains(act.kind.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownKind,
                format!("Activity '{}' references unknown kind '{}'", act.id, act.kind),
            ));
        }
        if let Some(group) = &act.students {
            if !groups.contains(group.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStudentsGroup,
                    format!("Activity '{}' references unknown students group '{group}'", act.id),
                ));
            }
        }
        check_pool(&mut errors, act, &act.rooms, "room", &rooms);
        check_pool(&mut errors, act, &act.teachers, "teacher", &teachers);
    }

    for s in &project.static_activities {
        if s.duration <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Static activity '{}' has duration {}", s.id, s.duration),
            ));
        }
        if let Some(group) = &s.students {
            if !groups.contains(group.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStudentsGroup,
                    format!(
                        "Static activity '{}' references unknown students group '{group}'",
                        s.id
                    ),
                ));
            }
        }
        let unknown = s
            .rooms
            .iter()
            .filter(|r| !rooms.contains(r.as_str()))
            .chain(s.teachers.iter().filter(|t| !teachers.contains(t.as_str())));
        for id in unknown {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidResourceReference,
                format!("Static activity '{}' references unknown resource '{id}'", s.id),
            ));
        }
    }

    for course in &project.courses {
        for group in &course.groups {
            for member in &group.activities {
                if !activity_ids.contains(member.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownActivity,
                        format!(
                            "Group '{}' of course '{}' lists unknown activity '{member}'",
                            group.id, course.id
                        ),
                    ));
                }
            }
        }
        for c in &course.constraints {
            for end in [&c.from, &c.to] {
                if project.resolve_group(&course.id, end).is_none() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownGroup,
                        format!("Course '{}' references unknown activity group '{end}'", course.id),
                    ));
                }
            }
            if let Some(max) = c.max_offset {
                if max < c.min_offset {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvertedBounds,
                        format!(
                            "Course '{}': {} -> {} has max offset {max} below min offset {}",
                            course.id, c.from, c.to, c.min_offset
                        ),
                    ));
                }
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(project) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the group precedence graph using DFS.
///
/// Nodes are groups qualified by their course (`course/group`); each
/// starts-after constraint is an edge `from -> to`.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(project: &Project) -> Option<ValidationError> {
    let mut edges: Vec<(String, String)> = Vec::new();
    for course in &project.courses {
        for c in &course.constraints {
            let from = format!("{}/{}", c.from.course_or(&course.id), c.from.group);
            let to = format!("{}/{}", c.to.course_or(&course.id), c.to.group);
            edges.push((from, to));
        }
    }

    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut all_ids: Vec<&str> = Vec::new();
    for (from, to) in &edges {
        adj.entry(from.as_str()).or_default().push(to.as_str());
        all_ids.push(from.as_str());
        all_ids.push(to.as_str());
    }
    all_ids.sort_unstable();
    all_ids.dedup();

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for &node in &all_ids {
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular precedence detected involving group '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}

/// One use of a resource.
struct Occupation<'a> {
    label: &'a str,
    interval: SlotInterval,
    /// Static activities are fixed input; two of them may overlap.
    fixed: bool,
}

type ResourceKey<'a> = (&'static str, &'a str);

fn window_calendar(
    calendars: &mut HashMap<String, Calendar>,
    key: String,
    windows: &[UnavailabilityWindow],
    grid: &SlotGrid,
) -> Result<()> {
    for window in windows {
        for interval in window.to_slot_intervals(grid)? {
            calendars
                .entry(key.clone())
                .or_insert_with(|| Calendar::new(key.clone()))
                .block(interval);
        }
    }
    Ok(())
}

fn check_placement(
    project: &Project,
    grid: &SlotGrid,
    activity: &Activity,
    p: &Placement,
    out: &mut Vec<Violation>,
) {
    let id = activity.id.as_str();
    let (lo, hi) = activity.start_window(grid.horizon());
    if p.start < lo || p.start > hi || p.end > grid.horizon() {
        out.push(Violation::out_of_bounds(
            id,
            format!("'{id}' placed at [{}, {}), allowed starts [{lo}, {hi}]", p.start, p.end),
        ));
    }
    if p.duration() != activity.duration {
        out.push(Violation::out_of_bounds(
            id,
            format!("'{id}' spans {} slots but lasts {}", p.duration(), activity.duration),
        ));
    }

    if let Some(kind) = project.kind(&activity.kind) {
        let week_slot = p.start - grid.origin_monday_slot();
        let time_of_day = week_slot.rem_euclid(grid.slots_per_day());
        let allowed = &kind.allowed_daily_starts;
        if !allowed.is_empty() && !allowed.contains(&time_of_day) {
            out.push(Violation::forbidden_start_time(
                id,
                format!(
                    "'{id}' starts at day slot {time_of_day}, not allowed for kind '{}'",
                    kind.id
                ),
            ));
        }
        let weekday = week_slot.rem_euclid(grid.slots_per_week()) / grid.slots_per_day() + 1;
        if kind.forbidden_weekdays.iter().any(|&d| i64::from(d) == weekday) {
            out.push(Violation::forbidden_weekday(
                id,
                format!("'{id}' starts on weekday {weekday}, forbidden for kind '{}'", kind.id),
            ));
        }
    }

    let valid = |pool: &ResourcePool, chosen: &[String]| {
        let distinct: HashSet<&String> = chosen.iter().collect();
        chosen.len() == pool.count
            && distinct.len() == chosen.len()
            && chosen.iter().all(|c| pool.contains(c))
    };
    if !valid(&activity.rooms, &p.rooms) || !valid(&activity.teachers, &p.teachers) {
        out.push(Violation::allocation_mismatch(
            id,
            format!("'{id}' allocated rooms {:?} and teachers {:?}", p.rooms, p.teachers),
        ));
    }
}

/// Audits a solved timetable against its project.
///
/// Reports missing placements, bounds and kind violations, allocations that
/// are not a valid alternative, overlaps per room, teacher and atomic
/// student (static activities included), intersections with unavailability
/// windows and with the closed hours of the week, and unmet precedence.
///
/// Fails only when the project's temporal data cannot be converted.
pub fn verify_timetable(project: &Project, timetable: &Timetable) -> Result<Vec<Violation>> {
    let grid = project.setup.grid()?;
    let week = project.setup.week_structure(&grid);
    let oms = grid.origin_monday_slot();
    let placed: HashMap<&str, &Placement> =
        timetable.placements.iter().map(|p| (p.activity.as_str(), p)).collect();
    let mut violations = Vec::new();
    let mut occupations: BTreeMap<ResourceKey<'_>, Vec<Occupation<'_>>> = BTreeMap::new();

    for activity in project.activities() {
        let Some(p) = placed.get(activity.id.as_str()) else {
            violations.push(Violation::missing_placement(&activity.id));
            continue;
        };
        check_placement(project, &grid, activity, p, &mut violations);

        let interval = SlotInterval::new(p.start, p.end);
        let students = activity
            .students
            .as_deref()
            .and_then(|g| project.atomic_students_of(g))
            .unwrap_or(&[]);
        let uses = p
            .rooms
            .iter()
            .map(|r| ("room", r.as_str()))
            .chain(p.teachers.iter().map(|t| ("teacher", t.as_str())))
            .chain(students.iter().map(|s| ("student", s.as_str())));
        for key in uses {
            occupations.entry(key).or_default().push(Occupation {
                label: &activity.id,
                interval,
                fixed: false,
            });
        }

        if !students.is_empty() {
            if let Some(closed) = (p.start..p.end).find(|&s| !week.is_available_at(s - oms)) {
                violations.push(Violation::outside_opening_hours(
                    &activity.id,
                    format!("'{}' covers closed slot {closed}", activity.id),
                ));
            }
        }
    }

    for s in &project.static_activities {
        let Some(interval) = s.interval().clipped(grid.horizon()) else {
            continue;
        };
        let students = s
            .students
            .as_deref()
            .and_then(|g| project.atomic_students_of(g))
            .unwrap_or(&[]);
        let uses = s
            .rooms
            .iter()
            .map(|r| ("room", r.as_str()))
            .chain(s.teachers.iter().map(|t| ("teacher", t.as_str())))
            .chain(students.iter().map(|st| ("student", st.as_str())));
        for key in uses {
            occupations.entry(key).or_default().push(Occupation {
                label: &s.id,
                interval,
                fixed: true,
            });
        }
    }

    // Unavailability calendars keyed by "kind/id".
    let mut calendars: HashMap<String, Calendar> = HashMap::new();
    for room in &project.rooms {
        window_calendar(&mut calendars, format!("room/{}", room.id), &room.unavailable, &grid)?;
    }
    for teacher in &project.teachers {
        let key = format!("teacher/{}", teacher.id);
        window_calendar(&mut calendars, key, &teacher.unavailable, &grid)?;
    }
    for group in &project.students_groups {
        for student in &group.students {
            let key = format!("student/{student}");
            window_calendar(&mut calendars, key, &group.unavailable, &grid)?;
        }
    }

    for ((kind, id), mut uses) in occupations {
        uses.sort_by_key(|u| (u.interval.start, u.interval.end));
        for (i, a) in uses.iter().enumerate() {
            for b in &uses[i + 1..] {
                if b.interval.start >= a.interval.end {
                    break;
                }
                if a.fixed && b.fixed {
                    continue;
                }
                violations.push(Violation::overlap(
                    id,
                    format!(
                        "{kind} '{id}': '{}' [{}, {}) overlaps '{}' [{}, {})",
                        a.label,
                        a.interval.start,
                        a.interval.end,
                        b.label,
                        b.interval.start,
                        b.interval.end
                    ),
                ));
            }
        }

        let Some(calendar) = calendars.get(&format!("{kind}/{id}")) else {
            continue;
        };
        for u in uses.iter().filter(|u| !u.fixed) {
            if let Some(blocked) = calendar.conflict_with(&u.interval) {
                violations.push(Violation::unavailable(
                    id,
                    format!(
                        "{kind} '{id}' is unavailable during [{}, {}) used by '{}'",
                        blocked.start, blocked.end, u.label
                    ),
                ));
            }
        }
    }

    let factor = project.setup.succession_relaxation_factor;
    for course in &project.courses {
        for c in &course.constraints {
            let c = c.relaxed(factor);
            let (Some(from), Some(to)) = (
                project.resolve_group(&course.id, &c.from),
                project.resolve_group(&course.id, &c.to),
            ) else {
                continue;
            };
            for f in &from.activities {
                for t in &to.activities {
                    let (Some(pf), Some(pt)) = (placed.get(f.as_str()), placed.get(t.as_str()))
                    else {
                        continue;
                    };
                    if pt.start < pf.end + c.min_offset {
                        violations.push(Violation::precedence(
                            t.as_str(),
                            format!(
                                "'{t}' starts at {} but '{f}' ends at {} (min offset {})",
                                pt.start, pf.end, c.min_offset
                            ),
                        ));
                    }
                    if let Some(max) = c.max_offset {
                        if pt.start > pf.end + max {
                            violations.push(Violation::precedence(
                                t.as_str(),
                                format!(
                                    "'{t}' starts at {} but '{f}' ends at {} (max offset {max})",
                                    pt.start, pf.end
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    Ok(violations)
}
