//! Project: everything one timetabling run reads.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    Activity, ActivityGroup, ActivityKind, Course, GroupRef, Resource, StaticActivity,
    StudentsGroup,
};
use crate::config::{read_toml, read_yaml, ConfigError, ProjectSetup};

/// A timetabling project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Calendar setup.
    pub setup: ProjectSetup,
    /// Courses with their activities, groups and precedence constraints.
    #[serde(default)]
    pub courses: Vec<Course>,
    /// Rooms.
    #[serde(default)]
    pub rooms: Vec<Resource>,
    /// Teachers.
    #[serde(default)]
    pub teachers: Vec<Resource>,
    /// Students groups.
    #[serde(default)]
    pub students_groups: Vec<StudentsGroup>,
    /// Activity kinds.
    #[serde(default)]
    pub kinds: Vec<ActivityKind>,
    /// Fixed occupations.
    #[serde(default)]
    pub static_activities: Vec<StaticActivity>,
}

impl Project {
    pub fn new(setup: ProjectSetup) -> Self {
        Self {
            setup,
            courses: Vec::new(),
            rooms: Vec::new(),
            teachers: Vec::new(),
            students_groups: Vec::new(),
            kinds: Vec::new(),
            static_activities: Vec::new(),
        }
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    pub fn with_room(mut self, room: Resource) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn with_teacher(mut self, teacher: Resource) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub fn with_students_group(mut self, group: StudentsGroup) -> Self {
        self.students_groups.push(group);
        self
    }

    pub fn with_kind(mut self, kind: ActivityKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn with_static_activity(mut self, activity: StaticActivity) -> Self {
        self.static_activities.push(activity);
        self
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_yaml(path)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Every activity of every course, in declaration order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> + '_ {
        self.courses.iter().flat_map(|c| c.activities.iter())
    }

    pub fn activities_mut(&mut self) -> impl Iterator<Item = &mut Activity> + '_ {
        self.courses.iter_mut().flat_map(|c| c.activities.iter_mut())
    }

    pub fn activity_count(&self) -> usize {
        self.courses.iter().map(|c| c.activities.len()).sum()
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities().find(|a| a.id == id)
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn kind(&self, id: &str) -> Option<&ActivityKind> {
        self.kinds.iter().find(|k| k.id == id)
    }

    pub fn students_group(&self, id: &str) -> Option<&StudentsGroup> {
        self.students_groups.iter().find(|g| g.id == id)
    }

    pub fn room(&self, id: &str) -> Option<&Resource> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn teacher(&self, id: &str) -> Option<&Resource> {
        self.teachers.iter().find(|r| r.id == id)
    }

    /// Atomic students of a students group.
    pub fn atomic_students_of(&self, group: &str) -> Option<&[String]> {
        self.students_group(group).map(|g| g.students.as_slice())
    }

    /// All atomic students, sorted.
    pub fn atomic_students(&self) -> BTreeSet<&str> {
        self.students_groups
            .iter()
            .flat_map(|g| g.students.iter().map(String::as_str))
            .collect()
    }

    /// Resolves a group reference declared by course `declaring`.
    pub fn resolve_group(&self, declaring: &str, group: &GroupRef) -> Option<&ActivityGroup> {
        self.course(group.course_or(declaring))?.group(&group.group)
    }
}
