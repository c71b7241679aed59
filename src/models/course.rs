//! Course model.
//!
//! A course owns its activities, the named activity groups used as
//! precedence endpoints, and the precedence constraints it declares.

use serde::{Deserialize, Serialize};

use super::{Activity, ActivityGroup, StartsAfterConstraint};

/// A course (teaching module).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course label.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Activities taught in this course.
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Named groups of this course's activities.
    #[serde(default)]
    pub groups: Vec<ActivityGroup>,
    /// Precedence constraints declared by this course.
    #[serde(default)]
    pub constraints: Vec<StartsAfterConstraint>,
}

impl Course {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds an activity and stamps it with this course's label.
    pub fn with_activity(mut self, mut activity: Activity) -> Self {
        activity.course = self.id.clone();
        self.activities.push(activity);
        self
    }

    pub fn with_group(mut self, group: ActivityGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_constraint(mut self, constraint: StartsAfterConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn group(&self, id: &str) -> Option<&ActivityGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Total teaching time in slots.
    pub fn total_duration(&self) -> i64 {
        self.activities.iter().map(|a| a.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupRef;

    #[test]
    fn test_course_builder() {
        let course = Course::new("MECA551")
            .with_name("Continuum mechanics")
            .with_activity(Activity::new("MECA551_CM1", "CM", 6))
            .with_activity(Activity::new("MECA551_TD1", "TD", 6))
            .with_group(ActivityGroup::new("CM", ["MECA551_CM1"]))
            .with_group(ActivityGroup::new("TD", ["MECA551_TD1"]))
            .with_constraint(StartsAfterConstraint::new(
                GroupRef::inner("CM"),
                GroupRef::inner("TD"),
            ));

        assert_eq!(course.name, "Continuum mechanics");
        assert_eq!(course.activities.len(), 2);
        assert!(course.activities.iter().all(|a| a.course == "MECA551"));
        assert_eq!(course.total_duration(), 12);
        assert!(course.group("TD").is_some());
        assert!(course.group("TP").is_none());
        assert_eq!(course.activity("MECA551_TD1").map(|a| a.kind.as_str()), Some("TD"));
    }

    #[test]
    fn test_course_empty() {
        let course = Course::new("empty");
        assert_eq!(course.total_duration(), 0);
        assert!(course.constraints.is_empty());
    }
}
