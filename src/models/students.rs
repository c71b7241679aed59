//! Students groups and atomic students.
//!
//! A students group is a named, possibly overlapping set of atomic students.
//! Atomic students are the unit of conflict checking: one atomic student
//! never attends two activities at once.

use serde::{Deserialize, Serialize};

use super::UnavailabilityWindow;

/// A named set of atomic students.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentsGroup {
    /// Group label.
    pub id: String,
    /// Atomic student labels.
    pub students: Vec<String>,
    /// Unavailability applying to every member.
    #[serde(default)]
    pub unavailable: Vec<UnavailabilityWindow>,
}

impl StudentsGroup {
    pub fn new<I, S>(id: impl Into<String>, students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            students: students.into_iter().map(Into::into).collect(),
            unavailable: Vec::new(),
        }
    }

    /// A group made of a single atomic student with the same label.
    pub fn atomic(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), [id])
    }

    pub fn with_unavailable(mut self, window: UnavailabilityWindow) -> Self {
        self.unavailable.push(window);
        self
    }

    pub fn contains(&self, student: &str) -> bool {
        self.students.iter().any(|s| s == student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_students_group() {
        let g = StudentsGroup::new("MECA5", ["MECA5_TD1", "MECA5_TD2"]);
        assert!(g.contains("MECA5_TD1"));
        assert!(!g.contains("MECA5"));

        let a = StudentsGroup::atomic("MECA5_TD1");
        assert_eq!(a.students, vec!["MECA5_TD1"]);
    }
}
