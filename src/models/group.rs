//! Activity groups and precedence ("starts after") constraints.
//!
//! Precedence is declared between groups, not activities: an edge from
//! group F to group T requires every activity of T to start at least
//! `min_offset` slots after every activity of F ends, and at most
//! `max_offset` slots after it when set.
//!
//! # Reference
//! Brucker (2007), "Scheduling Algorithms", Ch. 2 (generalized precedence)

use serde::{Deserialize, Serialize};

/// A named set of activities of one course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityGroup {
    /// Group label, unique within its course.
    pub id: String,
    /// Member activity labels.
    #[serde(default)]
    pub activities: Vec<String>,
}

impl ActivityGroup {
    pub fn new<I, S>(id: impl Into<String>, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            activities: activities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activities.push(activity.into());
        self
    }
}

/// Reference to an activity group.
///
/// Without a course the group is looked up in the declaring course (inner
/// table); with a course it is looked up in that course (foreign table).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    /// Foreign course label, if any.
    #[serde(default)]
    pub course: Option<String>,
    /// Group label.
    pub group: String,
}

impl GroupRef {
    /// Group of the declaring course.
    pub fn inner(group: impl Into<String>) -> Self {
        Self {
            course: None,
            group: group.into(),
        }
    }

    /// Group of another course.
    pub fn foreign(course: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            course: Some(course.into()),
            group: group.into(),
        }
    }

    /// Course the reference resolves in, given the declaring course.
    pub fn course_or<'a>(&'a self, declaring: &'a str) -> &'a str {
        self.course.as_deref().unwrap_or(declaring)
    }
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.course {
            Some(course) => write!(f, "{course}/{}", self.group),
            None => f.write_str(&self.group),
        }
    }
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// `to` starts after `from` ends, within `[min_offset, max_offset]` slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartsAfterConstraint {
    /// Preceding group.
    pub from: GroupRef,
    /// Following group.
    pub to: GroupRef,
    /// Minimum gap in slots between `from` end and `to` start.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub min_offset: i64,
    /// Maximum gap in slots, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_offset: Option<i64>,
}

impl StartsAfterConstraint {
    pub fn new(from: GroupRef, to: GroupRef) -> Self {
        Self {
            from,
            to,
            min_offset: 0,
            max_offset: None,
        }
    }

    pub fn with_min_offset(mut self, slots: i64) -> Self {
        self.min_offset = slots;
        self
    }

    pub fn with_max_offset(mut self, slots: i64) -> Self {
        self.max_offset = Some(slots);
        self
    }

    /// Loosened copy: `min / factor` rounded down, `max * factor` rounded up.
    ///
    /// A factor of 1.0 (or any non-positive or non-finite factor) returns
    /// the constraint unchanged.
    pub fn relaxed(&self, factor: f64) -> Self {
        if !(factor.is_finite() && factor > 0.0) || factor == 1.0 {
            return self.clone();
        }
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            min_offset: (self.min_offset as f64 / factor).floor() as i64,
            max_offset: self.max_offset.map(|m| (m as f64 * factor).ceil() as i64),
        }
    }
}
