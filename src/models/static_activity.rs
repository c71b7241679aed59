//! Static activities: fixed occupations with no decision variables.
//!
//! They come either from an external calendar export (courses of other
//! departments sharing rooms, teachers or students) or are synthesized to
//! block a resource for a while.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::{Rounding, SlotGrid, SlotInterval};

/// Where a static activity comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticOrigin {
    /// Imported from an external calendar export.
    #[default]
    Imported,
    /// Injected to block resources.
    Synthetic,
}

/// A fixed occupation of rooms, teachers and/or students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticActivity {
    /// Label.
    pub id: String,
    /// Provenance.
    #[serde(default)]
    pub origin: StaticOrigin,
    /// Start slot.
    pub start: i64,
    /// Duration in slots.
    pub duration: i64,
    /// Students group occupied, if any.
    #[serde(default)]
    pub students: Option<String>,
    /// Rooms occupied.
    #[serde(default)]
    pub rooms: Vec<String>,
    /// Teachers occupied.
    #[serde(default)]
    pub teachers: Vec<String>,
}

impl StaticActivity {
    pub fn new(id: impl Into<String>, start: i64, duration: i64) -> Self {
        Self {
            id: id.into(),
            origin: StaticOrigin::Imported,
            start,
            duration,
            students: None,
            rooms: Vec::new(),
            teachers: Vec::new(),
        }
    }

    /// Static activity covering `[start, end)`, widened to whole slots.
    pub fn from_datetimes(
        id: impl Into<String>,
        grid: &SlotGrid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        let from = grid.datetime_to_slot(start, Rounding::Floor);
        let to = grid.datetime_to_slot(end, Rounding::Ceil);
        Self::new(id, from, (to - from).max(0))
    }

    pub fn synthetic(mut self) -> Self {
        self.origin = StaticOrigin::Synthetic;
        self
    }

    pub fn with_students(mut self, group: impl Into<String>) -> Self {
        self.students = Some(group.into());
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.rooms.push(room.into());
        self
    }

    pub fn with_teacher(mut self, teacher: impl Into<String>) -> Self {
        self.teachers.push(teacher.into());
        self
    }

    pub fn interval(&self) -> SlotInterval {
        SlotInterval::from_duration(self.start, self.duration)
    }
}
