//! Resource model: rooms and teachers.
//!
//! Both kinds are disjunctive: a room or a teacher serves at most one
//! activity at a time. `capacity` is informational (seats in a room) and is
//! not part of the overlap model.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

use super::UnavailabilityWindow;

/// Resource classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Teaching room.
    Room,
    /// Teacher.
    Teacher,
}

impl ResourceKind {
    /// Plural label used in messages.
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Room => "rooms",
            ResourceKind::Teacher => "teachers",
        }
    }
}

/// A room or a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique label within its kind.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Room or teacher.
    pub kind: ResourceKind,
    /// Seats for rooms; 1 for teachers.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Declared unavailability.
    #[serde(default)]
    pub unavailable: Vec<UnavailabilityWindow>,
}

fn default_capacity() -> u32 {
    1
}

impl Resource {
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind,
            capacity: default_capacity(),
            unavailable: Vec::new(),
        }
    }

    pub fn room(id: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Room)
    }

    pub fn teacher(id: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Teacher)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Adds an unavailability window.
    pub fn with_unavailable(mut self, window: UnavailabilityWindow) -> Self {
        self.unavailable.push(window);
        self
    }

    pub fn is_room(&self) -> bool {
        self.kind == ResourceKind::Room
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let r = Resource::room("A120")
            .with_name("Amphi A120")
            .with_capacity(180)
            .with_unavailable(UnavailabilityWindow::between(
                "2024-W36-1 08:00",
                "2024-W36-1 10:00",
            ));

        assert_eq!(r.id, "A120");
        assert_eq!(r.name, "Amphi A120");
        assert!(r.is_room());
        assert_eq!(r.capacity, 180);
        assert_eq!(r.unavailable.len(), 1);
    }

    #[test]
    fn test_resource_kinds() {
        let t = Resource::teacher("T1");
        assert_eq!(t.kind, ResourceKind::Teacher);
        assert_eq!(t.capacity, 1);
        assert_eq!(t.kind.plural(), "teachers");
        assert_eq!(ResourceKind::Room.plural(), "rooms");
    }

    #[test]
    fn test_serde_kind() {
        let r: Resource = serde_json::from_str(r#"{"id": "T9", "kind": "teacher"}"#).unwrap();
        assert_eq!(r.kind, ResourceKind::Teacher);
        assert!(r.unavailable.is_empty());
    }
}
