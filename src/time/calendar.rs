//! Slot intervals and blocked-slot calendars.
//!
//! # Time Model
//! Intervals are half-open `[start, end)` ranges of slot indices.
//!
//! A [`Calendar`] collects the blocked intervals of one resource (room,
//! teacher or atomic student) and answers occupancy questions when a solved
//! timetable is audited. The solver itself never sees a `Calendar`; it sees
//! the same intervals as fixed interval variables.

use serde::{Deserialize, Serialize};

/// A slot interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotInterval {
    /// First slot (inclusive).
    pub start: i64,
    /// End slot (exclusive).
    pub end: i64,
}

impl SlotInterval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Interval starting at `start` lasting `duration` slots.
    pub fn from_duration(start: i64, duration: i64) -> Self {
        Self::new(start, start + duration)
    }

    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// An interval with `start >= end` occupies nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn contains(&self, slot: i64) -> bool {
        slot >= self.start && slot < self.end
    }

    /// Whether two intervals share at least one slot.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Shifts both bounds by `offset` slots.
    pub fn shifted(&self, offset: i64) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    /// Clamps both bounds into `[0, horizon]`; `None` if nothing remains.
    pub fn clipped(&self, horizon: i64) -> Option<Self> {
        let clipped = Self::new(self.start.clamp(0, horizon), self.end.clamp(0, horizon));
        (!clipped.is_empty()).then_some(clipped)
    }
}

/// Blocked periods of a single resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calendar {
    /// Resource label the calendar belongs to.
    pub id: String,
    /// Slots during which the resource cannot be used.
    pub blocked: Vec<SlotInterval>,
}

impl Calendar {
    /// Creates a calendar with nothing blocked.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            blocked: Vec::new(),
        }
    }

    /// Adds a blocked interval.
    pub fn with_blocked(mut self, start: i64, end: i64) -> Self {
        self.block(SlotInterval::new(start, end));
        self
    }

    /// Adds a blocked interval in place. Empty intervals are ignored.
    pub fn block(&mut self, interval: SlotInterval) {
        if !interval.is_empty() {
            self.blocked.push(interval);
        }
    }

    pub fn is_free(&self, slot: i64) -> bool {
        !self.blocked.iter().any(|b| b.contains(slot))
    }

    /// First blocked interval overlapping `interval`, if any.
    pub fn conflict_with(&self, interval: &SlotInterval) -> Option<SlotInterval> {
        self.blocked.iter().copied().find(|b| b.overlaps(interval))
    }

    /// Number of blocked slots inside `[start, end)`, counting overlaps once.
    pub fn blocked_slots_in_range(&self, start: i64, end: i64) -> i64 {
        if end <= start {
            return 0;
        }
        let mut pieces: Vec<SlotInterval> = self
            .blocked
            .iter()
            .map(|b| SlotInterval::new(b.start.max(start), b.end.min(end)))
            .filter(|b| !b.is_empty())
            .collect();
        pieces.sort();

        let mut total = 0;
        let mut covered_until = start;
        for piece in pieces {
            let from = piece.start.max(covered_until);
            if piece.end > from {
                total += piece.end - from;
                covered_until = piece.end;
            }
        }
        total
    }
}
