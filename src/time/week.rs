//! Weekly opening-hours template.
//!
//! The template is a 7 × `slots_per_day` bitmap (Monday first) where `1`
//! marks an available slot. Zero-runs become forbidden intervals that are
//! replicated over every week of the horizon.

use serde::{Deserialize, Serialize};

use super::{SlotGrid, SlotInterval, TimeError};

/// Availability bitmap for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct WeekStructure {
    slots_per_day: usize,
    /// Day-major availability, `7 * slots_per_day` entries.
    available: Vec<bool>,
}

impl WeekStructure {
    /// A week with every slot available.
    pub fn always_available(slots_per_day: usize) -> Self {
        Self {
            slots_per_day,
            available: vec![true; 7 * slots_per_day],
        }
    }

    /// Parses seven rows of `0`/`1` characters. Whitespace is ignored.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, TimeError> {
        if rows.len() != 7 {
            return Err(TimeError::InvalidWeekStructure(format!(
                "expected 7 rows, got {}",
                rows.len()
            )));
        }

        let mut available = Vec::new();
        let mut slots_per_day = None;
        for (day, row) in rows.iter().enumerate() {
            let mut count = 0;
            for c in row.as_ref().chars().filter(|c| !c.is_whitespace()) {
                available.push(match c {
                    '1' => true,
                    '0' => false,
                    other => {
                        return Err(TimeError::InvalidWeekStructure(format!(
                            "unexpected character '{other}' on day {}",
                            day + 1
                        )))
                    }
                });
                count += 1;
            }
            match slots_per_day {
                None if count == 0 => {
                    return Err(TimeError::InvalidWeekStructure("empty row".into()));
                }
                None => slots_per_day = Some(count),
                Some(expected) if expected != count => {
                    return Err(TimeError::InvalidWeekStructure(format!(
                        "day {} has {count} slots, expected {expected}",
                        day + 1
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            slots_per_day: slots_per_day.unwrap_or_default(),
            available,
        })
    }

    /// Marks `[from, to)` unavailable on every day.
    pub fn with_daily_break(mut self, from: usize, to: usize) -> Self {
        for day in 0..7 {
            self.block(day, from, to);
        }
        self
    }

    /// Marks the whole of `day` (0 = Monday) unavailable.
    pub fn with_closed_day(mut self, day: usize) -> Self {
        self.block(day, 0, self.slots_per_day);
        self
    }

    fn block(&mut self, day: usize, from: usize, to: usize) {
        if day >= 7 {
            return;
        }
        let base = day * self.slots_per_day;
        for slot in from.min(self.slots_per_day)..to.min(self.slots_per_day) {
            self.available[base + slot] = false;
        }
    }

    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    pub fn slots_per_week(&self) -> usize {
        self.available.len()
    }

    /// Whether `day_slot` of `day` (0 = Monday) is open.
    pub fn is_available(&self, day: usize, day_slot: usize) -> bool {
        day < 7
            && day_slot < self.slots_per_day
            && self.available[day * self.slots_per_day + day_slot]
    }

    /// Whether the week-relative slot offset is open.
    pub fn is_available_at(&self, week_slot: i64) -> bool {
        let len = self.available.len() as i64;
        len == 0 || self.available[week_slot.rem_euclid(len) as usize]
    }

    /// Forbidden runs as `(start, end)` offsets from Monday 00:00.
    ///
    /// A run closing Sunday and a run opening Monday are merged into one run
    /// whose end exceeds `slots_per_week`.
    pub fn forbidden_runs(&self) -> Vec<(i64, i64)> {
        let len = self.available.len() as i64;
        let mut runs = Vec::new();
        let mut run_start = None;
        for (i, &open) in self.available.iter().enumerate() {
            match (open, run_start) {
                (false, None) => run_start = Some(i as i64),
                (true, Some(start)) => {
                    runs.push((start, i as i64));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            runs.push((start, len));
        }

        let wraps = runs.len() >= 2
            && runs.first().is_some_and(|r| r.0 == 0)
            && runs.last().is_some_and(|r| r.1 == len);
        if wraps {
            let head = runs.remove(0);
            if let Some(tail) = runs.last_mut() {
                tail.1 = len + head.1;
            }
        }
        runs
    }

    /// Forbidden runs replicated over the grid's weeks and clipped to the horizon.
    ///
    /// Replication starts one week before the origin's Monday so that a run
    /// wrapping from Sunday into Monday still covers the first Monday.
    pub fn forbidden_intervals(&self, grid: &SlotGrid) -> Vec<SlotInterval> {
        let runs = self.forbidden_runs();
        let week = grid.slots_per_week();
        let base = grid.origin_monday_slot();
        (-1..grid.max_weeks())
            .flat_map(|w| {
                runs.iter().map(move |&(start, end)| {
                    SlotInterval::new(start, end).shifted(base + w * week)
                })
            })
            .filter_map(|interval| interval.clipped(grid.horizon()))
            .collect()
    }

    /// Renders the bitmap as seven `0`/`1` rows.
    pub fn to_rows(&self) -> Vec<String> {
        self.available
            .chunks(self.slots_per_day.max(1))
            .map(|day| day.iter().map(|&open| if open { '1' } else { '0' }).collect())
            .collect()
    }
}

impl TryFrom<Vec<String>> for WeekStructure {
    type Error = TimeError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows[..])
    }
}

impl From<WeekStructure> for Vec<String> {
    fn from(week: WeekStructure) -> Self {
        week.to_rows()
    }
}
