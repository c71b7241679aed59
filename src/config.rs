//! Project setup, solver parameters and build options.
//!
//! Setup and solver parameters load from TOML or YAML:
//!
//! ```
//! use u_timetable::config::ProjectSetup;
//!
//! let setup = ProjectSetup::from_toml_str(r#"
//!     origin = "2024-W36-1 08:00"
//!     horizon = 8064
//!     slot_minutes = 15
//! "#).unwrap();
//!
//! let grid = setup.grid().unwrap();
//! assert_eq!(grid.slots_per_week(), 672);
//! assert_eq!(setup.succession_relaxation_factor, 1.0);
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{SlotGrid, TimeError, WeekStructure};

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub(crate) fn read_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

pub(crate) fn read_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Serde adapter accepting every datetime format of [`crate::time::parse_datetime`].
mod datetime_text {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::time::parse_datetime(&text).map_err(serde::de::Error::custom)
    }
}

fn default_slot_minutes() -> i64 {
    15
}

fn default_relaxation_factor() -> f64 {
    1.0
}

/// Project-level calendar setup, fixed once per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSetup {
    /// Instant of slot 0.
    #[serde(with = "datetime_text")]
    pub origin: NaiveDateTime,
    /// Number of slots in the planning window.
    pub horizon: i64,
    /// Slot duration in minutes.
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i64,
    /// Weekly opening hours; every slot open when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_structure: Option<WeekStructure>,
    /// Loosening applied to precedence offsets before solving.
    #[serde(default = "default_relaxation_factor")]
    pub succession_relaxation_factor: f64,
}

impl ProjectSetup {
    pub fn new(origin: NaiveDateTime, horizon: i64) -> Self {
        Self {
            origin,
            horizon,
            slot_minutes: default_slot_minutes(),
            week_structure: None,
            succession_relaxation_factor: default_relaxation_factor(),
        }
    }

    pub fn with_slot_minutes(mut self, minutes: i64) -> Self {
        self.slot_minutes = minutes;
        self
    }

    pub fn with_week_structure(mut self, week: WeekStructure) -> Self {
        self.week_structure = Some(week);
        self
    }

    pub fn with_relaxation_factor(mut self, factor: f64) -> Self {
        self.succession_relaxation_factor = factor;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_yaml(path)
    }

    /// The slot grid described by this setup.
    pub fn grid(&self) -> Result<SlotGrid, TimeError> {
        SlotGrid::with_minutes(self.origin, self.slot_minutes, self.horizon)
    }

    /// Weekly template, defaulting to always open on the grid's day length.
    pub fn week_structure(&self, grid: &SlotGrid) -> WeekStructure {
        self.week_structure
            .clone()
            .unwrap_or_else(|| WeekStructure::always_available(grid.slots_per_day() as usize))
    }

    /// Checks value ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon <= 0 {
            return Err(ConfigError::Invalid(format!(
                "horizon must be positive, got {}",
                self.horizon
            )));
        }
        let grid = self
            .grid()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let factor = self.succession_relaxation_factor;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "succession_relaxation_factor must be positive, got {}",
                self.succession_relaxation_factor
            )));
        }
        if let Some(week) = &self.week_structure {
            if week.slots_per_day() as i64 != grid.slots_per_day() {
                return Err(ConfigError::Invalid(format!(
                    "week structure has {} slots per day, grid has {}",
                    week.slots_per_day(),
                    grid.slots_per_day()
                )));
            }
        }
        Ok(())
    }
}

fn default_max_time_seconds() -> f64 {
    120.0
}

fn default_num_workers() -> usize {
    8
}

/// Budget and knobs handed to the external solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Wall-clock budget in seconds.
    #[serde(default = "default_max_time_seconds")]
    pub max_time_seconds: f64,
    /// Number of parallel search workers.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Seed for reproducible searches.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Ask the solver to log its search.
    #[serde(default)]
    pub log_search_progress: bool,
    /// Stop after this many improving solutions.
    #[serde(default)]
    pub solution_limit: Option<usize>,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_time_seconds: default_max_time_seconds(),
            num_workers: default_num_workers(),
            random_seed: None,
            log_search_progress: false,
            solution_limit: None,
        }
    }
}

impl SolverParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_time_seconds(mut self, seconds: f64) -> Self {
        self.max_time_seconds = seconds;
        self
    }

    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_solution_limit(mut self, limit: usize) -> Self {
        self.solution_limit = Some(limit);
        self
    }

    /// Wall-clock budget; non-finite or negative values count as zero.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_time_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_yaml(path)
    }
}

/// Options controlling model construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Add the load-balance objective.
    #[serde(default = "default_with_objective")]
    pub with_objective: bool,
    /// Hard limit on resource alternatives per activity.
    #[serde(default)]
    pub max_alternatives: Option<u64>,
}

fn default_with_objective() -> bool {
    true
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            with_objective: true,
            max_alternatives: None,
        }
    }
}

impl BuildOptions {
    /// Feasibility-only model.
    pub fn without_objective(mut self) -> Self {
        self.with_objective = false;
        self
    }

    pub fn with_max_alternatives(mut self, limit: u64) -> Self {
        self.max_alternatives = Some(limit);
        self
    }
}
