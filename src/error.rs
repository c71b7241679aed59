//! Error types for model construction and solving.
//!
//! Construction errors abort a run before the solver is called and always
//! name the offending activity, group or students group. Infeasibility is
//! not an error: it is reported through [`crate::cp::CpStatus`].

use thiserror::Error;

use crate::config::ConfigError;
use crate::time::TimeError;

/// Main error type for timetabling operations.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// An activity asks for more resources than its pool holds.
    #[error(
        "activity '{activity}' requests {requested} {resource} but only {available} are in its pool"
    )]
    ResourceCountExceedsPool {
        /// Activity label.
        activity: String,
        /// `"rooms"` or `"teachers"`.
        resource: &'static str,
        /// Requested simultaneous count.
        requested: usize,
        /// Size of the candidate pool.
        available: usize,
    },

    /// A precedence edge names a group found in neither the inner nor the foreign table.
    #[error("course '{course}' references unknown activity group '{group}'")]
    UnknownActivityGroup {
        /// Declaring course.
        course: String,
        /// Group reference as written.
        group: String,
    },

    /// An activity group lists an activity that does not exist.
    #[error("activity group '{group}' references unknown activity '{activity}'")]
    UnknownActivity {
        /// Group label.
        group: String,
        /// Missing activity label.
        activity: String,
    },

    /// An activity references an undefined activity kind.
    #[error("activity '{activity}' has unknown kind '{kind}'")]
    UnknownActivityKind {
        /// Activity label.
        activity: String,
        /// Missing kind label.
        kind: String,
    },

    /// An activity or static activity references an undefined students group.
    #[error("'{owner}' references unknown students group '{group}'")]
    UnknownStudentsGroup {
        /// Activity or static activity label.
        owner: String,
        /// Missing students group label.
        group: String,
    },

    /// Alternative enumeration exceeded the configured hard limit.
    #[error("activity '{activity}' has {count} resource alternatives, above the limit of {limit}")]
    TooManyAlternatives {
        /// Activity label.
        activity: String,
        /// Number of (room, teacher) combinations.
        count: u128,
        /// Configured limit.
        limit: u128,
    },

    /// Temporal conversion failure.
    #[error(transparent)]
    Time(#[from] TimeError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The external solver failed.
    #[error("solver error: {0}")]
    Solver(String),

    /// A solver answer could not be mapped back onto an activity.
    #[error("inconsistent solution for activity '{activity}': {reason}")]
    InconsistentSolution {
        /// Activity label.
        activity: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type alias for timetabling operations.
pub type Result<T> = std::result::Result<T, TimetableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = TimetableError::ResourceCountExceedsPool {
            activity: "MATH501_CM1".into(),
            resource: "teachers",
            requested: 2,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("MATH501_CM1"));
        assert!(msg.contains("2 teachers"));

        let err = TimetableError::UnknownActivityGroup {
            course: "MECA551".into(),
            group: "TP".into(),
        };
        assert!(err.to_string().contains("'TP'"));
    }

    #[test]
    fn test_time_error_converts() {
        let err: TimetableError = TimeError::InvalidDuration("3x".into()).into();
        assert!(matches!(err, TimetableError::Time(_)));
        assert_eq!(err.to_string(), "invalid duration '3x'");
    }
}
