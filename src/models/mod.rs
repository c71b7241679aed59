//! Timetabling domain models.
//!
//! Provides the data types describing a timetabling problem (what has to be
//! placed, with which resources, under which precedence and availability
//! rules) and its solution.
//!
//! # Domain Mappings
//!
//! | u-timetable | University | Training center | Conference |
//! |-------------|------------|-----------------|------------|
//! | Course | Teaching module | Program | Track |
//! | Activity | Lecture/Tutorial/Lab | Session | Talk |
//! | Resource | Room/Teacher | Room/Trainer | Hall/Speaker |
//! | StudentsGroup | Class/Section | Cohort | Audience |
//! | Timetable | Semester timetable | Training plan | Program grid |

mod activity;
mod course;
mod group;
mod kind;
mod project;
mod resource;
mod schedule;
mod static_activity;
mod students;
mod unavailability;

pub use activity::{Activity, ResourcePool};
pub use course::Course;
pub use group::{ActivityGroup, GroupRef, StartsAfterConstraint};
pub use kind::ActivityKind;
pub use project::Project;
pub use resource::{Resource, ResourceKind};
pub use schedule::{Placement, Timetable, Violation, ViolationType};
pub use static_activity::{StaticActivity, StaticOrigin};
pub use students::StudentsGroup;
pub use unavailability::UnavailabilityWindow;
