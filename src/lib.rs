//! University timetabling on top of a constraint-programming solver.
//!
//! Turns a declarative project (courses, activities, rooms, teachers,
//! students groups, unavailability and precedence) into a CP model with
//! interval variables, hands it to an external solver, and writes the
//! winning schedule back onto the project.
//!
//! # Modules
//!
//! - **`time`**: Slot grid, rounding, ISO-week conversion, week structure
//! - **`models`**: Domain types: `Project`, `Course`, `Activity`, `Resource`,
//!   `StudentsGroup`, `StaticActivity`, `Timetable`
//! - **`cp`**: Declarative CP vocabulary (`CpModel`, `CpSolver`) and an
//!   assignment checker
//! - **`encoding`**: Project to `CpModel` translation (`TimetableCpBuilder`)
//! - **`scheduler`**: Solve driver and load-balance KPIs
//! - **`validation`**: Input integrity checks and timetable audit
//! - **`config`**: Project setup, solver parameters, build options
//!
//! # Architecture
//!
//! The crate contains no search engine. Any solver speaking the
//! interval/no-overlap/exactly-one vocabulary can implement
//! [`cp::CpSolver`]; model construction and result mapping live here.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Cormen et al. (2009), "Introduction to Algorithms"

pub mod config;
pub mod cp;
pub mod encoding;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod time;
pub mod validation;

pub use config::{BuildOptions, ProjectSetup, SolverParams};
pub use encoding::{TimetableCpBuilder, TimetableModel};
pub use error::{Result, TimetableError};
pub use scheduler::{solve_project, LoadBalanceKpi, SolveReport};
pub use validation::{validate_project, verify_timetable};
