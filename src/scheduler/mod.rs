//! Solve driving and timetable KPIs.
//!
//! [`solve_project`] encodes a project, hands the model to an external
//! [`crate::cp::CpSolver`], validates and decodes the answer, and writes
//! the winning starts and resources back onto the project.
//!
//! # KPI
//!
//! [`LoadBalanceKpi`] recomputes the weekly load-balance residual of each
//! atomic student from a timetable, together with room and teacher
//! occupation.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod driver;
mod kpi;

pub use driver::{solve_project, ProgressSink, SolveReport};
pub use kpi::{LoadBalanceKpi, StudentLoad};
