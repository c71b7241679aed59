//! Solve driver: build, solve, decode, write back.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{BuildOptions, SolverParams};
use crate::cp::{CallbackControl, CpSolution, CpSolver, CpStatus, ModelStats};
use crate::encoding::{TimetableCpBuilder, TimetableModel};
use crate::error::{Result, TimetableError};
use crate::models::{Project, Timetable};

/// Receives each improving timetable while the solver runs.
pub type ProgressSink<'a> = &'a mut dyn FnMut(&Timetable) -> CallbackControl;

/// Outcome of [`solve_project`].
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub status: CpStatus,
    /// Objective of the returned solution, if any.
    pub objective: Option<i64>,
    /// Decoded timetable; `None` unless the status is Feasible or Optimal.
    pub timetable: Option<Timetable>,
    /// Size of the solved model.
    pub stats: ModelStats,
    /// Intermediate solutions reported by the solver.
    pub solutions: usize,
    pub wall_time: Duration,
}

impl SolveReport {
    pub fn has_solution(&self) -> bool {
        self.timetable.is_some()
    }
}

/// Encodes `project`, solves it and, on a Feasible or Optimal answer, writes
/// starts and allocated resources back onto its activities.
///
/// Infeasible, Unknown and ModelInvalid answers are returned as a status
/// and leave the project untouched. Intermediate solutions are decoded and
/// handed to `progress`, whose answer decides whether the search goes on.
pub fn solve_project<S>(
    project: &mut Project,
    solver: &S,
    params: &SolverParams,
    options: &BuildOptions,
    progress: Option<ProgressSink<'_>>,
) -> Result<SolveReport>
where
    S: CpSolver + ?Sized,
{
    let built = TimetableCpBuilder::new(project).with_options(options.clone()).build()?;
    let stats = built.stats();

    info!(
        event = "solve_start",
        time_limit_s = params.max_time_seconds,
        workers = params.num_workers,
        variables = stats.variables,
        constraints = stats.constraints,
    );

    let started = Instant::now();
    let mut solutions = 0usize;
    let solution = {
        let mut progress = progress;
        let mut on_solution = |solution: &CpSolution| -> CallbackControl {
            solutions += 1;
            info!(event = "solution_found", index = solutions, objective = ?solution.objective);
            let Some(sink) = progress.as_deref_mut() else {
                return CallbackControl::Continue;
            };
            match built.decode_solution(solution) {
                Ok(timetable) => sink(&timetable),
                Err(err) => {
                    warn!(error = %err, "intermediate solution skipped");
                    CallbackControl::Continue
                }
            }
        };
        solver.solve(&built.model, params, Some(&mut on_solution))?
    };
    let wall_time = started.elapsed();

    let timetable = if solution.status.has_solution() {
        let timetable = accept(&built, &solution)?;
        timetable.apply_to(project);
        Some(timetable)
    } else {
        None
    };

    info!(
        event = "solve_end",
        status = %solution.status,
        objective = ?solution.objective,
        solutions,
        wall_time_ms = wall_time.as_millis() as u64,
    );

    Ok(SolveReport {
        status: solution.status,
        objective: solution.objective,
        timetable,
        stats,
        solutions,
        wall_time,
    })
}

/// Checks a successful answer against the model before decoding it.
fn accept(built: &TimetableModel, solution: &CpSolution) -> Result<Timetable> {
    let failures = built.model.check(&solution.values);
    if let Some(first) = failures.first() {
        return Err(TimetableError::Solver(format!(
            "{} solution violates {} constraint(s), first '{}': {}",
            solution.status,
            failures.len(),
            first.name,
            first.reason
        )));
    }
    built.decode_solution(solution)
}
