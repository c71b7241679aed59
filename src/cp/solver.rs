//! The boundary with an external CP solver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{BoolVar, CpModel, IntVar, LinearExpr, Literal};
use crate::config::SolverParams;
use crate::error::Result;

/// Outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpStatus {
    /// Proven optimal assignment.
    Optimal,
    /// Feasible assignment, optimality not proven.
    Feasible,
    /// Proven that no assignment exists.
    Infeasible,
    /// Time budget exhausted without a solution or a proof.
    Unknown,
    /// The solver rejected the model.
    ModelInvalid,
}

impl CpStatus {
    /// Whether the status carries a usable assignment.
    pub fn has_solution(self) -> bool {
        matches!(self, CpStatus::Optimal | CpStatus::Feasible)
    }
}

impl std::fmt::Display for CpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CpStatus::Optimal => "OPTIMAL",
            CpStatus::Feasible => "FEASIBLE",
            CpStatus::Infeasible => "INFEASIBLE",
            CpStatus::Unknown => "UNKNOWN",
            CpStatus::ModelInvalid => "MODEL_INVALID",
        };
        f.write_str(s)
    }
}

/// An answer from the solver: a status and, when successful, one value per
/// model variable in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CpSolution {
    /// Solve status.
    pub status: CpStatus,
    /// Objective value, when the model has one and a solution exists.
    pub objective: Option<i64>,
    /// Variable values, empty without a solution.
    pub values: Vec<i64>,
    /// Time spent by the solver.
    pub wall_time: Duration,
}

impl CpSolution {
    /// An answer without an assignment.
    pub fn without_values(status: CpStatus) -> Self {
        Self {
            status,
            objective: None,
            values: Vec::new(),
            wall_time: Duration::ZERO,
        }
    }

    /// A successful answer; the objective is evaluated from the model.
    pub fn with_values(status: CpStatus, model: &CpModel, values: Vec<i64>) -> Self {
        let objective = model.objective().map(|o| o.evaluate(&values));
        Self {
            status,
            objective,
            values,
            wall_time: Duration::ZERO,
        }
    }

    pub fn value(&self, var: IntVar) -> i64 {
        self.values.get(var.index()).copied().unwrap_or(0)
    }

    pub fn bool_value(&self, var: BoolVar) -> bool {
        self.value(var.as_int()) != 0
    }

    pub fn literal_value(&self, literal: Literal) -> bool {
        literal.evaluate(&self.values)
    }

    pub fn evaluate(&self, expr: &LinearExpr) -> i64 {
        expr.evaluate(&self.values)
    }
}

/// What the solver should do after reporting an intermediate solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackControl {
    /// Keep searching.
    Continue,
    /// Stop and return the best solution so far.
    Stop,
}

/// Receives improving solutions while the solver runs.
pub trait SolutionCallback {
    fn on_solution(&mut self, solution: &CpSolution) -> CallbackControl;
}

impl<F> SolutionCallback for F
where
    F: FnMut(&CpSolution) -> CallbackControl,
{
    fn on_solution(&mut self, solution: &CpSolution) -> CallbackControl {
        self(solution)
    }
}

/// An external CP solver.
///
/// Implementations honour `params.max_time_seconds` and
/// `params.num_workers`, call `callback` for each improving solution when
/// one is supplied, and block until the search ends. Infeasibility is a
/// status, never an `Err`.
pub trait CpSolver {
    fn solve(
        &self,
        model: &CpModel,
        params: &SolverParams,
        callback: Option<&mut dyn SolutionCallback>,
    ) -> Result<CpSolution>;
}
