//! Declarative constraint-programming vocabulary.
//!
//! A [`CpModel`] is the only thing the timetabling encoder produces. It
//! speaks the vocabulary of interval-based CP solvers: bounded integer and
//! boolean variables, mandatory/optional/fixed intervals, linear range
//! constraints, not-equal, exactly-one, no-overlap, and modulo/division
//! equalities, every constraint optionally guarded by enforcement literals.
//!
//! Solving is delegated to an implementation of [`CpSolver`]; none ships
//! with this crate. [`CpModel::check`] evaluates a candidate assignment
//! against the whole model, which is how solver output is validated and
//! how the encoding is tested.
//!
//! # Reference
//! Laborie, Rogerie, Shaw & Vilím (2018), "IBM ILOG CP Optimizer for
//! Scheduling", *Constraints* 23(2).

mod constraint;
mod expr;
mod model;
mod solver;
mod variables;

pub use constraint::{Constraint, ConstraintKind};
pub use expr::LinearExpr;
pub use model::{CheckFailure, CpModel, ModelStats};
pub use solver::{CallbackControl, CpSolution, CpSolver, CpStatus, SolutionCallback};
pub use variables::{BoolVar, IntVar, IntVarDef, IntervalDef, IntervalVar, Literal};
