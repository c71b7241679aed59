//! Constraint records.

use super::{IntVar, IntervalVar, LinearExpr, Literal};

/// What a constraint requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `lb <= expr <= ub`.
    Linear {
        /// Constrained expression.
        expr: LinearExpr,
        /// Lower bound.
        lb: i64,
        /// Upper bound.
        ub: i64,
    },
    /// `expr != value`.
    NotEqual {
        /// Constrained expression.
        expr: LinearExpr,
        /// Excluded value.
        value: i64,
    },
    /// Exactly one literal is true.
    ExactlyOne(Vec<Literal>),
    /// Present intervals pairwise do not overlap.
    NoOverlap(Vec<IntervalVar>),
    /// `target == expr % modulus`, remainder truncated toward zero.
    Modulo {
        /// Result variable.
        target: IntVar,
        /// Dividend.
        expr: LinearExpr,
        /// Positive modulus.
        modulus: i64,
    },
    /// `target == expr / divisor`, quotient truncated toward zero.
    Division {
        /// Result variable.
        target: IntVar,
        /// Dividend.
        expr: LinearExpr,
        /// Positive divisor.
        divisor: i64,
    },
}

impl ConstraintKind {
    /// Short tag used in statistics and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            ConstraintKind::Linear { .. } => "linear",
            ConstraintKind::NotEqual { .. } => "not_equal",
            ConstraintKind::ExactlyOne(_) => "exactly_one",
            ConstraintKind::NoOverlap(_) => "no_overlap",
            ConstraintKind::Modulo { .. } => "modulo",
            ConstraintKind::Division { .. } => "division",
        }
    }
}

/// A constraint with optional enforcement literals.
///
/// The constraint only has to hold when every enforcement literal is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Optional name, used in diagnostics.
    pub name: String,
    /// Requirement.
    pub kind: ConstraintKind,
    /// Conjunction of literals guarding the constraint.
    pub enforcement: Vec<Literal>,
}

impl Constraint {
    pub(crate) fn new(kind: ConstraintKind) -> Self {
        Self {
            name: String::new(),
            kind,
            enforcement: Vec::new(),
        }
    }

    /// Guards the constraint by `literal`. Chain calls for conjunctions.
    pub fn only_enforce_if(&mut self, literal: impl Into<Literal>) -> &mut Self {
        self.enforcement.push(literal.into());
        self
    }

    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Whether the enforcement literals hold under `values`.
    pub fn is_enforced(&self, values: &[i64]) -> bool {
        self.enforcement.iter().all(|lit| lit.evaluate(values))
    }
}
