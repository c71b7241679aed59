//! CP variable handles and their definitions.
//!
//! Handles are plain indices into the owning [`super::CpModel`] arenas and
//! are `Copy`. Booleans share the integer arena (domain `[0, 1]`), so a
//! [`BoolVar`] can be used wherever an integer expression is expected.

use std::ops::Not;

use super::LinearExpr;

/// An integer variable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    /// Position in the model's variable arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A boolean variable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    pub fn index(self) -> usize {
        self.0
    }

    /// The same variable viewed as a 0/1 integer.
    pub fn as_int(self) -> IntVar {
        IntVar(self.0)
    }
}

impl Not for BoolVar {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self,
            negated: true,
        }
    }
}

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    var: BoolVar,
    negated: bool,
}

impl Literal {
    pub fn var(self) -> BoolVar {
        self.var
    }

    pub fn is_negated(self) -> bool {
        self.negated
    }

    /// Truth value under a full assignment.
    pub fn evaluate(self, values: &[i64]) -> bool {
        let set = values.get(self.var.0).copied().unwrap_or(0) != 0;
        set != self.negated
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Self {
        Self {
            var,
            negated: false,
        }
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

/// An interval variable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalVar(pub(crate) usize);

impl IntervalVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Definition of an integer (or boolean) variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVarDef {
    /// Variable name.
    pub name: String,
    /// Lower bound (inclusive).
    pub lb: i64,
    /// Upper bound (inclusive).
    pub ub: i64,
    /// Whether the variable was declared as a boolean.
    pub is_bool: bool,
}

impl IntVarDef {
    /// Whether `value` lies in the domain.
    pub fn contains(&self, value: i64) -> bool {
        value >= self.lb && value <= self.ub
    }

    pub fn is_fixed(&self) -> bool {
        self.lb == self.ub
    }
}

/// Definition of an interval variable.
///
/// The solver maintains `end = start + size` whenever the interval is
/// present. Optional intervals carry a presence literal; an absent interval
/// constrains nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalDef {
    /// Interval name.
    pub name: String,
    /// Start expression.
    pub start: LinearExpr,
    /// Fixed size.
    pub size: i64,
    /// End expression.
    pub end: LinearExpr,
    /// Presence literal for optional intervals.
    pub presence: Option<Literal>,
}

impl IntervalDef {
    pub fn is_optional(&self) -> bool {
        self.presence.is_some()
    }

    /// Whether the interval is present under a full assignment.
    pub fn is_present(&self, values: &[i64]) -> bool {
        self.presence.map_or(true, |lit| lit.evaluate(values))
    }
}
