//! Linear integer expressions.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use super::{BoolVar, IntVar};

/// `sum(coef * var) + constant`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(IntVar, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// `coef * var`.
    pub fn term(var: IntVar, coef: i64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0,
        }
    }

    /// Unweighted sum of variables.
    pub fn sum<I: IntoIterator<Item = IntVar>>(vars: I) -> Self {
        Self::weighted_sum(vars.into_iter().map(|v| (v, 1)))
    }

    /// Weighted sum of variables.
    pub fn weighted_sum<I: IntoIterator<Item = (IntVar, i64)>>(terms: I) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0,
        }
    }

    pub fn terms(&self) -> &[(IntVar, i64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> i64 {
        self.constant
    }

    /// Whether the expression references no variable.
    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|&(_, coef)| coef == 0)
    }

    pub fn add_term(&mut self, var: IntVar, coef: i64) {
        self.terms.push((var, coef));
    }

    /// Value under a full assignment indexed by variable.
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values.get(var.0).copied().unwrap_or(0))
            .sum::<i64>()
            + self.constant
    }
}

impl From<IntVar> for LinearExpr {
    fn from(var: IntVar) -> Self {
        Self::term(var, 1)
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(var: BoolVar) -> Self {
        Self::term(var.as_int(), 1)
    }
}

impl From<i64> for LinearExpr {
    fn from(value: i64) -> Self {
        Self::constant(value)
    }
}

impl<T: Into<LinearExpr>> AddAssign<T> for LinearExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs: LinearExpr = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        let rhs: LinearExpr = rhs.into();
        self + (-rhs)
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(self, factor: i64) -> LinearExpr {
        Self {
            terms: self.terms.into_iter().map(|(v, c)| (v, c * factor)).collect(),
            constant: self.constant * factor,
        }
    }
}

impl<T: Into<LinearExpr>> Add<T> for IntVar {
    type Output = LinearExpr;

    fn add(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) + rhs
    }
}

impl<T: Into<LinearExpr>> Sub<T> for IntVar {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) - rhs
    }
}

impl Mul<i64> for IntVar {
    type Output = LinearExpr;

    fn mul(self, coef: i64) -> LinearExpr {
        LinearExpr::term(self, coef)
    }
}

impl Sum for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> Self {
        iter.fold(LinearExpr::default(), |acc, e| acc + e)
    }
}
