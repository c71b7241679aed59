//! The declarative CP model.

use std::collections::BTreeMap;

use super::{
    BoolVar, Constraint, ConstraintKind, IntVar, IntVarDef, IntervalDef, IntervalVar, LinearExpr,
    Literal,
};

/// Size summary of a [`CpModel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStats {
    /// Integer variables, booleans included.
    pub variables: usize,
    /// Boolean variables.
    pub booleans: usize,
    /// Interval variables.
    pub intervals: usize,
    /// Optional interval variables.
    pub optional_intervals: usize,
    /// Constraints of every kind.
    pub constraints: usize,
    /// Constraint count per kind tag.
    pub constraints_by_kind: BTreeMap<&'static str, usize>,
    /// Search hints.
    pub hints: usize,
}

/// A constraint that a candidate assignment does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Index of the violated constraint, if the failure is one.
    pub constraint: Option<usize>,
    /// Name of the violated constraint, variable or interval.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Arena of variables, intervals, constraints, hints and an objective.
///
/// The model is pure data: it is handed to a [`super::CpSolver`] to be
/// solved and to [`CpModel::check`] to verify an assignment.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    variables: Vec<IntVarDef>,
    intervals: Vec<IntervalDef>,
    constraints: Vec<Constraint>,
    hints: Vec<(IntVar, i64)>,
    objective: Option<LinearExpr>,
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- variables ----

    pub fn new_int_var(&mut self, lb: i64, ub: i64, name: impl Into<String>) -> IntVar {
        self.variables.push(IntVarDef {
            name: name.into(),
            lb,
            ub,
            is_bool: false,
        });
        IntVar(self.variables.len() - 1)
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.variables.push(IntVarDef {
            name: name.into(),
            lb: 0,
            ub: 1,
            is_bool: true,
        });
        BoolVar(self.variables.len() - 1)
    }

    /// Mandatory interval `[start, end)` of fixed `size`.
    pub fn new_interval_var(
        &mut self,
        start: impl Into<LinearExpr>,
        size: i64,
        end: impl Into<LinearExpr>,
        name: impl Into<String>,
    ) -> IntervalVar {
        self.push_interval(start.into(), size, end.into(), None, name.into())
    }

    /// Interval that only exists when `presence` is true.
    pub fn new_optional_interval_var(
        &mut self,
        start: impl Into<LinearExpr>,
        size: i64,
        end: impl Into<LinearExpr>,
        presence: impl Into<Literal>,
        name: impl Into<String>,
    ) -> IntervalVar {
        self.push_interval(start.into(), size, end.into(), Some(presence.into()), name.into())
    }

    /// Interval with a constant start.
    pub fn new_fixed_interval_var(
        &mut self,
        start: i64,
        size: i64,
        name: impl Into<String>,
    ) -> IntervalVar {
        self.push_interval(
            LinearExpr::constant(start),
            size,
            LinearExpr::constant(start + size),
            None,
            name.into(),
        )
    }

    fn push_interval(
        &mut self,
        start: LinearExpr,
        size: i64,
        end: LinearExpr,
        presence: Option<Literal>,
        name: String,
    ) -> IntervalVar {
        self.intervals.push(IntervalDef {
            name,
            start,
            size,
            end,
            presence,
        });
        IntervalVar(self.intervals.len() - 1)
    }

    // ---- constraints ----

    fn push(&mut self, kind: ConstraintKind) -> &mut Constraint {
        self.constraints.push(Constraint::new(kind));
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    /// `lb <= expr <= ub`.
    pub fn add_linear(&mut self, expr: impl Into<LinearExpr>, lb: i64, ub: i64) -> &mut Constraint {
        self.push(ConstraintKind::Linear {
            expr: expr.into(),
            lb,
            ub,
        })
    }

    /// `left == right`.
    pub fn add_eq(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> &mut Constraint {
        let (expr, rhs) = difference(left.into(), right.into());
        self.add_linear(expr, rhs, rhs)
    }

    /// `left >= right`.
    pub fn add_ge(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> &mut Constraint {
        let (expr, rhs) = difference(left.into(), right.into());
        self.add_linear(expr, rhs, i64::MAX)
    }

    /// `left <= right`.
    pub fn add_le(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> &mut Constraint {
        let (expr, rhs) = difference(left.into(), right.into());
        self.add_linear(expr, i64::MIN, rhs)
    }

    /// `left > right`.
    pub fn add_gt(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> &mut Constraint {
        let (expr, rhs) = difference(left.into(), right.into());
        self.add_linear(expr, rhs.saturating_add(1), i64::MAX)
    }

    /// `left < right`.
    pub fn add_lt(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> &mut Constraint {
        let (expr, rhs) = difference(left.into(), right.into());
        self.add_linear(expr, i64::MIN, rhs.saturating_sub(1))
    }

    /// `expr != value`.
    pub fn add_ne(&mut self, expr: impl Into<LinearExpr>, value: i64) -> &mut Constraint {
        let (expr, rhs) = difference(expr.into(), LinearExpr::constant(value));
        self.push(ConstraintKind::NotEqual { expr, value: rhs })
    }

    pub fn add_exactly_one<I, L>(&mut self, literals: I) -> &mut Constraint
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let literals = literals.into_iter().map(Into::into).collect();
        self.push(ConstraintKind::ExactlyOne(literals))
    }

    pub fn add_no_overlap<I>(&mut self, intervals: I) -> &mut Constraint
    where
        I: IntoIterator<Item = IntervalVar>,
    {
        self.push(ConstraintKind::NoOverlap(intervals.into_iter().collect()))
    }

    /// `target == expr % modulus`.
    pub fn add_modulo_equality(
        &mut self,
        target: IntVar,
        expr: impl Into<LinearExpr>,
        modulus: i64,
    ) -> &mut Constraint {
        self.push(ConstraintKind::Modulo {
            target,
            expr: expr.into(),
            modulus,
        })
    }

    /// `target == expr / divisor`.
    pub fn add_division_equality(
        &mut self,
        target: IntVar,
        expr: impl Into<LinearExpr>,
        divisor: i64,
    ) -> &mut Constraint {
        self.push(ConstraintKind::Division {
            target,
            expr: expr.into(),
            divisor,
        })
    }

    /// Two-branch equality: `target == if_true` when `selector` holds,
    /// `target == if_false` otherwise.
    pub fn add_branch_equality(
        &mut self,
        target: IntVar,
        selector: BoolVar,
        if_true: impl Into<LinearExpr>,
        if_false: impl Into<LinearExpr>,
    ) {
        self.add_eq(target, if_true).only_enforce_if(selector);
        self.add_eq(target, if_false).only_enforce_if(!selector);
    }

    /// `target == |expr|` without an absolute-value primitive.
    ///
    /// A sign indicator is reified against `expr >= 0` and selects between
    /// `target == expr` and `target == -expr`. Returns the indicator.
    pub fn add_abs_equality(
        &mut self,
        target: IntVar,
        expr: impl Into<LinearExpr>,
        name: &str,
    ) -> BoolVar {
        let expr = expr.into();
        let positive = self.new_bool_var(format!("{name}_positive"));
        self.add_ge(expr.clone(), 0_i64).only_enforce_if(positive);
        self.add_lt(expr.clone(), 0_i64).only_enforce_if(!positive);
        self.add_branch_equality(target, positive, expr.clone(), -expr);
        positive
    }

    // ---- search ----

    /// Non-binding search hint.
    pub fn add_hint(&mut self, var: IntVar, value: i64) {
        self.hints.push((var, value));
    }

    pub fn add_bool_hint(&mut self, var: BoolVar, value: bool) {
        self.hints.push((var.as_int(), i64::from(value)));
    }

    pub fn minimize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(expr.into());
    }

    // ---- accessors ----

    pub fn variables(&self) -> &[IntVarDef] {
        &self.variables
    }

    pub fn variable(&self, var: IntVar) -> &IntVarDef {
        &self.variables[var.0]
    }

    pub fn intervals(&self) -> &[IntervalDef] {
        &self.intervals
    }

    pub fn interval(&self, interval: IntervalVar) -> &IntervalDef {
        &self.intervals[interval.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn hints(&self) -> &[(IntVar, i64)] {
        &self.hints
    }

    pub fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn stats(&self) -> ModelStats {
        let mut by_kind = BTreeMap::new();
        for c in &self.constraints {
            *by_kind.entry(c.kind.tag()).or_insert(0) += 1;
        }
        ModelStats {
            variables: self.variables.len(),
            booleans: self.variables.iter().filter(|v| v.is_bool).count(),
            intervals: self.intervals.len(),
            optional_intervals: self.intervals.iter().filter(|i| i.is_optional()).count(),
            constraints: self.constraints.len(),
            constraints_by_kind: by_kind,
            hints: self.hints.len(),
        }
    }

    /// Evaluates every domain, interval and constraint against a full
    /// assignment (one value per variable, in declaration order).
    ///
    /// Returns the failures; an empty vector means the assignment is a
    /// solution of the model.
    pub fn check(&self, values: &[i64]) -> Vec<CheckFailure> {
        if values.len() != self.variables.len() {
            return vec![CheckFailure {
                constraint: None,
                name: "assignment".into(),
                reason: format!(
                    "expected {} values, got {}",
                    self.variables.len(),
                    values.len()
                ),
            }];
        }

        let mut failures = Vec::new();
        for (def, &value) in self.variables.iter().zip(values) {
            if !def.contains(value) {
                failures.push(CheckFailure {
                    constraint: None,
                    name: def.name.clone(),
                    reason: format!("value {value} outside [{}, {}]", def.lb, def.ub),
                });
            }
        }

        for interval in &self.intervals {
            if !interval.is_present(values) {
                continue;
            }
            let start = interval.start.evaluate(values);
            let end = interval.end.evaluate(values);
            if end != start + interval.size {
                failures.push(CheckFailure {
                    constraint: None,
                    name: interval.name.clone(),
                    reason: format!("end {end} != start {start} + size {}", interval.size),
                });
            }
        }

        for (index, constraint) in self.constraints.iter().enumerate() {
            if !constraint.is_enforced(values) {
                continue;
            }
            if let Some(reason) = self.violation(&constraint.kind, values) {
                failures.push(CheckFailure {
                    constraint: Some(index),
                    name: constraint.name.clone(),
                    reason,
                });
            }
        }
        failures
    }

    fn violation(&self, kind: &ConstraintKind, values: &[i64]) -> Option<String> {
        match kind {
            ConstraintKind::Linear { expr, lb, ub } => {
                let v = expr.evaluate(values);
                (v < *lb || v > *ub).then(|| format!("{v} outside [{lb}, {ub}]"))
            }
            ConstraintKind::NotEqual { expr, value } => {
                let v = expr.evaluate(values);
                (v == *value).then(|| format!("{v} equals forbidden value"))
            }
            ConstraintKind::ExactlyOne(literals) => {
                let count = literals.iter().filter(|l| l.evaluate(values)).count();
                (count != 1).then(|| format!("{count} literals true, expected exactly one"))
            }
            ConstraintKind::NoOverlap(intervals) => {
                let present: Vec<(i64, i64, &str)> = intervals
                    .iter()
                    .map(|&i| &self.intervals[i.0])
                    .filter(|def| def.is_present(values) && def.size > 0)
                    .map(|def| {
                        let start = def.start.evaluate(values);
                        (start, def.end.evaluate(values), def.name.as_str())
                    })
                    .collect();
                present.iter().enumerate().find_map(|(i, a)| {
                    present[i + 1..]
                        .iter()
                        .find(|b| a.0 < b.1 && b.0 < a.1)
                        .map(|b| {
                            format!(
                                "'{}' [{}, {}) overlaps '{}' [{}, {})",
                                a.2, a.0, a.1, b.2, b.0, b.1
                            )
                        })
                })
            }
            ConstraintKind::Modulo { target, expr, modulus } => {
                let expected = expr.evaluate(values).checked_rem(*modulus);
                let actual = values[target.0];
                (expected != Some(actual)).then(|| format!("{actual} != remainder {expected:?}"))
            }
            ConstraintKind::Division { target, expr, divisor } => {
                let expected = expr.evaluate(values).checked_div(*divisor);
                let actual = values[target.0];
                (expected != Some(actual)).then(|| format!("{actual} != quotient {expected:?}"))
            }
        }
    }
}

/// Rewrites `left - right` as `(variable part, -constant)` so that
/// `left op right` becomes `variable part op rhs`.
fn difference(left: LinearExpr, right: LinearExpr) -> (LinearExpr, i64) {
    let expr = left - right;
    let constant = expr.constant_term();
    (expr - constant, -constant)
}
