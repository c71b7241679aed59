//! Load-balance objective.
//!
//! For every atomic student and every week of the horizon, the objective
//! measures how far the student's scheduled duration in that week is from
//! the student's mean weekly duration, and sums these absolute residuals.
//!
//! Everything stays linear: the week of an activity comes from a division
//! equality, the per-week contribution is a two-branch equality selected by
//! an "is in week i" indicator, and each absolute residual is built from a
//! sign indicator and two branch equalities.

use std::collections::BTreeMap;

use tracing::debug;

use super::activities::ActivityVars;
use crate::cp::{CpModel, IntVar, LinearExpr};
use crate::time::SlotGrid;

/// Variables of the load-balance objective.
#[derive(Debug, Clone)]
pub struct LoadBalanceVars {
    /// Total cost, minimized.
    pub cost: IntVar,
    /// Atomic students contributing to the cost.
    pub students: Vec<String>,
    /// Week index variable per activity with students, in activity order.
    pub weeks: Vec<IntVar>,
}

/// Builds the load-balance cost, registers it as the objective and returns
/// its variables. Returns `None` when no activity has students.
pub fn add_load_balance(
    model: &mut CpModel,
    grid: &SlotGrid,
    activities: &[ActivityVars],
) -> Option<LoadBalanceVars> {
    let max_weeks = grid.max_weeks();
    let spw = grid.slots_per_week();
    let oms = grid.origin_monday_slot();

    // Per-week contributions and constant total per student.
    let mut per_week: BTreeMap<&str, Vec<Vec<IntVar>>> = BTreeMap::new();
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    let mut weeks = Vec::with_capacity(activities.len());

    for vars in activities.iter().filter(|v| !v.students.is_empty()) {
        let id = &vars.id;
        let week = model.new_int_var(0, max_weeks, format!("{id}_week"));
        model.add_division_equality(week, vars.start - oms, spw);
        weeks.push(week);

        let duration = vars.duration.max(0);
        for i in 0..max_weeks {
            let is_week = model.new_bool_var(format!("{id}_is_week{i}"));
            model.add_eq(week, i).only_enforce_if(is_week);
            model.add_ne(week, i).only_enforce_if(!is_week);
            let on_week = model.new_int_var(0, duration, format!("{id}_duration_week{i}"));
            model.add_branch_equality(on_week, is_week, duration, 0_i64);
            for student in &vars.students {
                per_week
                    .entry(student.as_str())
                    .or_insert_with(|| vec![Vec::new(); max_weeks as usize])[i as usize]
                    .push(on_week);
            }
        }
        for student in &vars.students {
            *totals.entry(student.as_str()).or_insert(0) += duration;
        }
    }

    // Students without any contribution never enter `per_week`.
    if per_week.is_empty() {
        return None;
    }

    let mut residuals = Vec::new();
    let mut cost_bound: i64 = 0;
    for (student, week_terms) in &per_week {
        let total = totals.get(student).copied().unwrap_or(0);
        let mean = model.new_int_var(0, total, format!("{student}_mean_week_duration"));
        model.add_division_equality(mean, total, max_weeks);

        for (i, terms) in week_terms.iter().enumerate() {
            let week_sum = LinearExpr::sum(terms.iter().copied());
            let name = format!("{student}_residual_week{i}");
            let residual = model.new_int_var(0, total, name.clone());
            model.add_abs_equality(residual, week_sum - mean, &name);
            residuals.push(residual);
            cost_bound = cost_bound.saturating_add(total);
        }
    }

    let cost = model.new_int_var(0, cost_bound, "load_balance_cost");
    model.add_eq(cost, LinearExpr::sum(residuals.iter().copied()));
    model.minimize(cost);

    debug!(
        stage = "objective",
        students = per_week.len(),
        weeks = max_weeks,
        residuals = residuals.len(),
    );

    Some(LoadBalanceVars {
        cost,
        students: per_week.keys().map(|s| s.to_string()).collect(),
        weeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::activities::encode_activity;
    use crate::encoding::IntervalMap;
    use crate::models::Activity;
    use chrono::NaiveDate;

    fn grid(weeks: i64) -> SlotGrid {
        let origin = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        SlotGrid::with_minutes(origin, 15, weeks * 672).unwrap()
    }

    fn encode(
        model: &mut CpModel,
        grid: &SlotGrid,
        activities: &[(Activity, Vec<String>)],
    ) -> Vec<ActivityVars> {
        let mut map = IntervalMap::new();
        activities
            .iter()
            .map(|(a, students)| {
                encode_activity(model, a, students, grid.horizon(), None, &mut map).unwrap()
            })
            .collect()
    }

    /// Full assignment for activities all attended by `G1` alone, every
    /// derived variable set the way its constraints define it.
    fn assignment(model: &CpModel, vars: &[ActivityVars], starts: &[i64], weeks: i64) -> Vec<i64> {
        let pos = |name: &str| model.variables().iter().position(|d| d.name == name).unwrap();
        let mut values = vec![0; model.num_variables()];
        let mut week_sums = vec![0; weeks as usize];
        let mut total = 0;
        for (v, &s) in vars.iter().zip(starts) {
            values[v.start.index()] = s;
            values[v.end.index()] = s + v.duration;
            let alt = &v.alternatives[0];
            values[alt.presence.index()] = 1;
            values[alt.start.index()] = s;
            values[alt.end.index()] = s + v.duration;

            let week = s / 672;
            values[pos(&format!("{}_week", v.id))] = week;
            for i in 0..weeks {
                values[pos(&format!("{}_is_week{i}", v.id))] = i64::from(week == i);
                if week == i {
                    values[pos(&format!("{}_duration_week{i}", v.id))] = v.duration;
                    week_sums[i as usize] += v.duration;
                }
            }
            total += v.duration;
        }

        let mean = total / weeks;
        values[pos("G1_mean_week_duration")] = mean;
        let mut cost = 0;
        for (i, sum) in week_sums.iter().enumerate() {
            let residual = sum - mean;
            values[pos(&format!("G1_residual_week{i}"))] = residual.abs();
            values[pos(&format!("G1_residual_week{i}_positive"))] = i64::from(residual >= 0);
            cost += residual.abs();
        }
        values[pos("load_balance_cost")] = cost;
        values
    }

    #[test]
    fn test_no_students_no_objective() {
        let g = grid(2);
        let mut model = CpModel::new();
        let vars = encode(&mut model, &g, &[(Activity::new("A", "CM", 4), vec![])]);
        assert!(add_load_balance(&mut model, &g, &vars).is_none());
        assert!(model.objective().is_none());
    }

    #[test]
    fn test_structure() {
        let g = grid(3);
        let mut model = CpModel::new();
        let vars = encode(
            &mut model,
            &g,
            &[
                (Activity::new("A", "CM", 4), vec!["G1".into()]),
                (Activity::new("B", "CM", 8), vec!["G1".into(), "G2".into()]),
            ],
        );
        let lb = add_load_balance(&mut model, &g, &vars).unwrap();
        assert_eq!(lb.students, vec!["G1", "G2"]);
        assert_eq!(lb.weeks.len(), 2);
        assert_eq!(model.objective(), Some(&LinearExpr::from(lb.cost)));

        let stats = model.stats();
        // Per activity: 1 week division; per student: 1 mean division.
        assert_eq!(stats.constraints_by_kind["division"], 2 + 2);
        // 3 weeks x 2 activities indicators, 3 weeks x 2 students signs,
        // plus the two alternative presences.
        assert_eq!(stats.booleans, 6 + 6 + 2);
    }

    #[test]
    fn test_cost_of_a_balanced_and_an_unbalanced_plan() {
        let g = grid(2);
        let mut model = CpModel::new();
        let vars = encode(
            &mut model,
            &g,
            &[
                (Activity::new("A", "CM", 4), vec!["G1".into()]),
                (Activity::new("B", "CM", 4), vec!["G1".into()]),
            ],
        );
        let lb = add_load_balance(&mut model, &g, &vars).unwrap();

        // One activity per week: mean 4, residuals 0.
        let values = assignment(&model, &vars, &[0, 672], 2);
        assert!(model.check(&values).is_empty());
        assert_eq!(values[lb.cost.index()], 0);

        // Both in week 0: residuals |8 - 4| + |0 - 4|.
        let mut values = assignment(&model, &vars, &[0, 100], 2);
        assert!(model.check(&values).is_empty());
        assert_eq!(values[lb.cost.index()], 8);

        // Understating the cost is caught.
        values[lb.cost.index()] = 4;
        assert_eq!(model.check(&values).len(), 1);
    }
}
