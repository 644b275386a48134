//! LP Solver

use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable, variable};
use num_traits::ToPrimitive;
use smallvec::SmallVec;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::{
    constraints::Constraints,
    order::BulkOrder,
    solvers::{
        Optimization, Regime, Solver, SolverError, SolverSettings, feasible_budget, finish,
        observer::SolveObserver,
    },
};

/// Solver using Linear Programming (LP)
///
/// The problem is linear in the discounts, so the whole optimisation is a single LP:
///
/// ```text
/// maximise   sum(q_i * d_i)
/// subject to sum(q_i * P_i * d_i) <= budget
///            0 <= d_i <= max_discount
/// ```
///
/// Coefficients are normalised by total quantity and total retail value so the backend
/// never sees the raw magnitudes of very large orders.
#[derive(Debug)]
pub struct LpSolver;

impl Solver for LpSolver {
    fn solve_with_observer<O: SolveObserver + ?Sized>(
        order: &BulkOrder,
        constraints: &Constraints,
        settings: &SolverSettings,
        observer: &mut O,
    ) -> Result<Optimization, SolverError> {
        let budget = feasible_budget(order, constraints, observer)?;
        let max_discount = constraints.max_discount();

        let total_quantity = total_quantity(order)?;
        let total_retail_value = budget.total_retail_value;

        let mut pb = ProblemVariables::new();

        let discount_vars: SmallVec<[Variable; 8]> = order
            .iter()
            .map(|_| pb.add(variable().min(0.0).max(max_discount)))
            .collect();

        // Objective: share of total volume discounted, weighted by discount depth.
        let mut objective = Expression::default();

        // Constraint: share of total retail value given away as discount.
        let mut spend = Expression::default();

        for (product, &var) in order.iter().zip(discount_vars.iter()) {
            let quantity = product.quantity_f64().ok_or(SolverError::InvariantViolation {
                message: "quantity not representable after validation",
            })?;

            objective += var * (quantity / total_quantity);
            spend += var * (quantity * product.max_retail_price / total_retail_value);
        }

        let normalised_budget = budget.budget.max(0.0) / total_retail_value;

        let solution = pb
            .maximise(objective)
            .using(default_solver)
            .with(spend.leq(normalised_budget))
            .solve()?;

        // Backends may overshoot bounds by a rounding error.
        let discounts: SmallVec<[f64; 8]> = discount_vars
            .iter()
            .map(|&var| solution.value(var).clamp(0.0, max_discount))
            .collect();

        let regime = if budget.is_slack() {
            Regime::Slack
        } else {
            Regime::Binding
        };

        finish(order, constraints, settings, discounts, regime, 1, observer)
    }
}

/// Sum of quantities across the order, as a solver coefficient.
///
/// A validated order has positive retail value, so at least one quantity is non-zero.
fn total_quantity(order: &BulkOrder) -> Result<f64, SolverError> {
    let total = order
        .iter()
        .try_fold(0_u64, |acc, product| acc.checked_add(product.quantity))
        .and_then(|total| total.to_f64())
        .ok_or(SolverError::InvariantViolation {
            message: "total quantity overflowed",
        })?;

    if total <= 0.0 {
        return Err(SolverError::InvariantViolation {
            message: "order with retail value has no quantity",
        });
    }

    Ok(total)
}
