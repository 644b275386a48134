//! Solvers for Discount Optimisation

use good_lp::ResolutionError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    constraints::{Constraints, MarginBudget},
    order::{BulkOrder, InvalidInputError},
    pricing::evaluate,
    solvers::{greedy::GreedySolver, lp::LpSolver, observer::SolveObserver},
};

pub mod greedy;
pub mod lp;
pub mod observer;

/// Default relative tolerance on the margin equation.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default cap on reduction steps.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// Malformed or out-of-range input.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// The margin floor cannot be met even with no discount on any product.
    #[error(
        "target margin {target_margin} is unreachable: margin at zero discount is {baseline_margin}"
    )]
    Infeasible {
        /// Margin (fraction) with every discount at zero
        baseline_margin: f64,
        /// Requested margin floor (fraction)
        target_margin: f64,
    },

    /// The search ran out of iterations, or finished outside tolerance.
    #[error(
        "solver did not converge after {iterations} iterations (residual {residual:e} of retail value)"
    )]
    Convergence {
        /// Iterations performed
        iterations: usize,
        /// Remaining margin-equation residual, relative to total retail value
        residual: f64,
    },

    /// Wrapped LP backend resolution error
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Numeric settings shared by every solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    tolerance: f64,
    max_iterations: usize,
}

impl SolverSettings {
    /// Create solver settings.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::ToleranceOutOfRange`] unless `tolerance` is finite and in
    /// `(0, 1)`, and [`InvalidInputError::ZeroIterationBudget`] if `max_iterations` is zero.
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self, InvalidInputError> {
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(InvalidInputError::ToleranceOutOfRange(tolerance));
        }

        if max_iterations == 0 {
            return Err(InvalidInputError::ZeroIterationBudget);
        }

        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    /// Relative tolerance on the margin equation
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Maximum number of reduction steps
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Which side of the margin floor the optimum sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Every product keeps the maximum discount and the margin floor still holds.
    Slack,

    /// The margin floor holds with equality; some discounts were reduced.
    Binding,
}

/// Result of a discount optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    /// Discount per product, as a fraction in `[0, max_discount]`
    pub discounts: SmallVec<[f64; 8]>,

    /// Total profit across the order
    pub total_profit: f64,

    /// Total revenue across the order
    pub total_revenue: f64,

    /// Profit over revenue, in percentage points
    pub margin: f64,

    /// Objective value: quantity-weighted sum of discounts
    pub total_weighted_discount: f64,

    /// Currency slack of the margin floor (`profit - target_margin * revenue`)
    pub margin_constraint_value: f64,

    /// Whether the margin floor binds at the optimum
    pub regime: Regime,

    /// Reduction steps (or backend passes) performed
    pub iterations: usize,
}

/// Trait for solving discount optimisation problems
pub trait Solver {
    /// Solve for the discount vector that maximises the quantity-weighted discount.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the input is infeasible or the solver fails to converge.
    fn solve(
        order: &BulkOrder,
        constraints: &Constraints,
        settings: &SolverSettings,
    ) -> Result<Optimization, SolverError> {
        Self::solve_with_observer(order, constraints, settings, &mut observer::NoopObserver)
    }

    /// Solve while reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the input is infeasible or the solver fails to converge.
    fn solve_with_observer<O: SolveObserver + ?Sized>(
        order: &BulkOrder,
        constraints: &Constraints,
        settings: &SolverSettings,
        observer: &mut O,
    ) -> Result<Optimization, SolverError>;
}

/// Solver backend selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Exact reduction search ranked by retail price
    #[default]
    Greedy,

    /// Linear programme on the configured `good_lp` backend
    Lp,
}

impl SolverKind {
    /// Solve with the selected backend.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] from the selected backend.
    pub fn solve(
        self,
        order: &BulkOrder,
        constraints: &Constraints,
        settings: &SolverSettings,
    ) -> Result<Optimization, SolverError> {
        self.solve_with_observer(order, constraints, settings, &mut observer::NoopObserver)
    }

    /// Solve with the selected backend, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] from the selected backend.
    pub fn solve_with_observer<O: SolveObserver + ?Sized>(
        self,
        order: &BulkOrder,
        constraints: &Constraints,
        settings: &SolverSettings,
        observer: &mut O,
    ) -> Result<Optimization, SolverError> {
        match self {
            SolverKind::Greedy => {
                GreedySolver::solve_with_observer(order, constraints, settings, observer)
            }
            SolverKind::Lp => LpSolver::solve_with_observer(order, constraints, settings, observer),
        }
    }
}

/// Derive the margin budget and reject orders that cannot reach the target at all.
fn feasible_budget<O: SolveObserver + ?Sized>(
    order: &BulkOrder,
    constraints: &Constraints,
    observer: &mut O,
) -> Result<MarginBudget, SolverError> {
    let budget = MarginBudget::new(order, constraints);

    observer.on_budget(&budget);

    if !budget.is_feasible() {
        return Err(SolverError::Infeasible {
            baseline_margin: order.baseline_margin(),
            target_margin: constraints.target_margin(),
        });
    }

    Ok(budget)
}

/// Evaluate a discount vector and check the margin equation against tolerance.
fn finish<O: SolveObserver + ?Sized>(
    order: &BulkOrder,
    constraints: &Constraints,
    settings: &SolverSettings,
    discounts: SmallVec<[f64; 8]>,
    regime: Regime,
    iterations: usize,
    observer: &mut O,
) -> Result<Optimization, SolverError> {
    let evaluation = evaluate(order, &discounts, constraints.target_margin());

    let residual = evaluation.margin_constraint_value / order.total_retail_value();
    let tolerance = settings.tolerance();

    let within_tolerance = match regime {
        Regime::Slack => residual >= -tolerance,
        Regime::Binding => residual.abs() <= tolerance,
    };

    if !within_tolerance {
        return Err(SolverError::Convergence {
            iterations,
            residual,
        });
    }

    let optimization = Optimization {
        discounts,
        total_profit: evaluation.total_profit,
        total_revenue: evaluation.total_revenue,
        margin: evaluation.margin,
        total_weighted_discount: evaluation.total_weighted_discount,
        margin_constraint_value: evaluation.margin_constraint_value,
        regime,
        iterations,
    };

    observer.on_solved(&optimization);

    Ok(optimization)
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{products::ProductEconomics, solvers::observer::NoopObserver};

    use super::*;

    fn order() -> Result<BulkOrder, InvalidInputError> {
        BulkOrder::new([ProductEconomics::new(5.0, 1.0, 10.0, 100)])
    }

    #[test]
    fn solver_types_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<GreedySolver>();
        assert_send_sync::<LpSolver>();
        assert_send_sync::<SolverKind>();
        assert_send_sync::<SolverSettings>();
        assert_send_sync::<Optimization>();
        assert_send_sync::<SolverError>();
    }

    #[test]
    fn settings_reject_zero_tolerance() {
        assert_eq!(
            SolverSettings::new(0.0, 10),
            Err(InvalidInputError::ToleranceOutOfRange(0.0))
        );
    }

    #[test]
    fn settings_reject_zero_iterations() {
        assert_eq!(
            SolverSettings::new(1e-6, 0),
            Err(InvalidInputError::ZeroIterationBudget)
        );
    }

    #[test]
    fn default_settings_use_documented_constants() {
        let settings = SolverSettings::default();

        assert!((settings.tolerance() - DEFAULT_TOLERANCE).abs() < f64::EPSILON);
        assert_eq!(settings.max_iterations(), DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn feasible_budget_reports_baseline_margin_when_unreachable() -> TestResult {
        let order = order()?;
        let constraints = Constraints::new(0.5, 0.5)?;

        let result = feasible_budget(&order, &constraints, &mut NoopObserver);

        assert!(matches!(
            result,
            Err(SolverError::Infeasible { baseline_margin, target_margin })
                if (baseline_margin - 0.4).abs() < 1e-12 && (target_margin - 0.5).abs() < 1e-12
        ));

        Ok(())
    }

    #[test]
    fn finish_rejects_binding_solution_off_the_margin_floor() -> TestResult {
        let order = order()?;
        let constraints = Constraints::new(0.2, 0.5)?;

        // Zero discount leaves the margin well above the floor, which a binding result must not.
        let result = finish(
            &order,
            &constraints,
            &SolverSettings::default(),
            smallvec![0.0],
            Regime::Binding,
            3,
            &mut NoopObserver,
        );

        assert!(matches!(
            result,
            Err(SolverError::Convergence { iterations: 3, .. })
        ));

        Ok(())
    }

    #[test]
    fn finish_accepts_slack_solution_above_the_floor() -> TestResult {
        let order = order()?;
        let constraints = Constraints::new(0.2, 0.5)?;

        let optimization = finish(
            &order,
            &constraints,
            &SolverSettings::default(),
            smallvec![0.0],
            Regime::Slack,
            0,
            &mut NoopObserver,
        )?;

        assert!((optimization.margin - 40.0).abs() < 1e-9);
        assert_eq!(optimization.regime, Regime::Slack);

        Ok(())
    }

    #[test]
    fn solver_kinds_agree_on_single_product_order() -> TestResult {
        let order = order()?;
        let constraints = Constraints::new(0.2, 0.5)?;
        let settings = SolverSettings::default();

        let greedy = SolverKind::Greedy.solve(&order, &constraints, &settings)?;
        let lp = SolverKind::Lp.solve(&order, &constraints, &settings)?;

        // Budget 250 of retail value 1000 => 25% discount
        for result in [&greedy, &lp] {
            let discount = result.discounts.first().copied().ok_or("missing discount")?;

            assert!((discount - 0.25).abs() < 1e-6);
            assert_eq!(result.regime, Regime::Binding);
        }

        Ok(())
    }
}
