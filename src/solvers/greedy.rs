//! Greedy Solver
//!
//! Starts with every product at the maximum discount. If that breaks the margin floor,
//! discounts are clawed back one product per iteration, highest retail price first.
//!
//! A unit of discount on product `i` adds `q_i` to the objective and spends `q_i * P_i`
//! of the margin budget, so objective earned per unit of budget is `1 / P_i`. Reducing
//! the highest-priced product first restores the most budget for the least objective,
//! which makes this the exact optimum of the underlying fractional knapsack.

use smallvec::{SmallVec, smallvec};

use crate::{
    constraints::Constraints,
    order::BulkOrder,
    solvers::{
        Optimization, Regime, Solver, SolverError, SolverSettings, feasible_budget, finish,
        observer::{ReductionStep, SolveObserver},
    },
};

/// Exact solver using a bounded reduction search
#[derive(Debug)]
pub struct GreedySolver;

impl Solver for GreedySolver {
    fn solve_with_observer<O: SolveObserver + ?Sized>(
        order: &BulkOrder,
        constraints: &Constraints,
        settings: &SolverSettings,
        observer: &mut O,
    ) -> Result<Optimization, SolverError> {
        let budget = feasible_budget(order, constraints, observer)?;
        let max_discount = constraints.max_discount();

        let mut discounts: SmallVec<[f64; 8]> = smallvec![max_discount; order.len()];

        if budget.is_slack() {
            return finish(
                order,
                constraints,
                settings,
                discounts,
                Regime::Slack,
                0,
                observer,
            );
        }

        let mut deficit = budget.deficit();
        let mut iterations = 0;

        for product_idx in reduction_order(order) {
            if deficit <= 0.0 {
                break;
            }

            if iterations == settings.max_iterations() {
                return Err(SolverError::Convergence {
                    iterations,
                    residual: deficit / budget.total_retail_value,
                });
            }

            iterations += 1;

            let retail = order
                .get(product_idx)
                .and_then(|product| product.retail_value())
                .ok_or(SolverError::InvariantViolation {
                    message: "ranked product missing from order",
                })?;

            let discount = discounts
                .get_mut(product_idx)
                .ok_or(SolverError::InvariantViolation {
                    message: "discount missing for ranked product",
                })?;

            // Retail value recoverable by taking this product all the way to zero discount.
            let available = retail * max_discount;
            let from = *discount;

            if available <= deficit {
                *discount = 0.0;
                deficit -= available;
            } else {
                *discount = (max_discount - deficit / retail).clamp(0.0, max_discount);
                deficit = 0.0;
            }

            observer.on_reduction(&ReductionStep {
                iteration: iterations,
                product_idx,
                from,
                to: *discount,
                remaining_deficit: deficit,
            });
        }

        // A feasible budget is never negative, so dropping every discount to zero
        // always clears the deficit.
        if deficit > settings.tolerance() * budget.total_retail_value {
            return Err(SolverError::InvariantViolation {
                message: "reduction order exhausted before margin floor was restored",
            });
        }

        finish(
            order,
            constraints,
            settings,
            discounts,
            Regime::Binding,
            iterations,
            observer,
        )
    }
}

/// Product indexes in the order their discounts are reduced.
///
/// Highest retail price first, ties broken by lower index. Products with no retail
/// value cost nothing to discount and are never reduced.
fn reduction_order(order: &BulkOrder) -> SmallVec<[usize; 8]> {
    let mut ranked: SmallVec<[(usize, f64); 8]> = order
        .iter()
        .enumerate()
        .filter(|(_, product)| product.retail_value().is_some_and(|value| value > 0.0))
        .map(|(idx, product)| (idx, product.max_retail_price))
        .collect();

    ranked.sort_by(|(a_idx, a_price), (b_idx, b_price)| {
        b_price.total_cmp(a_price).then(a_idx.cmp(b_idx))
    });

    ranked.into_iter().map(|(idx, _)| idx).collect()
}
