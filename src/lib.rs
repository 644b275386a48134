//! Bulkbuy
//!
//! Bulkbuy is a discount optimisation engine for neighbourhood bulk orders. Given the
//! per-product economics of an order, it finds the per-product discounts that move the
//! most volume without letting the order's profit margin fall below a floor.

use crate::{
    constraints::Constraints,
    order::BulkOrder,
    solvers::{Optimization, SolverError, SolverKind, SolverSettings},
};

pub mod api;
pub mod constraints;
pub mod fixtures;
pub mod order;
pub mod pricing;
pub mod products;
pub mod report;
pub mod solvers;

/// Optimise discounts for index-aligned product columns with the default solver and settings.
///
/// # Errors
///
/// Returns [`SolverError::InvalidInput`] for malformed input, [`SolverError::Infeasible`] if
/// the target margin cannot be met even at zero discount, and [`SolverError::Convergence`]
/// if the search exhausts its iteration budget.
pub fn optimize_discounts(
    supplier_costs: &[f64],
    operational_costs: &[f64],
    max_retail_prices: &[f64],
    quantities: &[u64],
    target_margin: f64,
    max_discount: f64,
) -> Result<Optimization, SolverError> {
    let order = BulkOrder::from_columns(
        supplier_costs,
        operational_costs,
        max_retail_prices,
        quantities,
    )?;
    let constraints = Constraints::new(target_margin, max_discount)?;

    SolverKind::default().solve(&order, &constraints, &SolverSettings::default())
}
