//! Pricing
//!
//! Evaluates a discount vector against an order: revenue, profit, margin and the
//! two scalars reported alongside every optimisation.

use crate::order::BulkOrder;

/// Aggregate economics of an order under a given discount vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// `sum(q * P * (1 - d))`
    pub total_revenue: f64,

    /// `sum(q * (P * (1 - d) - supplier - operational))`
    pub total_profit: f64,

    /// Profit over revenue, in percentage points. Zero when revenue is zero.
    pub margin: f64,

    /// Objective value: `sum(q * d)`
    pub total_weighted_discount: f64,

    /// Currency slack of the margin floor: `total_profit - target_margin * total_revenue`.
    /// Non-negative when the floor holds; zero when it binds exactly.
    pub margin_constraint_value: f64,
}

/// Evaluate `discounts` (index-aligned with the order's products) against `target_margin`.
///
/// Products without a matching discount are priced at zero discount.
pub fn evaluate(order: &BulkOrder, discounts: &[f64], target_margin: f64) -> Evaluation {
    let mut total_revenue = 0.0;
    let mut total_cost = 0.0;
    let mut total_weighted_discount = 0.0;

    for (idx, product) in order.iter().enumerate() {
        let discount = discounts.get(idx).copied().unwrap_or(0.0);

        // Quantities were checked for exact representability when the order was built.
        let quantity = product.quantity_f64().unwrap_or(0.0);

        total_revenue += quantity * product.effective_price(discount);
        total_cost += quantity * product.unit_cost();
        total_weighted_discount += quantity * discount;
    }

    let total_profit = total_revenue - total_cost;

    let margin = if total_revenue > 0.0 {
        total_profit / total_revenue * 100.0
    } else {
        0.0
    };

    Evaluation {
        total_revenue,
        total_profit,
        margin,
        total_weighted_discount,
        margin_constraint_value: total_profit - target_margin * total_revenue,
    }
}
