//! Constraints

use serde::{Deserialize, Serialize};

use crate::order::{BulkOrder, InvalidInputError};

/// Margin floor and per-product discount ceiling for an optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    target_margin: f64,
    max_discount: f64,
}

impl Constraints {
    /// Create a new constraint set.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::TargetMarginOutOfRange`] unless `0 <= target_margin < 1`,
    /// and [`InvalidInputError::MaxDiscountOutOfRange`] unless `0 <= max_discount <= 1`.
    pub fn new(target_margin: f64, max_discount: f64) -> Result<Self, InvalidInputError> {
        // NaN fails both range checks
        if !(0.0..1.0).contains(&target_margin) {
            return Err(InvalidInputError::TargetMarginOutOfRange(target_margin));
        }

        if !(0.0..=1.0).contains(&max_discount) {
            return Err(InvalidInputError::MaxDiscountOutOfRange(max_discount));
        }

        Ok(Self {
            target_margin,
            max_discount,
        })
    }

    /// Minimum acceptable margin, as a fraction of revenue
    pub fn target_margin(&self) -> f64 {
        self.target_margin
    }

    /// Upper bound on every product's discount, as a fraction
    pub fn max_discount(&self) -> f64 {
        self.max_discount
    }
}

/// The margin floor restated as a currency budget for discounts.
///
/// `profit >= m * revenue` rearranges to `sum(q * P * d) <= sum(q * P) - sum(q * c) / (1 - m)`,
/// so every unit of discount on product `i` spends `q_i * P_i` of a shared budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginBudget {
    /// Retail value that may be given away while holding the margin floor.
    /// Negative when the order cannot reach the target even at zero discount.
    pub budget: f64,

    /// Retail value given away when every product sits at the maximum discount.
    pub max_spend: f64,

    /// Total retail value of the order, used to scale tolerances.
    pub total_retail_value: f64,
}

impl MarginBudget {
    /// Derive the discount budget for an order under the given constraints.
    pub fn new(order: &BulkOrder, constraints: &Constraints) -> Self {
        let total_retail_value = order.total_retail_value();

        Self {
            budget: total_retail_value - order.total_cost() / (1.0 - constraints.target_margin()),
            max_spend: total_retail_value * constraints.max_discount(),
            total_retail_value,
        }
    }

    /// Whether the margin floor is reachable at all, i.e. holds at zero discount.
    pub fn is_feasible(&self) -> bool {
        self.budget >= 0.0
    }

    /// Retail value that must be clawed back from the all-maximum solution.
    /// Zero or negative when every product can keep the maximum discount.
    pub fn deficit(&self) -> f64 {
        self.max_spend - self.budget.max(0.0)
    }

    /// Whether the all-maximum solution already satisfies the margin floor.
    pub fn is_slack(&self) -> bool {
        self.deficit() <= 0.0
    }
}
