//! Products

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Largest integer that an `f64` mantissa can hold exactly (2^53).
pub const MAX_EXACT_QUANTITY: u64 = 9_007_199_254_740_992;

/// Per-unit economics of a single product in a bulk order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductEconomics {
    /// Cost paid to the supplier per unit
    pub supplier_cost: f64,

    /// Handling, storage and delivery cost per unit
    pub operational_cost: f64,

    /// Retail price ceiling per unit, before any discount
    pub max_retail_price: f64,

    /// Units expected to be allocated to the order
    pub quantity: u64,
}

impl ProductEconomics {
    /// Create a new product record.
    pub fn new(
        supplier_cost: f64,
        operational_cost: f64,
        max_retail_price: f64,
        quantity: u64,
    ) -> Self {
        Self {
            supplier_cost,
            operational_cost,
            max_retail_price,
            quantity,
        }
    }

    /// Total cost of one unit (supplier plus operational).
    pub fn unit_cost(&self) -> f64 {
        self.supplier_cost + self.operational_cost
    }

    /// Selling price of one unit after applying `discount`.
    pub fn effective_price(&self, discount: f64) -> f64 {
        self.max_retail_price * (1.0 - discount)
    }

    /// Profit on one unit after applying `discount`. May be negative.
    pub fn unit_profit(&self, discount: f64) -> f64 {
        self.effective_price(discount) - self.unit_cost()
    }

    /// Quantity as a solver coefficient, if it can be represented exactly.
    pub fn quantity_f64(&self) -> Option<f64> {
        quantity_to_f64_exact(self.quantity)
    }

    /// Retail value of the full quantity at the price ceiling (`q * P`).
    ///
    /// Returns `None` when the quantity is not exactly representable.
    pub fn retail_value(&self) -> Option<f64> {
        Some(self.quantity_f64()? * self.max_retail_price)
    }

    /// Cost of the full quantity (`q * (supplier + operational)`).
    ///
    /// Returns `None` when the quantity is not exactly representable.
    pub fn total_cost(&self) -> Option<f64> {
        Some(self.quantity_f64()? * self.unit_cost())
    }
}

/// Convert a `u64` to an `f64` if it can be represented exactly.
pub fn quantity_to_f64_exact(v: u64) -> Option<f64> {
    let f = v.to_f64()?;

    (f.to_u64() == Some(v)).then_some(f)
}
