//! JSON Contract
//!
//! Request and response shapes for the storefront's `optimizeDiscounts` call. Field
//! names are camelCase to match the JavaScript caller.

use serde::{Deserialize, Serialize};

use crate::{
    constraints::Constraints,
    order::{BulkOrder, InvalidInputError},
    solvers::{Optimization, Regime, SolverError, SolverKind, SolverSettings},
};

/// Column-oriented optimisation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    /// Supplier cost per unit, per product
    pub supplier_costs: Vec<f64>,

    /// Operational cost per unit, per product
    pub operational_costs: Vec<f64>,

    /// Retail price ceiling per unit, per product
    pub max_retail_prices: Vec<f64>,

    /// Units per product
    pub quantities: Vec<u64>,

    /// Margin floor as a fraction (0.2 = 20%)
    pub target_margin: f64,

    /// Per-product discount ceiling as a fraction
    pub max_discount: f64,
}

impl OptimizeRequest {
    /// Parse a request from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the text is not a valid request.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the per-product columns into an order.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInputError`] if the columns are malformed.
    pub fn order(&self) -> Result<BulkOrder, InvalidInputError> {
        BulkOrder::from_columns(
            &self.supplier_costs,
            &self.operational_costs,
            &self.max_retail_prices,
            &self.quantities,
        )
    }

    /// Validate the scalar constraints.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInputError`] if either value is out of range.
    pub fn constraints(&self) -> Result<Constraints, InvalidInputError> {
        Constraints::new(self.target_margin, self.max_discount)
    }

    /// Validate and solve the request.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the request is invalid, infeasible, or fails to converge.
    pub fn solve(
        &self,
        kind: SolverKind,
        settings: &SolverSettings,
    ) -> Result<OptimizeResponse, SolverError> {
        let order = self.order()?;
        let constraints = self.constraints()?;

        let optimization = kind.solve(&order, &constraints, settings)?;

        Ok(OptimizeResponse::from(&optimization))
    }
}

/// Optimisation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    /// Discount per product, as a fraction
    pub discounts: Vec<f64>,

    /// Total profit across the order
    pub total_profit: f64,

    /// Total revenue across the order
    pub total_revenue: f64,

    /// Margin in percentage points
    pub margin: f64,

    /// Quantity-weighted sum of discounts
    pub total_weighted_discount: f64,

    /// `total_profit - target_margin * total_revenue`
    pub margin_constraint_value: f64,

    /// Whether the margin floor binds
    pub regime: Regime,

    /// Reduction steps (or backend passes) performed
    pub iterations: usize,
}

impl From<&Optimization> for OptimizeResponse {
    fn from(optimization: &Optimization) -> Self {
        Self {
            discounts: optimization.discounts.to_vec(),
            total_profit: optimization.total_profit,
            total_revenue: optimization.total_revenue,
            margin: optimization.margin,
            total_weighted_discount: optimization.total_weighted_discount,
            margin_constraint_value: optimization.margin_constraint_value,
            regime: optimization.regime,
            iterations: optimization.iterations,
        }
    }
}
