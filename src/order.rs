//! Bulk Orders

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use crate::products::{MAX_EXACT_QUANTITY, ProductEconomics};

/// Per-product cost fields, used to report which value failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostField {
    /// Supplier cost per unit
    SupplierCost,

    /// Operational cost per unit
    OperationalCost,

    /// Retail price ceiling per unit
    MaxRetailPrice,
}

impl fmt::Display for CostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CostField::SupplierCost => "supplier cost",
            CostField::OperationalCost => "operational cost",
            CostField::MaxRetailPrice => "max retail price",
        })
    }
}

/// Malformed or out-of-range optimiser input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    /// The order contains no products.
    #[error("order must contain at least one product")]
    NoProducts,

    /// The per-product columns have different lengths.
    #[error(
        "per-product inputs must have equal lengths: supplier costs {supplier_costs}, operational costs {operational_costs}, max retail prices {max_retail_prices}, quantities {quantities}"
    )]
    LengthMismatch {
        /// Number of supplier costs
        supplier_costs: usize,
        /// Number of operational costs
        operational_costs: usize,
        /// Number of retail price ceilings
        max_retail_prices: usize,
        /// Number of quantities
        quantities: usize,
    },

    /// A cost or price is negative.
    #[error("{field} for product {index} must not be negative, got {value}")]
    NegativeValue {
        /// Which value was negative
        field: CostField,
        /// Product index
        index: usize,
        /// The offending value
        value: f64,
    },

    /// A cost or price is NaN or infinite.
    #[error("{field} for product {index} must be finite")]
    NonFinite {
        /// Which value was not finite
        field: CostField,
        /// Product index
        index: usize,
    },

    /// A quantity cannot be represented exactly as a solver coefficient.
    #[error(
        "quantity for product {index} exceeds the largest exactly representable value ({MAX_EXACT_QUANTITY}): {quantity}"
    )]
    QuantityNotRepresentable {
        /// Product index
        index: usize,
        /// The offending quantity
        quantity: u64,
    },

    /// Nothing in the order has any retail value, so margin is undefined.
    #[error("order has no retail value at zero discount; margin is undefined")]
    ZeroRetailValue,

    /// Order-wide retail value or cost overflows `f64`.
    #[error("order totals must be finite: retail value {total_retail_value}, cost {total_cost}")]
    TotalNotFinite {
        /// Sum of `q * P` across the order
        total_retail_value: f64,
        /// Sum of `q * (supplier + operational)` across the order
        total_cost: f64,
    },

    /// Target margin outside `[0, 1)`.
    #[error("target margin must be in [0, 1), got {0}")]
    TargetMarginOutOfRange(f64),

    /// Maximum discount outside `[0, 1]`.
    #[error("max discount must be in [0, 1], got {0}")]
    MaxDiscountOutOfRange(f64),

    /// Solver tolerance is not a usable positive fraction.
    #[error("tolerance must be finite and in (0, 1), got {0}")]
    ToleranceOutOfRange(f64),

    /// Solver iteration budget is zero.
    #[error("max iterations must be at least 1")]
    ZeroIterationBudget,
}

/// Products collection, one entry per product index
pub type Products = SmallVec<[ProductEconomics; 8]>;

/// A validated bulk order.
///
/// Every product has finite, non-negative costs and an exactly representable
/// quantity, and the order as a whole has finite totals and positive retail value.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOrder {
    products: Products,
    total_retail_value: f64,
    total_cost: f64,
}

impl BulkOrder {
    /// Build an order from product records.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInputError`] if the order is empty, any cost is negative or
    /// not finite, any quantity is not exactly representable, or the order has no
    /// retail value.
    pub fn new(
        products: impl IntoIterator<Item = ProductEconomics>,
    ) -> Result<Self, InvalidInputError> {
        let products: Products = products.into_iter().collect();

        if products.is_empty() {
            return Err(InvalidInputError::NoProducts);
        }

        let mut total_retail_value = 0.0;
        let mut total_cost = 0.0;

        for (index, product) in products.iter().enumerate() {
            validate_cost(CostField::SupplierCost, index, product.supplier_cost)?;
            validate_cost(CostField::OperationalCost, index, product.operational_cost)?;
            validate_cost(CostField::MaxRetailPrice, index, product.max_retail_price)?;

            let (Some(retail), Some(cost)) = (product.retail_value(), product.total_cost()) else {
                return Err(InvalidInputError::QuantityNotRepresentable {
                    index,
                    quantity: product.quantity,
                });
            };

            total_retail_value += retail;
            total_cost += cost;
        }

        if !(total_retail_value.is_finite() && total_cost.is_finite()) {
            return Err(InvalidInputError::TotalNotFinite {
                total_retail_value,
                total_cost,
            });
        }

        if total_retail_value <= 0.0 {
            return Err(InvalidInputError::ZeroRetailValue);
        }

        Ok(Self {
            products,
            total_retail_value,
            total_cost,
        })
    }

    /// Build an order from four index-aligned columns.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::LengthMismatch`] if the columns differ in length,
    /// otherwise the same errors as [`BulkOrder::new`].
    pub fn from_columns(
        supplier_costs: &[f64],
        operational_costs: &[f64],
        max_retail_prices: &[f64],
        quantities: &[u64],
    ) -> Result<Self, InvalidInputError> {
        let len = supplier_costs.len();

        if operational_costs.len() != len
            || max_retail_prices.len() != len
            || quantities.len() != len
        {
            return Err(InvalidInputError::LengthMismatch {
                supplier_costs: supplier_costs.len(),
                operational_costs: operational_costs.len(),
                max_retail_prices: max_retail_prices.len(),
                quantities: quantities.len(),
            });
        }

        Self::new(
            supplier_costs
                .iter()
                .zip(operational_costs)
                .zip(max_retail_prices)
                .zip(quantities)
                .map(|(((&supplier, &operational), &price), &quantity)| {
                    ProductEconomics::new(supplier, operational, price, quantity)
                }),
        )
    }

    /// Number of products in the order
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Always false; a validated order has at least one product.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products in index order
    pub fn products(&self) -> &[ProductEconomics] {
        &self.products
    }

    /// Iterate over the products
    pub fn iter(&self) -> std::slice::Iter<'_, ProductEconomics> {
        self.products.iter()
    }

    /// Get a product by index
    pub fn get(&self, index: usize) -> Option<&ProductEconomics> {
        self.products.get(index)
    }

    /// Sum of `q * P` over every product (revenue at zero discount)
    pub fn total_retail_value(&self) -> f64 {
        self.total_retail_value
    }

    /// Sum of `q * (supplier + operational)` over every product
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Margin (as a fraction) when no discount is applied.
    pub fn baseline_margin(&self) -> f64 {
        (self.total_retail_value - self.total_cost) / self.total_retail_value
    }
}

impl<'a> IntoIterator for &'a BulkOrder {
    type Item = &'a ProductEconomics;
    type IntoIter = std::slice::Iter<'a, ProductEconomics>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate_cost(field: CostField, index: usize, value: f64) -> Result<(), InvalidInputError> {
    if !value.is_finite() {
        return Err(InvalidInputError::NonFinite { field, index });
    }

    if value < 0.0 {
        return Err(InvalidInputError::NegativeValue { field, index, value });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn from_columns_aligns_products_by_index() -> TestResult {
        let order = BulkOrder::from_columns(&[40.0, 30.0], &[5.0, 4.0], &[60.0, 50.0], &[2, 3])?;

        assert_eq!(order.len(), 2);
        assert_eq!(order.get(1), Some(&ProductEconomics::new(30.0, 4.0, 50.0, 3)));
        assert!((order.total_retail_value() - 270.0).abs() < f64::EPSILON);
        assert!((order.total_cost() - 192.0).abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn from_columns_rejects_mismatched_lengths() {
        let result = BulkOrder::from_columns(&[40.0, 30.0], &[5.0], &[60.0, 50.0], &[2, 3]);

        assert_eq!(
            result,
            Err(InvalidInputError::LengthMismatch {
                supplier_costs: 2,
                operational_costs: 1,
                max_retail_prices: 2,
                quantities: 2,
            })
        );
    }

    #[test]
    fn new_rejects_empty_order() {
        assert_eq!(BulkOrder::new([]), Err(InvalidInputError::NoProducts));
    }

    #[test]
    fn new_rejects_negative_cost_with_field_and_index() {
        let result = BulkOrder::new([
            ProductEconomics::new(40.0, 5.0, 60.0, 1),
            ProductEconomics::new(30.0, -4.0, 50.0, 1),
        ]);

        assert!(matches!(
            result,
            Err(InvalidInputError::NegativeValue {
                field: CostField::OperationalCost,
                index: 1,
                ..
            })
        ));
    }

    #[test]
    fn new_rejects_non_finite_price() {
        let result = BulkOrder::new([ProductEconomics::new(40.0, 5.0, f64::NAN, 1)]);

        assert_eq!(
            result,
            Err(InvalidInputError::NonFinite {
                field: CostField::MaxRetailPrice,
                index: 0,
            })
        );
    }

    #[test]
    fn new_rejects_unrepresentable_quantity() {
        let result = BulkOrder::new([ProductEconomics::new(1.0, 1.0, 2.0, u64::MAX)]);

        assert!(matches!(
            result,
            Err(InvalidInputError::QuantityNotRepresentable { index: 0, .. })
        ));
    }

    #[test]
    fn new_rejects_order_without_retail_value() {
        let result = BulkOrder::new([
            ProductEconomics::new(1.0, 1.0, 2.0, 0),
            ProductEconomics::new(1.0, 1.0, 0.0, 5),
        ]);

        assert_eq!(result, Err(InvalidInputError::ZeroRetailValue));
    }

    #[test]
    fn new_rejects_totals_that_overflow() {
        let result = BulkOrder::new([
            ProductEconomics::new(1.0, 0.0, f64::MAX / 2.0, 3),
            ProductEconomics::new(1.0, 0.0, 2.0, 1),
        ]);

        assert!(matches!(
            result,
            Err(InvalidInputError::TotalNotFinite { total_retail_value, .. })
                if total_retail_value.is_infinite()
        ));
    }

    #[test]
    fn new_rejects_cost_total_that_overflows() {
        let result = BulkOrder::new([ProductEconomics::new(f64::MAX, f64::MAX, 1.0, 1)]);

        assert!(matches!(
            result,
            Err(InvalidInputError::TotalNotFinite { total_cost, .. }) if total_cost.is_infinite()
        ));
    }

    #[test]
    fn baseline_margin_is_profit_over_revenue() -> TestResult {
        let order = BulkOrder::new([ProductEconomics::new(40.0, 5.0, 60.0, 4)])?;

        assert!((order.baseline_margin() - 0.25).abs() < 1e-12);

        Ok(())
    }
}
