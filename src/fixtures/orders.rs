//! Order Fixtures

use serde::Deserialize;

use crate::products::ProductEconomics;

fn default_currency() -> String {
    "GBP".to_string()
}

/// Bulk order fixture from YAML
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Display name of the order
    pub name: String,

    /// ISO currency code for all amounts
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Margin floor as a fraction
    pub target_margin: f64,

    /// Per-product discount ceiling as a fraction
    pub max_discount: f64,

    /// Products in index order
    pub products: Vec<ProductFixture>,
}

/// Product fixture from YAML
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Supplier cost per unit
    pub supplier_cost: f64,

    /// Operational cost per unit
    #[serde(default)]
    pub operational_cost: f64,

    /// Retail price ceiling per unit
    pub max_retail_price: f64,

    /// Units in the order
    pub quantity: u64,
}

impl From<&ProductFixture> for ProductEconomics {
    fn from(fixture: &ProductFixture) -> Self {
        ProductEconomics::new(
            fixture.supplier_cost,
            fixture.operational_cost,
            fixture.max_retail_price,
            fixture.quantity,
        )
    }
}
