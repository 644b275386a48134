//! Fixtures

use std::{
    fs,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashSet;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::{
    api::OptimizeRequest,
    constraints::Constraints,
    fixtures::orders::OrderFixture,
    order::{BulkOrder, InvalidInputError},
    products::ProductEconomics,
};

pub mod orders;

/// Default directory fixture sets are loaded from
pub const DEFAULT_BASE_PATH: &str = "./fixtures";

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Two products share a name
    #[error("Duplicate product name: {0}")]
    DuplicateProduct(String),

    /// File extension is not one of `json`, `yml` or `yaml`
    #[error("Unsupported fixture format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Order or constraints failed validation
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}

/// A named, validated bulk order ready to optimise.
#[derive(Debug, Clone)]
pub struct Fixture {
    name: String,
    currency: &'static Currency,
    product_names: Vec<String>,
    order: BulkOrder,
    constraints: Constraints,
}

impl Fixture {
    /// Load a fixture set by name from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the order is invalid.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in(DEFAULT_BASE_PATH, name)
    }

    /// Load a fixture set by name from `base_path/orders/<name>.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the order is invalid.
    pub fn from_set_in(base_path: impl AsRef<Path>, name: &str) -> Result<Self, FixtureError> {
        let file_path = base_path.as_ref().join("orders").join(format!("{name}.yml"));

        Self::from_yaml_str(&fs::read_to_string(file_path)?)
    }

    /// Load a fixture from a path, picking the format from the file extension.
    ///
    /// `.yml`/`.yaml` files are order fixtures; `.json` files are [`OptimizeRequest`]s.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unsupported, the file cannot be read or parsed,
    /// or the order is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml" | "yaml") => Self::from_yaml_str(&fs::read_to_string(path)?),
            Some("json") => {
                let request = OptimizeRequest::from_json(&fs::read_to_string(path)?)?;
                let name = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("request");

                Self::from_request(name, &request)
            }
            _ => Err(FixtureError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Parse an order fixture from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, the currency is unknown, a product name
    /// is repeated, or the order is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FixtureError> {
        let fixture: OrderFixture = serde_norway::from_str(yaml)?;

        let currency = parse_currency(&fixture.currency)?;

        let mut seen = FxHashSet::default();

        for product in &fixture.products {
            if !seen.insert(product.name.as_str()) {
                return Err(FixtureError::DuplicateProduct(product.name.clone()));
            }
        }

        let order = BulkOrder::new(fixture.products.iter().map(ProductEconomics::from))?;
        let constraints = Constraints::new(fixture.target_margin, fixture.max_discount)?;

        Ok(Self {
            product_names: fixture.products.into_iter().map(|p| p.name).collect(),
            name: fixture.name,
            currency,
            order,
            constraints,
        })
    }

    /// Build a fixture from a column-oriented request. Products are named by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the request's order or constraints are invalid.
    pub fn from_request(name: &str, request: &OptimizeRequest) -> Result<Self, FixtureError> {
        let order = request.order()?;
        let constraints = request.constraints()?;

        Ok(Self {
            name: name.to_string(),
            currency: iso::GBP,
            product_names: (1..=order.len()).map(|n| format!("Product {n}")).collect(),
            order,
            constraints,
        })
    }

    /// Order name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currency for every amount in the order
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Display name for the product at `index`
    pub fn product_name(&self, index: usize) -> Option<&str> {
        self.product_names.get(index).map(String::as_str)
    }

    /// The validated order
    pub fn order(&self) -> &BulkOrder {
        &self.order
    }

    /// The validated constraints
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }
}

/// Resolve a supported ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for anything other than GBP, USD or EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "GBP" => Ok(iso::GBP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}
