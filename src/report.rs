//! Report

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    fixtures::Fixture,
    solvers::{Optimization, Regime, observer::ReductionStep},
};

/// Errors that can occur when rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Amount cannot be represented in minor units.
    #[error("amount cannot be represented as money: {0}")]
    AmountNotRepresentable(f64),

    /// Optimisation and order disagree on the number of products.
    #[error("product {0} has no matching discount")]
    MissingDiscount(usize),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable summary of an optimisation.
#[derive(Debug)]
pub struct Report<'a> {
    fixture: &'a Fixture,
    optimization: &'a Optimization,
    steps: Option<&'a [ReductionStep]>,
}

impl<'a> Report<'a> {
    /// Create a report for an optimisation of the fixture's order
    pub fn new(fixture: &'a Fixture, optimization: &'a Optimization) -> Self {
        Self {
            fixture,
            optimization,
            steps: None,
        }
    }

    /// Include the reduction steps that produced the result
    #[must_use]
    pub fn with_steps(mut self, steps: &'a [ReductionStep]) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Writes the report.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be formatted or the report cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let currency = self.fixture.currency();

        writeln!(out, "\n\x1b[1m{}\x1b[0m", self.fixture.name()).map_err(|_err| ReportError::IO)?;

        write_table(&mut out, self.product_table(currency)?)?;
        self.write_summary(&mut out, currency)?;

        if let Some(steps) = self.steps
            && !steps.is_empty()
        {
            write_table(&mut out, self.steps_table(steps))?;
        }

        Ok(())
    }

    fn product_table(&self, currency: &'static Currency) -> Result<Builder, ReportError> {
        let mut builder = Builder::default();

        builder.push_record([
            "#",
            "Product",
            "Retail Price",
            "Discount",
            "Effective Price",
            "Unit Profit",
            "Quantity",
        ]);

        for (idx, product) in self.fixture.order().iter().enumerate() {
            let discount = self
                .optimization
                .discounts
                .get(idx)
                .copied()
                .ok_or(ReportError::MissingDiscount(idx))?;

            builder.push_record([
                (idx + 1).to_string(),
                self.product_label(idx),
                money(product.max_retail_price, currency)?.to_string(),
                format!("{:.2}%", percent_points(discount)?),
                money(product.effective_price(discount), currency)?.to_string(),
                money(product.unit_profit(discount), currency)?.to_string(),
                product.quantity.to_string(),
            ]);
        }

        Ok(builder)
    }

    fn steps_table(&self, steps: &[ReductionStep]) -> Builder {
        let mut builder = Builder::default();

        builder.push_record(["Step", "Product", "From", "To", "Remaining Deficit"]);

        for step in steps {
            builder.push_record([
                step.iteration.to_string(),
                self.product_label(step.product_idx),
                format!("{:.4}", step.from),
                format!("{:.4}", step.to),
                format!("{:.2}", step.remaining_deficit),
            ]);
        }

        builder
    }

    fn write_summary(
        &self,
        out: &mut impl io::Write,
        currency: &'static Currency,
    ) -> Result<(), ReportError> {
        let optimization = self.optimization;
        let constraints = self.fixture.constraints();

        let regime = match optimization.regime {
            Regime::Slack => "slack (every product at the maximum discount)",
            Regime::Binding => "binding (margin floor reached)",
        };

        let lines = [
            ("Revenue:", money(optimization.total_revenue, currency)?.to_string()),
            ("Profit:", money(optimization.total_profit, currency)?.to_string()),
            (
                "Margin:",
                format!(
                    "{:.2}% (target {:.2}%)",
                    optimization.margin,
                    percent_points(constraints.target_margin())?
                ),
            ),
            (
                "Weighted discount:",
                format!("{:.2}", optimization.total_weighted_discount),
            ),
            (
                "Margin slack:",
                money(optimization.margin_constraint_value, currency)?.to_string(),
            ),
            ("Regime:", regime.to_string()),
        ];

        let label_width = lines
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);

        for (label, value) in lines {
            writeln!(out, " {label:<label_width$}  {value}").map_err(|_err| ReportError::IO)?;
        }

        Ok(())
    }

    fn product_label(&self, idx: usize) -> String {
        self.fixture
            .product_name(idx)
            .map_or_else(|| format!("Product {}", idx + 1), str::to_string)
    }
}

fn write_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReportError> {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..), Alignment::right());

    writeln!(out, "\n{table}\n").map_err(|_err| ReportError::IO)
}

/// Round an amount to minor units in `currency`.
fn money(
    amount: f64,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, ReportError> {
    let minor_units = Decimal::from_f64(amount)
        .and_then(|value| value.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|value| {
            value
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .ok_or(ReportError::AmountNotRepresentable(amount))?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Convert a fraction (0.25) to percent points (25.00).
fn percent_points(fraction: f64) -> Result<Decimal, ReportError> {
    let percentage = Decimal::from_f64(fraction)
        .map(Percentage::from)
        .ok_or(ReportError::AmountNotRepresentable(fraction))?;

    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    Ok(((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2))
}
