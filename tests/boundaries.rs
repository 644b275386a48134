//! Integration tests for boundary inputs and error paths

use testresult::TestResult;

use bulkbuy::{
    fixtures::Fixture,
    optimize_discounts,
    order::InvalidInputError,
    products::MAX_EXACT_QUANTITY,
    solvers::{Regime, SolverError, SolverKind, SolverSettings},
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn invalid_input(result: Result<impl std::fmt::Debug, SolverError>) -> InvalidInputError {
    match result {
        Err(SolverError::InvalidInput(e)) => e,
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn zero_target_margin_keeps_profitable_products_at_max() -> TestResult {
    let optimization =
        optimize_discounts(&[5.0, 2.0], &[1.0, 0.5], &[20.0, 8.0], &[10, 40], 0.0, 0.5)?;

    assert_eq!(optimization.regime, Regime::Slack);
    assert_eq!(optimization.iterations, 0);
    assert_eq!(optimization.discounts.as_slice(), &[0.5, 0.5]);
    assert!(optimization.margin >= 0.0);

    Ok(())
}

#[test]
fn zero_max_discount_returns_zero_discounts() -> TestResult {
    let optimization = optimize_discounts(&[5.0], &[1.0], &[10.0], &[3], 0.2, 0.0)?;

    assert_eq!(optimization.regime, Regime::Slack);
    assert_eq!(optimization.discounts.as_slice(), &[0.0]);
    assert_close(optimization.total_weighted_discount, 0.0);

    Ok(())
}

#[test]
fn equal_prices_reduce_the_lower_index_first() -> TestResult {
    let optimization = optimize_discounts(
        &[6.0, 6.0],
        &[0.0, 0.0],
        &[10.0, 10.0],
        &[100, 100],
        0.25,
        0.5,
    )?;

    assert_eq!(optimization.regime, Regime::Binding);
    assert_close(optimization.discounts[0], 0.0);
    assert_close(optimization.discounts[1], 0.4);
    assert_close(optimization.margin, 25.0);

    Ok(())
}

#[test]
fn zero_priced_products_keep_the_maximum_discount() -> TestResult {
    let optimization = optimize_discounts(
        &[0.0, 6.0, 6.0],
        &[0.0, 0.0, 0.0],
        &[0.0, 10.0, 10.0],
        &[1_000, 100, 100],
        0.25,
        0.5,
    )?;

    assert_close(optimization.discounts[0], 0.5);
    assert_close(optimization.discounts[1], 0.0);
    assert_close(optimization.discounts[2], 0.4);

    Ok(())
}

#[test]
fn infeasible_fixture_reports_baseline_margin() -> TestResult {
    let fixture = Fixture::from_set("infeasible")?;

    for kind in [SolverKind::Greedy, SolverKind::Lp] {
        let result = kind.solve(
            fixture.order(),
            fixture.constraints(),
            &SolverSettings::default(),
        );

        let Err(SolverError::Infeasible {
            baseline_margin,
            target_margin,
        }) = result
        else {
            panic!("expected infeasible for {kind:?}, got {result:?}");
        };

        assert!((baseline_margin - 1000.0 / 5600.0).abs() < 1e-12);
        assert_close(target_margin, 0.3);
    }

    Ok(())
}

#[test]
fn riverside_fixture_claws_back_the_most_expensive_product() -> TestResult {
    let fixture = Fixture::from_set("riverside")?;

    let optimization = SolverKind::Greedy.solve(
        fixture.order(),
        fixture.constraints(),
        &SolverSettings::default(),
    )?;

    assert_eq!(optimization.regime, Regime::Binding);
    assert_eq!(optimization.iterations, 1);
    assert_eq!(fixture.product_name(2), Some("Toilet roll (45 pack)"));

    assert_close(optimization.discounts[0], 0.3);
    assert_close(optimization.discounts[1], 0.3);
    assert!((optimization.discounts[2] - 0.161_772_875_816_993_65).abs() < 1e-9);
    assert_close(optimization.discounts[3], 0.3);
    assert!((optimization.margin - 15.0).abs() < 1e-6);

    Ok(())
}

#[test]
fn empty_order_is_rejected() {
    assert_eq!(
        invalid_input(optimize_discounts(&[], &[], &[], &[], 0.2, 0.5)),
        InvalidInputError::NoProducts
    );
}

#[test]
fn mismatched_columns_are_rejected() {
    assert!(matches!(
        invalid_input(optimize_discounts(&[1.0], &[1.0, 2.0], &[3.0], &[1], 0.2, 0.5)),
        InvalidInputError::LengthMismatch {
            operational_costs: 2,
            ..
        }
    ));
}

#[test]
fn negative_and_non_finite_costs_are_rejected() {
    assert!(matches!(
        invalid_input(optimize_discounts(&[-1.0], &[0.0], &[3.0], &[1], 0.2, 0.5)),
        InvalidInputError::NegativeValue { index: 0, .. }
    ));

    assert!(matches!(
        invalid_input(optimize_discounts(
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[3.0, f64::NAN],
            &[1, 1],
            0.2,
            0.5
        )),
        InvalidInputError::NonFinite { index: 1, .. }
    ));
}

#[test]
fn unrepresentable_quantities_are_rejected() {
    assert!(matches!(
        invalid_input(optimize_discounts(
            &[1.0],
            &[0.0],
            &[3.0],
            &[MAX_EXACT_QUANTITY + 1],
            0.2,
            0.5
        )),
        InvalidInputError::QuantityNotRepresentable { index: 0, .. }
    ));
}

#[test]
fn out_of_range_constraints_are_rejected() {
    assert_eq!(
        invalid_input(optimize_discounts(&[1.0], &[0.0], &[3.0], &[1], 1.0, 0.5)),
        InvalidInputError::TargetMarginOutOfRange(1.0)
    );

    assert_eq!(
        invalid_input(optimize_discounts(&[1.0], &[0.0], &[3.0], &[1], 0.2, 1.5)),
        InvalidInputError::MaxDiscountOutOfRange(1.5)
    );
}

#[test]
fn orders_without_retail_value_are_rejected() {
    assert_eq!(
        invalid_input(optimize_discounts(&[1.0], &[0.0], &[3.0], &[0], 0.2, 0.5)),
        InvalidInputError::ZeroRetailValue
    );
}

#[test]
fn totals_that_overflow_are_rejected() {
    assert!(matches!(
        invalid_input(optimize_discounts(
            &[1.0e300],
            &[0.0],
            &[1.0e305],
            &[1_000_000],
            0.2,
            0.5
        )),
        InvalidInputError::TotalNotFinite { .. }
    ));
}

#[test]
fn baseline_margin_just_below_target_is_infeasible() {
    let result = optimize_discounts(&[8.0 + 1e-8], &[0.0], &[10.0], &[100], 0.2, 0.5);

    assert!(
        matches!(
            result,
            Err(SolverError::Infeasible { baseline_margin, target_margin })
                if baseline_margin < target_margin
        ),
        "expected infeasible, got {result:?}"
    );
}

#[test]
fn baseline_margin_at_target_gives_zero_discounts() -> TestResult {
    let optimization = optimize_discounts(&[7.5], &[0.0], &[10.0], &[100], 0.25, 0.5)?;

    assert_eq!(optimization.regime, Regime::Binding);
    assert_close(optimization.discounts[0], 0.0);
    assert!(optimization.margin_constraint_value >= 0.0);

    Ok(())
}
