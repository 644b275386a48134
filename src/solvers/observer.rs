//! Solver Observer

use tracing::debug;

use crate::{constraints::MarginBudget, solvers::Optimization};

/// A single discount reduction made while restoring the margin floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionStep {
    /// 1-based iteration number
    pub iteration: usize,

    /// Index of the product whose discount was reduced
    pub product_idx: usize,

    /// Discount before the step
    pub from: f64,

    /// Discount after the step
    pub to: f64,

    /// Retail value still to be clawed back after the step
    pub remaining_deficit: f64,
}

/// Observer trait for capturing solver progress.
///
/// Every callback has an empty default, so observers only implement what they need.
/// When no observer is provided the solver uses [`NoopObserver`] and the calls are
/// optimised away via monomorphization.
pub trait SolveObserver {
    /// Called once the margin budget has been derived, before feasibility is checked.
    fn on_budget(&mut self, _budget: &MarginBudget) {}

    /// Called after each discount reduction.
    fn on_reduction(&mut self, _step: &ReductionStep) {}

    /// Called with the final result, after tolerance checks pass.
    fn on_solved(&mut self, _optimization: &Optimization) {}
}

/// No-op observer for unobserved solves.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SolveObserver for NoopObserver {}

/// Emits solver progress as `tracing` debug events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl SolveObserver for TracingObserver {
    fn on_budget(&mut self, budget: &MarginBudget) {
        debug!(
            budget = budget.budget,
            max_spend = budget.max_spend,
            deficit = budget.deficit(),
            "derived discount budget"
        );
    }

    fn on_reduction(&mut self, step: &ReductionStep) {
        debug!(
            iteration = step.iteration,
            product = step.product_idx,
            from = step.from,
            to = step.to,
            remaining_deficit = step.remaining_deficit,
            "reduced discount"
        );
    }

    fn on_solved(&mut self, optimization: &Optimization) {
        debug!(
            regime = ?optimization.regime,
            iterations = optimization.iterations,
            margin = optimization.margin,
            total_weighted_discount = optimization.total_weighted_discount,
            "solved"
        );
    }
}

/// Records the budget and every reduction step for later inspection.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    budget: Option<MarginBudget>,
    steps: Vec<ReductionStep>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// The derived budget, if the solver got that far
    pub fn budget(&self) -> Option<&MarginBudget> {
        self.budget.as_ref()
    }

    /// Reduction steps in the order they were made
    pub fn steps(&self) -> &[ReductionStep] {
        &self.steps
    }
}

impl SolveObserver for RecordingObserver {
    fn on_budget(&mut self, budget: &MarginBudget) {
        self.budget = Some(*budget);
    }

    fn on_reduction(&mut self, step: &ReductionStep) {
        self.steps.push(*step);
    }
}

/// Forwards every callback to two observers.
#[derive(Debug)]
pub struct TeeObserver<'a, A: ?Sized, B: ?Sized> {
    first: &'a mut A,
    second: &'a mut B,
}

impl<'a, A: SolveObserver + ?Sized, B: SolveObserver + ?Sized> TeeObserver<'a, A, B> {
    /// Combine two observers
    pub fn new(first: &'a mut A, second: &'a mut B) -> Self {
        Self { first, second }
    }
}

impl<A: SolveObserver + ?Sized, B: SolveObserver + ?Sized> SolveObserver for TeeObserver<'_, A, B> {
    fn on_budget(&mut self, budget: &MarginBudget) {
        self.first.on_budget(budget);
        self.second.on_budget(budget);
    }

    fn on_reduction(&mut self, step: &ReductionStep) {
        self.first.on_reduction(step);
        self.second.on_reduction(step);
    }

    fn on_solved(&mut self, optimization: &Optimization) {
        self.first.on_solved(optimization);
        self.second.on_solved(optimization);
    }
}
