//! Bulkbuy command line

use std::{
    io::{self, Write},
    process::ExitCode,
    time::Instant,
};

use humanize_duration::{Truncate, prelude::DurationExt};
use thiserror::Error;
use tracing::{error, info};

use bulkbuy::{
    api::OptimizeResponse,
    fixtures::{Fixture, FixtureError},
    order::InvalidInputError,
    report::{Report, ReportError},
    solvers::{
        SolverError,
        observer::{RecordingObserver, TeeObserver, TracingObserver},
    },
};

use crate::config::{Config, OutputFormat};

mod config;
mod observability;

/// Errors surfaced by the command line
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] InvalidInputError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Bulkbuy entry point
fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    if let Err(e) = observability::init(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("Logging error: {e}");
        }

        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");

            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), CliError> {
    let settings = config.solver.settings()?;

    let fixture = match &config.input.input {
        Some(path) => Fixture::from_path(path)?,
        None => Fixture::from_set_in(&config.input.fixtures_dir, &config.input.fixture)?,
    };

    info!(
        order = fixture.name(),
        products = fixture.order().len(),
        solver = ?config.solver.solver,
        "optimising discounts"
    );

    let mut recorder = RecordingObserver::new();
    let mut tracer = TracingObserver;

    let started_at = Instant::now();

    let optimization = config.solver.solver.solve_with_observer(
        fixture.order(),
        fixture.constraints(),
        &settings,
        &mut TeeObserver::new(&mut recorder, &mut tracer),
    )?;

    let elapsed = started_at.elapsed();

    info!(
        regime = ?optimization.regime,
        iterations = optimization.iterations,
        elapsed = %elapsed.human(Truncate::Nano),
        "optimised discounts"
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match config.output.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut handle, &OptimizeResponse::from(&optimization))?;
            writeln!(handle)?;
        }
        OutputFormat::Table => {
            let mut report = Report::new(&fixture, &optimization);

            if config.output.explain {
                report = report.with_steps(recorder.steps());
            }

            report.write_to(&mut handle)?;

            writeln!(handle, "\nSolved in {}", elapsed.human(Truncate::Nano))?;
        }
    }

    Ok(())
}
