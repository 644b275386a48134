//! Command line configuration

use std::path::PathBuf;

use clap::{Args, Parser};

use bulkbuy::{
    fixtures::DEFAULT_BASE_PATH,
    order::InvalidInputError,
    solvers::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, SolverKind, SolverSettings},
};

/// Bulkbuy configuration
#[derive(Debug, Parser)]
#[command(
    name = "bulkbuy",
    about = "Optimise bulk order discounts against a margin floor",
    long_about = None
)]
pub(crate) struct Config {
    /// Order input settings.
    #[command(flatten)]
    pub input: InputConfig,

    /// Solver settings.
    #[command(flatten)]
    pub solver: SolverConfig,

    /// Output settings.
    #[command(flatten)]
    pub output: OutputConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Where the order comes from.
#[derive(Debug, Args)]
pub(crate) struct InputConfig {
    /// Fixture set to load from the fixtures directory
    #[arg(short, long, default_value = "sample")]
    pub fixture: String,

    /// Order file to load instead of a fixture set (`.json` request or `.yml` fixture)
    #[arg(short, long, conflicts_with = "fixture")]
    pub input: Option<PathBuf>,

    /// Directory containing fixture sets
    #[arg(long, env = "BULKBUY_FIXTURES_DIR", default_value = DEFAULT_BASE_PATH)]
    pub fixtures_dir: PathBuf,
}

/// Solver selection and numeric settings.
#[derive(Debug, Args)]
pub(crate) struct SolverConfig {
    /// Solver backend
    #[arg(short, long, env = "BULKBUY_SOLVER", value_enum, default_value_t = SolverKind::Greedy)]
    pub solver: SolverKind,

    /// Relative tolerance on the margin equation
    #[arg(long, env = "BULKBUY_TOLERANCE", default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Maximum number of reduction steps
    #[arg(long, env = "BULKBUY_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
}

impl SolverConfig {
    /// Validated solver settings
    pub(crate) fn settings(&self) -> Result<SolverSettings, InvalidInputError> {
        SolverSettings::new(self.tolerance, self.max_iterations)
    }
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table.
    Table,

    /// `OptimizeResponse` JSON.
    Json,
}

/// Output settings.
#[derive(Debug, Args)]
pub(crate) struct OutputConfig {
    /// Output format (table, json)
    #[arg(long, env = "BULKBUY_FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Show each discount reduction the solver made
    #[arg(long, default_value_t = false)]
    pub explain: bool,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults_select_sample_fixture_and_greedy_solver() -> TestResult {
        let config = Config::try_parse_from(["bulkbuy"])?;

        assert_eq!(config.input.fixture, "sample");
        assert!(config.input.input.is_none());
        assert_eq!(config.solver.solver, SolverKind::Greedy);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.solver.settings()?, SolverSettings::default());

        Ok(())
    }

    #[test]
    fn flags_override_solver_and_format() -> TestResult {
        let config = Config::try_parse_from([
            "bulkbuy",
            "--solver",
            "lp",
            "--format",
            "json",
            "--max-iterations",
            "5",
            "--explain",
        ])?;

        assert_eq!(config.solver.solver, SolverKind::Lp);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.solver.max_iterations, 5);
        assert!(config.output.explain);

        Ok(())
    }

    #[test]
    fn input_conflicts_with_explicit_fixture() {
        let result =
            Config::try_parse_from(["bulkbuy", "--fixture", "sample", "--input", "order.json"]);

        assert!(result.is_err());
    }

    #[test]
    fn settings_reject_zero_iteration_budget() -> TestResult {
        let config = Config::try_parse_from(["bulkbuy", "--max-iterations", "0"])?;

        assert_eq!(
            config.solver.settings(),
            Err(InvalidInputError::ZeroIterationBudget)
        );

        Ok(())
    }
}
