use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "sfstat - occupancy and state statistics for ion-channel selectivity filters, from xtck trajectory analysis logs.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report per-site occupancy fractions with bootstrap confidence intervals for one run.
    Occupancy(OccupancyArgs),
    /// Report the state-pattern distribution with bootstrap confidence intervals for one run.
    States(StatesArgs),
    /// Aggregate occupancy and state statistics across the replicas of an HREX ensemble.
    Ensemble(EnsembleArgs),
}

/// Options shared by every analysis subcommand.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Path to a TOML analysis configuration file. Flags below override it.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep only frames with time >= START (inclusive).
    #[arg(long, value_name = "TIME")]
    pub start: Option<f64>,

    /// Keep only frames with time <= END (inclusive).
    #[arg(long, value_name = "TIME")]
    pub end: Option<f64>,

    /// Override the number of bootstrap resamples.
    #[arg(short = 'n', long, value_name = "INT")]
    pub resamples: Option<usize>,

    /// Override the bootstrap confidence level, in (0, 1).
    #[arg(long, value_name = "FLOAT")]
    pub confidence: Option<f64>,

    /// Override the bootstrap interval method.
    #[arg(long, value_enum, value_name = "METHOD")]
    pub method: Option<MethodArg>,

    /// Seed the resampling RNG for reproducible intervals.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Write the report as CSV to the given path.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Write the report as JSON to the given path.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodArg {
    /// Bias-corrected and accelerated intervals.
    Bca,
    /// Plain quantiles of the resample distribution.
    Percentile,
    /// Basic (reverse-percentile) intervals.
    Basic,
}

/// Arguments for the `occupancy` subcommand.
#[derive(Args, Debug)]
pub struct OccupancyArgs {
    /// Path to the xtck hybrid output file (e.g. k_hybrid.out).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Arguments for the `states` subcommand.
#[derive(Args, Debug)]
pub struct StatesArgs {
    /// Path to the xtck hybrid output file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Number of sites in the state pattern: 4 (S1-S4) or 6 (S0-S5).
    #[arg(short, long, default_value_t = 4, value_name = "INT")]
    pub sites: usize,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Arguments for the `ensemble` subcommand.
#[derive(Args, Debug)]
pub struct EnsembleArgs {
    /// Paths to the replica xtck output files, in replica order.
    #[arg(short, long, required = true, num_args(1..), value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Number of sites in the state pattern: 4 (S1-S4) or 6 (S0-S5).
    #[arg(short, long, default_value_t = 6, value_name = "INT")]
    pub sites: usize,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}
