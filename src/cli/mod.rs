//! Command-line parsing for the profit forecaster.
//!
//! Argument parsing and command dispatch stay separate from the ingest and
//! training code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pf", version, about = "Company profit forecaster (spreadsheet/CSV in, per-company forecast out)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a file, forecast every company, print the report, and optionally plot/export.
    Analyze(AnalyzeArgs),
    /// Print statistics and the company breakdown only (no training).
    Stats(AnalyzeArgs),
    /// Plot a previously exported run JSON.
    Plot(PlotArgs),
}

/// Options for analysis and statistics.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Input workbook (.xlsx, .xls, .xlsm, .xlsb, .ods) or .csv file.
    #[arg(short = 'f', long, env = "PF_FILE")]
    pub file: PathBuf,

    /// Seed for weight initialization and shuffling. Random when omitted.
    #[arg(long, env = "PF_SEED")]
    pub seed: Option<u64>,

    /// Train companies one after another instead of in parallel.
    #[arg(long)]
    pub sequential: bool,

    /// Training epochs per company.
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Render the chart to an SVG file.
    #[arg(long, value_name = "SVG")]
    pub chart: Option<PathBuf>,

    /// SVG chart width (pixels).
    #[arg(long, default_value_t = 1200)]
    pub chart_width: u32,

    /// SVG chart height (pixels).
    #[arg(long, default_value_t = 600)]
    pub chart_height: u32,

    /// Export historical + predicted points to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full run (statistics, companies, predictions, chart) to JSON.
    #[arg(long = "export-run")]
    pub export_run: Option<PathBuf>,
}

/// Options for plotting a saved run.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Run JSON file produced by `pf analyze --export-run`.
    #[arg(long, value_name = "JSON")]
    pub run: PathBuf,

    /// Also render the chart to an SVG file.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
