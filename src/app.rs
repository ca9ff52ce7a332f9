//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - runs the analysis pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::info;

use crate::cli::{AnalyzeArgs, Command, PlotArgs};
use crate::domain::{AnalysisConfig, ForecastConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pf` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args, OutputMode::Full),
        Command::Stats(args) => handle_analyze(args, OutputMode::StatsOnly),
        Command::Plot(args) => handle_plot(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    StatsOnly,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // Ignore double-init (tests, embedding).
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).try_init();
}

fn handle_analyze(args: AnalyzeArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args, mode);
    let run = pipeline::run_analysis(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, run.groups.len(), run.seed, run.statistics.as_ref())
    );
    println!("{}", crate::report::format_company_table(&run.companies));

    if let Some(forecast) = &run.forecast {
        println!("{}", crate::report::format_forecast(forecast, &run.companies));
    }

    if config.plot {
        let plot = crate::plot::render_ascii_plot(&run.chart, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.chart_svg {
        crate::plot::render_chart_svg(&run.chart, path, (config.chart_width, config.chart_height))?;
        info!("wrote chart to {}", path.display());
    }
    if let Some(path) = &config.export_series {
        crate::io::export::write_series_csv(path, &run.ingest.records, run.predictions())?;
        info!("wrote series CSV to {}", path.display());
    }
    if let Some(path) = &config.export_run {
        crate::io::run_file::write_run_json(path, &run.to_run_file())?;
        info!("wrote run JSON to {}", path.display());
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let run = crate::io::run_file::read_run_json(&args.run)?;

    let plot = crate::plot::render_ascii_plot(&run.chart, args.width, args.height);
    println!("{plot}");

    if let Some(path) = &args.svg {
        crate::plot::render_chart_svg(&run.chart, path, (1200, 600))?;
        info!("wrote chart to {}", path.display());
    }
    Ok(())
}

fn analysis_config_from_args(args: &AnalyzeArgs, mode: OutputMode) -> AnalysisConfig {
    let forecast = mode == OutputMode::Full;
    let seed = match args.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            if forecast {
                info!("no --seed given; using {seed}");
            }
            seed
        }
    };

    AnalysisConfig {
        input_path: args.file.clone(),
        forecast,
        forecast_config: ForecastConfig {
            epochs: args.epochs,
            seed,
            parallel: !args.sequential,
            ..ForecastConfig::default()
        },
        plot: forecast && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        chart_svg: args.chart.clone(),
        chart_width: args.chart_width,
        chart_height: args.chart_height,
        export_series: args.export.clone(),
        export_run: args.export_run.clone(),
    }
}

/// Rewrite argv so a bare input path means `analyze -f <path>`.
///
/// Rules:
/// - `pf`                      -> `pf analyze` (file from `PF_FILE`)
/// - `pf data.xlsx ...`        -> `pf analyze -f data.xlsx ...`
/// - `pf --seed 1 ...`         -> `pf analyze --seed 1 ...`
/// - `pf --help/--version/-h`  -> unchanged
/// - anything naming a subcommand -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let names_subcommand = argv[1..]
        .iter()
        .any(|a| matches!(a.as_str(), "analyze" | "stats" | "plot"));
    if names_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    argv.splice(1..1, ["analyze".to_string(), "-f".to_string()]);
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rewrite_bare_path_to_analyze() {
        assert_eq!(
            rewrite_args(args(&["pf", "data.xlsx", "--seed", "3"])),
            args(&["pf", "analyze", "-f", "data.xlsx", "--seed", "3"])
        );
    }

    #[test]
    fn rewrite_leaves_subcommands_and_help() {
        let explicit = args(&["pf", "stats", "-f", "x.csv"]);
        assert_eq!(rewrite_args(explicit.clone()), explicit);
        let verbose_first = args(&["pf", "-v", "plot", "--run", "r.json"]);
        assert_eq!(rewrite_args(verbose_first.clone()), verbose_first);
        assert_eq!(rewrite_args(args(&["pf", "--help"])), args(&["pf", "--help"]));
    }

    #[test]
    fn rewrite_defaults_to_analyze() {
        assert_eq!(rewrite_args(args(&["pf"])), args(&["pf", "analyze"]));
        assert_eq!(
            rewrite_args(args(&["pf", "-f", "x.csv"])),
            args(&["pf", "analyze", "-f", "x.csv"])
        );
    }

    #[test]
    fn stats_mode_disables_training_and_plot() {
        let cli = crate::cli::Cli::try_parse_from(["pf", "stats", "-f", "x.csv", "--seed", "9"]).unwrap();
        let Command::Stats(a) = cli.command else {
            panic!("expected stats");
        };
        let cfg = analysis_config_from_args(&a, OutputMode::StatsOnly);
        assert!(!cfg.forecast && !cfg.plot);
        assert_eq!(cfg.forecast_config.seed, 9);
    }

    #[test]
    fn analyze_maps_flags_into_config() {
        let cli = crate::cli::Cli::try_parse_from([
            "pf",
            "analyze",
            "-f",
            "x.csv",
            "--seed",
            "5",
            "--sequential",
            "--no-plot",
            "--export",
            "out.csv",
        ])
        .unwrap();
        let Command::Analyze(a) = cli.command else {
            panic!("expected analyze");
        };
        let cfg = analysis_config_from_args(&a, OutputMode::Full);
        assert!(cfg.forecast && !cfg.plot);
        assert!(!cfg.forecast_config.parallel);
        assert_eq!(cfg.forecast_config.seed, 5);
        assert_eq!(cfg.export_series.as_deref(), Some(std::path::Path::new("out.csv")));
    }
}
