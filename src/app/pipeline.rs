//! Shared analysis pipeline.
//!
//! ingest -> normalize -> group -> forecast -> statistics -> company summaries -> chart
//!
//! The CLI only decides what to print and what to write; everything computed
//! lives in `RunOutput`.

use log::info;

use crate::data::{CompanyGroups, group_by_company};
use crate::domain::{AnalysisConfig, ChartSpec, CompanySummary, PredictionRecord, RunFile, StatisticsSummary};
use crate::error::AppError;
use crate::fit::{ForecastReport, forecast_companies};
use crate::io::ingest::{IngestedData, load_observations};
use crate::plot::build_chart;
use crate::report::{company_summaries, summarize};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub groups: CompanyGroups,
    /// `None` when forecasting was disabled.
    pub forecast: Option<ForecastReport>,
    pub statistics: Option<StatisticsSummary>,
    pub companies: Vec<CompanySummary>,
    pub chart: ChartSpec,
    /// Run seed, when training happened.
    pub seed: Option<u64>,
}

impl RunOutput {
    pub fn predictions(&self) -> &[PredictionRecord] {
        self.forecast.as_ref().map(|f| f.predictions.as_slice()).unwrap_or(&[])
    }

    /// Portable snapshot for `pf plot --run`.
    pub fn to_run_file(&self) -> RunFile {
        RunFile {
            tool: "pf".to_string(),
            source: self.ingest.source.clone(),
            seed: self.seed,
            statistics: self.statistics.clone(),
            companies: self.companies.clone(),
            predictions: self.predictions().to_vec(),
            fits: self.forecast.as_ref().map(|f| f.fits.clone()).unwrap_or_default(),
            chart: self.chart.clone(),
        }
    }
}

/// Load the configured input file and run the pipeline on it.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let ingest = load_observations(&config.input_path)?;
    run_with_ingest(config, ingest)
}

/// Run the pipeline on already-normalized data.
pub fn run_with_ingest(config: &AnalysisConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    if ingest.records.is_empty() {
        return Err(AppError::new(
            3,
            format!("No data rows found in '{}'.", ingest.source),
        ));
    }

    let groups = group_by_company(&ingest.records);
    info!("{} companies", groups.len());

    let forecast = config.forecast.then(|| {
        info!(
            "training {} companies (seed {}, {})",
            groups.len(),
            config.forecast_config.seed,
            if config.forecast_config.parallel { "parallel" } else { "sequential" }
        );
        forecast_companies(&groups, &config.forecast_config)
    });
    let predictions = forecast.as_ref().map(|f| f.predictions.as_slice()).unwrap_or(&[]);

    let statistics = summarize(&ingest.records);
    let companies = company_summaries(&groups, predictions);
    let chart = build_chart(&groups, predictions);

    Ok(RunOutput {
        seed: config.forecast.then_some(config.forecast_config.seed),
        ingest,
        groups,
        forecast,
        statistics,
        companies,
        chart,
    })
}
