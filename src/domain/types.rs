//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages by value
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of future steps forecast per company.
pub const FORECAST_HORIZON: u32 = 6;

/// Minimum observations a company needs before it is forecast.
pub const MIN_OBSERVATIONS: usize = 2;

/// Accepted header spellings, in lookup priority order.
pub const DATE_ALIASES: &[&str] = &["date", "Date", "DATE"];
pub const COMPANY_ALIASES: &[&str] = &["company name", "Company Name", "company", "Company"];
pub const PROFIT_ALIASES: &[&str] = &["profit", "Profit", "PROFIT"];

/// A single decoded spreadsheet/CSV cell.
///
/// Spreadsheet date cells arrive as `Number` (the day serial); the normalizer
/// decides how to interpret them.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Short representation used in error messages.
    pub fn describe(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(v) => v.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

/// One data row keyed by header name. Empty cells are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(header, value)` pairs. Later duplicates of a header
    /// are ignored, matching how the loader treats duplicate columns.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CellValue)>,
    {
        let mut row = Self::new();
        for (key, value) in pairs {
            row.insert(key, value);
        }
        row
    }

    /// Insert a cell unless the header is already present or the cell is empty.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        if value.is_empty() {
            return;
        }
        self.cells.entry(key.into()).or_insert(value);
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.get(key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A normalized observation: one (date, company, profit) data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: NaiveDateTime,
    pub company: String,
    /// Always finite; unparsable inputs become 0.
    pub profit: f64,
    /// Display label, e.g. `Jan 2023`.
    pub month: String,
}

/// A forecast point produced by the forecast engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDateTime,
    pub company: String,
    /// Clamped to `>= 0`.
    pub profit: f64,
    pub month: String,
    pub is_prediction: bool,
}

/// Descriptive statistics over the whole normalized dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_profit: f64,
    pub avg_profit: f64,
    pub max_profit: f64,
    pub min_profit: f64,
    /// Percent change between the first- and second-half averages.
    ///
    /// `None` when the first half is empty or averages to zero.
    pub growth_rate: Option<f64>,
    pub data_points: usize,
}

/// Per-company breakdown (history + forecast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub company: String,
    pub data_points: usize,
    pub total_profit: f64,
    pub avg_profit: f64,
    /// Half-split growth computed within this company only.
    pub growth_rate: Option<f64>,
    pub predicted_total: Option<f64>,
    pub predicted_avg: Option<f64>,
    /// First forecast step (used for "most profitable next period").
    pub next_prediction: Option<f64>,
}

/// Training diagnostics for one company's regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFit {
    pub company: String,
    pub observations: usize,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub epochs: usize,
    pub final_loss: f64,
    pub final_val_loss: Option<f64>,
    pub seed: u64,
}

/// Whether a chart series shows observed or forecast values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Historical,
    Predicted,
}

impl SeriesKind {
    pub fn label(self) -> &'static str {
        match self {
            SeriesKind::Historical => "Historical",
            SeriesKind::Predicted => "Predicted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    Solid,
    Dash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Circle,
    Star,
}

/// One logical series handed to a chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Legend entry, `"<company> (Historical|Predicted)"`.
    pub name: String,
    pub company: String,
    pub kind: SeriesKind,
    /// Hex color, `#rrggbb`.
    pub color: String,
    pub line: LineDash,
    pub marker: MarkerShape,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

impl ChartSeries {
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Renderer-independent chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub series: Vec<ChartSeries>,
}

/// Training hyperparameters for the per-company regressor.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub validation_split: f64,
    pub batch_size: usize,
    pub horizon: u32,
    /// Base seed; each company derives its own from this and its name.
    pub seed: u64,
    /// Train companies on the rayon pool instead of one after another.
    pub parallel: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.1,
            validation_split: 0.2,
            batch_size: 32,
            horizon: FORECAST_HORIZON,
            seed: 0,
            parallel: true,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input_path: PathBuf,
    /// Skip training (statistics and breakdown only).
    pub forecast: bool,
    pub forecast_config: ForecastConfig,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub chart_svg: Option<PathBuf>,
    pub chart_width: u32,
    pub chart_height: u32,

    pub export_series: Option<PathBuf>,
    pub export_run: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            forecast: true,
            forecast_config: ForecastConfig::default(),
            plot: true,
            plot_width: 100,
            plot_height: 25,
            chart_svg: None,
            chart_width: 1200,
            chart_height: 600,
            export_series: None,
            export_run: None,
        }
    }
}

/// A saved run (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub tool: String,
    pub source: String,
    pub seed: Option<u64>,
    pub statistics: Option<StatisticsSummary>,
    pub companies: Vec<CompanySummary>,
    pub predictions: Vec<PredictionRecord>,
    /// Absent in files written before diagnostics were exported.
    #[serde(default)]
    pub fits: Vec<CompanyFit>,
    pub chart: ChartSpec,
}
