//! Renderer-independent chart description.
//!
//! Each company contributes up to two series, in group order:
//! `"<company> (Historical)"` and, when it has a forecast,
//! `"<company> (Predicted)"`. Both share the company's palette color.

use crate::data::CompanyGroups;
use crate::domain::{ChartSeries, ChartSpec, LineDash, MarkerShape, PredictionRecord, SeriesKind};

pub const CHART_TITLE: &str = "Company Profit Trends and Predictions";
pub const X_TITLE: &str = "Date";
pub const Y_TITLE: &str = "Profit ($)";

/// Series colors, cycled per company.
pub const PALETTE: [&str; 10] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#06b6d4", "#f97316", "#84cc16", "#ec4899", "#6366f1",
];

/// Build the chart for historical groups plus (optional) predictions.
pub fn build_chart(groups: &CompanyGroups, predictions: &[PredictionRecord]) -> ChartSpec {
    let mut series = Vec::with_capacity(groups.len() * 2);

    for (i, group) in groups.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()].to_string();

        series.push(ChartSeries {
            name: series_name(&group.company, SeriesKind::Historical),
            company: group.company.clone(),
            kind: SeriesKind::Historical,
            color: color.clone(),
            line: LineDash::Solid,
            marker: MarkerShape::Circle,
            x: group.records.iter().map(|r| r.date.date()).collect(),
            y: group.profits(),
        });

        let forecast: Vec<&PredictionRecord> = predictions.iter().filter(|p| p.company == group.company).collect();
        if !forecast.is_empty() {
            series.push(ChartSeries {
                name: series_name(&group.company, SeriesKind::Predicted),
                company: group.company.clone(),
                kind: SeriesKind::Predicted,
                color,
                line: LineDash::Dash,
                marker: MarkerShape::Star,
                x: forecast.iter().map(|p| p.date.date()).collect(),
                y: forecast.iter().map(|p| p.profit).collect(),
            });
        }
    }

    ChartSpec {
        title: CHART_TITLE.to_string(),
        x_title: X_TITLE.to_string(),
        y_title: Y_TITLE.to_string(),
        series,
    }
}

pub fn series_name(company: &str, kind: SeriesKind) -> String {
    format!("{company} ({})", kind.label())
}
