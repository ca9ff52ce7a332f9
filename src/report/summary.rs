//! Dataset statistics and per-company breakdowns.

use crate::data::CompanyGroups;
use crate::domain::{CompanySummary, ObservationRecord, PredictionRecord, StatisticsSummary};

/// Descriptive statistics over the full (date-sorted) record sequence.
///
/// Returns `None` for empty input.
pub fn summarize(records: &[ObservationRecord]) -> Option<StatisticsSummary> {
    if records.is_empty() {
        return None;
    }
    let profits: Vec<f64> = records.iter().map(|r| r.profit).collect();
    let total_profit: f64 = profits.iter().sum();

    Some(StatisticsSummary {
        total_profit,
        avg_profit: total_profit / profits.len() as f64,
        max_profit: profits.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_profit: profits.iter().copied().fold(f64::INFINITY, f64::min),
        growth_rate: growth_rate(&profits),
        data_points: profits.len(),
    })
}

/// Percent change from the first-half average to the second-half average.
///
/// The split is positional at `floor(n / 2)`. `None` when the first half is
/// empty, averages to zero, or the result is not finite.
pub fn growth_rate(profits: &[f64]) -> Option<f64> {
    let (first, second) = profits.split_at(profits.len() / 2);
    let first_avg = mean(first)?;
    let second_avg = mean(second)?;
    if first_avg == 0.0 {
        return None;
    }
    let growth = (second_avg - first_avg) / first_avg * 100.0;
    growth.is_finite().then_some(growth)
}

/// One summary per company, in group order.
pub fn company_summaries(groups: &CompanyGroups, predictions: &[PredictionRecord]) -> Vec<CompanySummary> {
    groups
        .iter()
        .map(|group| {
            let profits = group.profits();
            let total_profit: f64 = profits.iter().sum();
            let forecast: Vec<f64> = predictions
                .iter()
                .filter(|p| p.company == group.company)
                .map(|p| p.profit)
                .collect();
            let predicted_total = (!forecast.is_empty()).then(|| forecast.iter().sum::<f64>());

            CompanySummary {
                company: group.company.clone(),
                data_points: profits.len(),
                total_profit,
                avg_profit: mean(&profits).unwrap_or(0.0),
                growth_rate: growth_rate(&profits),
                predicted_total,
                predicted_avg: mean(&forecast),
                next_prediction: forecast.first().copied(),
            }
        })
        .collect()
}

/// Company with the highest first-step prediction; ties keep the earlier one.
pub fn best_predicted_company(summaries: &[CompanySummary]) -> Option<&CompanySummary> {
    let mut best: Option<(&CompanySummary, f64)> = None;
    for s in summaries {
        let Some(next) = s.next_prediction else { continue };
        if best.is_none_or(|(_, top)| next > top) {
            best = Some((s, next));
        }
    }
    best.map(|(s, _)| s)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
