//! Formatted terminal output.
//!
//! All report text is built here so the pipeline stays free of presentation
//! concerns. Every function returns a `String`; the binary decides where it
//! goes.

use crate::domain::{CompanyFit, CompanySummary, StatisticsSummary};
use crate::fit::ForecastReport;
use crate::io::ingest::IngestedData;
use crate::report::best_predicted_company;

/// Header + dataset statistics.
pub fn format_run_summary(
    ingest: &IngestedData,
    companies: usize,
    seed: Option<u64>,
    stats: Option<&StatisticsSummary>,
) -> String {
    let mut out = String::new();

    out.push_str("=== pf - Company Profit Forecast ===\n");
    out.push_str(&format!(
        "Source: {}{}\n",
        ingest.source,
        ingest
            .sheet_name
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default()
    ));
    out.push_str(&format!(
        "Rows: read={} | observations={} | companies={companies}\n",
        ingest.rows_read,
        ingest.records.len()
    ));
    if let (Some(first), Some(last)) = (ingest.records.first(), ingest.records.last()) {
        out.push_str(&format!("Range: {} .. {}\n", first.month, last.month));
    }
    if let Some(seed) = seed {
        out.push_str(&format!("Seed: {seed}\n"));
    }

    if let Some(s) = stats {
        out.push_str("\nSummary:\n");
        out.push_str(&format!("  Total profit : {}\n", fmt_currency(s.total_profit)));
        out.push_str(&format!("  Average      : {}\n", fmt_currency(s.avg_profit)));
        out.push_str(&format!("  Highest      : {}\n", fmt_currency(s.max_profit)));
        out.push_str(&format!("  Lowest       : {}\n", fmt_currency(s.min_profit)));
        out.push_str(&format!("  Growth       : {}\n", fmt_percentage(s.growth_rate)));
        out.push_str(&format!("  Data points  : {}\n", s.data_points));
    }

    out
}

/// Per-company history table (plus forecast totals when available).
pub fn format_company_table(summaries: &[CompanySummary]) -> String {
    let mut out = String::new();
    out.push_str("Company performance:\n");
    push_row(
        &mut out,
        format!(
            "{:<24} {:>6} {:>14} {:>12} {:>9} {:>14} {:>12}",
            "company", "points", "total", "avg", "growth", "pred_total", "pred_avg"
        ),
    );
    push_row(
        &mut out,
        format!(
            "{:-<24} {:-<6} {:-<14} {:-<12} {:-<9} {:-<14} {:-<12}",
            "", "", "", "", "", "", ""
        ),
    );

    for s in summaries {
        push_row(
            &mut out,
            format!(
                "{:<24} {:>6} {:>14} {:>12} {:>9} {:>14} {:>12}",
                truncate(&s.company, 24),
                s.data_points,
                fmt_currency(s.total_profit),
                fmt_currency(s.avg_profit),
                fmt_percentage(s.growth_rate),
                s.predicted_total.map(fmt_currency).unwrap_or_default(),
                s.predicted_avg.map(fmt_currency).unwrap_or_default(),
            ),
        );
    }

    out
}

/// Month-by-month forecast per company, skipped companies, and the top pick.
pub fn format_forecast(report: &ForecastReport, summaries: &[CompanySummary]) -> String {
    let mut out = String::new();
    out.push_str("Forecast:\n");

    for s in summaries {
        let rows: Vec<_> = report.for_company(&s.company).collect();
        if rows.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "- {} ({} months, total {}, avg {})\n",
            s.company,
            rows.len(),
            s.predicted_total.map(fmt_currency).unwrap_or_default(),
            s.predicted_avg.map(fmt_currency).unwrap_or_default(),
        ));
        if let Some(fit) = report.fits.iter().find(|f| f.company == s.company) {
            out.push_str(&format!("    {}\n", format_fit(fit)));
        }
        for p in rows {
            out.push_str(&format!("    {:<9} {:>14}\n", p.month, fmt_currency(p.profit)));
        }
    }

    for skipped in &report.skipped {
        out.push_str(&format!("  (no forecast for {}) {}\n", skipped.company, skipped.reason));
    }

    if let Some(best) = best_predicted_company(summaries) {
        out.push_str(&format!(
            "\nPredicted most profitable next month: {} ({})\n",
            best.company,
            best.next_prediction.map(fmt_currency).unwrap_or_default()
        ));
    }

    out
}

/// One-line training summary: `fit: 4 train / 1 val, 100 epochs, loss 12.50, val 3.20`.
pub fn format_fit(fit: &CompanyFit) -> String {
    format!(
        "fit: {} train / {} val, {} epochs, loss {:.2}, val {}",
        fit.train_samples,
        fit.validation_samples,
        fit.epochs,
        fit.final_loss,
        fit.final_val_loss.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string()),
    )
}

/// Whole dollars with thousands separators: `$1,235`, `-$40`.
pub fn fmt_currency(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Signed percentage with one decimal: `+133.3%`; `n/a` when undefined.
pub fn fmt_percentage(v: Option<f64>) -> String {
    match v {
        Some(p) if p >= 0.0 => format!("+{p:.1}%"),
        Some(p) => format!("{p:.1}%"),
        None => "n/a".to_string(),
    }
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
