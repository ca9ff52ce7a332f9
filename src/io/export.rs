//! Export historical and forecast points to CSV.
//!
//! One row per point so the file loads straight into a spreadsheet pivot:
//! `company,kind,date,month,profit`.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ObservationRecord, PredictionRecord, SeriesKind};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct SeriesRow<'a> {
    company: &'a str,
    kind: SeriesKind,
    date: String,
    month: &'a str,
    profit: String,
}

/// Write every observation, then every prediction, to a CSV file.
pub fn write_series_csv(
    path: &Path,
    records: &[ObservationRecord],
    predictions: &[PredictionRecord],
) -> Result<(), AppError> {
    let writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_series(writer, records, predictions)
}

/// Same as `write_series_csv`, into any writer.
pub fn write_series<W: Write>(
    mut writer: csv::Writer<W>,
    records: &[ObservationRecord],
    predictions: &[PredictionRecord],
) -> Result<(), AppError> {
    let historical = records.iter().map(|r| SeriesRow {
        company: &r.company,
        kind: SeriesKind::Historical,
        date: r.date.format("%Y-%m-%d").to_string(),
        month: &r.month,
        profit: format!("{:.4}", r.profit),
    });
    let predicted = predictions.iter().map(|p| SeriesRow {
        company: &p.company,
        kind: SeriesKind::Predicted,
        date: p.date.format("%Y-%m-%d").to_string(),
        month: &p.month,
        profit: format!("{:.4}", p.profit),
    });

    for row in historical.chain(predicted) {
        writer
            .serialize(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;

    Ok(())
}
