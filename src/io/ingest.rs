//! Spreadsheet/CSV ingest and row normalization.
//!
//! This module is responsible for turning a heterogeneous profit spreadsheet
//! into a clean, date-sorted sequence of `ObservationRecord`s.
//!
//! Design goals:
//! - **Fail fast**: a row missing a required field, or with an unreadable date,
//!   aborts the whole file (no partial ingestion) and names the 1-based row
//! - **Lenient profits**: unparsable profit values become 0 instead of failing
//! - **Separation of concerns**: decoding (`load_raw_rows`) knows nothing about
//!   the domain; normalization (`normalize_rows`) knows nothing about files

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use log::{debug, info};

use crate::data::dates::{month_label, parse_date_text, serial_to_datetime};
use crate::domain::{CellValue, ObservationRecord, RawRow, COMPANY_ALIASES, DATE_ALIASES, PROFIT_ALIASES};
use crate::error::IngestError;

/// Input file flavours we know how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Workbook,
    Csv,
}

impl SourceKind {
    /// Pick the decoder from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(SourceKind::Workbook),
            "csv" => Ok(SourceKind::Csv),
            _ => Err(IngestError::UnsupportedFile(path.display().to_string())),
        }
    }
}

/// Decoded rows from the first sheet (or the CSV body).
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub source: String,
    pub sheet_name: Option<String>,
    pub rows: Vec<RawRow>,
}

/// Ingest output: normalized records + provenance.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: String,
    pub sheet_name: Option<String>,
    pub records: Vec<ObservationRecord>,
    pub rows_read: usize,
}

/// Load a file and normalize every row.
pub fn load_observations(path: &Path) -> Result<IngestedData, IngestError> {
    let sheet = load_raw_rows(path)?;
    let records = normalize_rows(&sheet.rows)?;
    info!(
        "normalized {} row(s) from {}{}",
        records.len(),
        sheet.source,
        sheet
            .sheet_name
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default()
    );

    Ok(IngestedData {
        rows_read: sheet.rows.len(),
        source: sheet.source,
        sheet_name: sheet.sheet_name,
        records,
    })
}

/// Decode the first sheet of a workbook, or a CSV file, into raw rows.
///
/// The first row supplies the keys. Fully blank rows are skipped and do not
/// count towards row numbering.
pub fn load_raw_rows(path: &Path) -> Result<RawSheet, IngestError> {
    match SourceKind::from_path(path)? {
        SourceKind::Workbook => load_workbook(path),
        SourceKind::Csv => load_csv(path),
    }
}

fn load_workbook(path: &Path) -> Result<RawSheet, IngestError> {
    let source = path.display().to_string();
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Workbook {
        path: source.clone(),
        message: e.to_string(),
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::NoSheets(source.clone()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoSheets(source.clone()))?
        .map_err(|e| IngestError::Workbook {
            path: source.clone(),
            message: e.to_string(),
        })?;

    let mut grid = range.rows();
    let headers: Vec<String> = grid
        .next()
        .ok_or_else(|| IngestError::EmptySheet(source.clone()))?
        .iter()
        .map(|cell| header_name(&cell_from_data(cell).describe()))
        .collect();

    let rows = rows_from_grid(&headers, grid.map(|row| row.iter().map(cell_from_data).collect()));
    debug!("decoded {} data row(s) from sheet '{sheet_name}'", rows.len());

    Ok(RawSheet {
        source,
        sheet_name: Some(sheet_name),
        rows,
    })
}

fn load_csv(path: &Path) -> Result<RawSheet, IngestError> {
    let source = path.display().to_string();
    let csv_err = |e: csv::Error| IngestError::Csv {
        path: source.clone(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader.headers().map_err(csv_err)?.iter().map(header_name).collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptySheet(source.clone()));
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        records.push(record.iter().map(cell_from_text).collect::<Vec<_>>());
    }

    let rows = rows_from_grid(&headers, records.into_iter());
    debug!("decoded {} data row(s) from CSV", rows.len());

    Ok(RawSheet {
        source,
        sheet_name: None,
        rows,
    })
}

/// Zip header names with each row's cells, dropping blank rows.
pub fn rows_from_grid<I>(headers: &[String], grid: I) -> Vec<RawRow>
where
    I: Iterator<Item = Vec<CellValue>>,
{
    grid.filter_map(|cells| {
        let row = RawRow::from_pairs(
            headers
                .iter()
                .zip(cells)
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, cell)| (name.clone(), cell)),
        );
        (!row.is_empty()).then_some(row)
    })
    .collect()
}

fn header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. Casing is preserved: alias lookup is case-exact.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        // Date-formatted cells keep their serial; the normalizer converts it.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Infer a cell type from CSV text: numbers and booleans are typed, the rest is text.
fn cell_from_text(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(v) = s.parse::<f64>() {
        if v.is_finite() {
            return CellValue::Number(v);
        }
    }
    match s {
        "true" | "TRUE" => CellValue::Bool(true),
        "false" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

/// Normalize raw rows into observation records, sorted ascending by date.
///
/// Fails on the first row missing a date/company/profit or carrying an
/// unreadable date; nothing is returned for the other rows in that case.
pub fn normalize_rows(rows: &[RawRow]) -> Result<Vec<ObservationRecord>, IngestError> {
    let mut records = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| normalize_row(row, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: rows sharing a date keep their file order.
    records.sort_by_key(|r| r.date);
    Ok(records)
}

fn normalize_row(row: &RawRow, row_number: usize) -> Result<ObservationRecord, IngestError> {
    let missing = |field| IngestError::MissingField { row: row_number, field };

    let date_cell = resolve_field(row, DATE_ALIASES).ok_or_else(|| missing("date"))?;
    let company_cell = resolve_field(row, COMPANY_ALIASES).ok_or_else(|| missing("company name"))?;
    let profit_cell = resolve_profit_field(row).ok_or_else(|| missing("profit"))?;

    let date = parse_cell_date(date_cell).ok_or_else(|| IngestError::InvalidDate {
        row: row_number,
        value: date_cell.describe(),
    })?;
    let company = company_name(company_cell).ok_or_else(|| missing("company name"))?;

    Ok(ObservationRecord {
        date,
        company,
        profit: coerce_profit(profit_cell),
        month: month_label(date),
    })
}

/// Return the first present value among `aliases`, in priority order.
///
/// Blank text counts as absent. Used for the date and company cells.
pub fn resolve_field<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a CellValue> {
    aliases.iter().filter_map(|alias| row.get(alias)).find(|cell| match cell {
        CellValue::Empty => false,
        CellValue::Text(s) => !s.trim().is_empty(),
        _ => true,
    })
}

/// Like [`resolve_field`], but blank text is present and coerces to 0.
pub fn resolve_profit_field(row: &RawRow) -> Option<&CellValue> {
    PROFIT_ALIASES
        .iter()
        .filter_map(|alias| row.get(alias))
        .find(|cell| !matches!(cell, CellValue::Empty))
}

fn parse_cell_date(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::Number(serial) => serial_to_datetime(*serial),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

fn company_name(cell: &CellValue) -> Option<String> {
    let name = match cell {
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Number(v) => v.to_string(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Empty => return None,
    };
    (!name.is_empty()).then_some(name)
}

/// Coerce a profit cell to a finite number; anything unreadable is 0.
pub fn coerce_profit(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(v) if v.is_finite() => *v,
        CellValue::Text(s) => parse_float_prefix(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse the longest leading decimal number in `s` (`"100 USD"` -> 100).
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            end = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut j = end + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn row(date: CellValue, company: CellValue, profit: CellValue) -> RawRow {
        RawRow::from_pairs([("date", date), ("company name", company), ("profit", profit)])
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn resolves_aliases_in_priority_order() {
        let r = RawRow::from_pairs([
            ("Company", text("Fallback")),
            ("company name", text("Primary")),
        ]);
        assert_eq!(resolve_field(&r, COMPANY_ALIASES), Some(&text("Primary")));

        let r = RawRow::from_pairs([("Company Name", text("  ")), ("company", text("Lower"))]);
        assert_eq!(resolve_field(&r, COMPANY_ALIASES), Some(&text("Lower")));

        let r = RawRow::from_pairs([("PROFIT", CellValue::Number(0.0))]);
        assert_eq!(resolve_field(&r, PROFIT_ALIASES), Some(&CellValue::Number(0.0)));
    }

    #[test]
    fn normalizes_and_sorts_by_date() {
        let rows = vec![
            row(text("2023-03-01"), text("Acme"), CellValue::Number(30.0)),
            row(text("2023-01-01"), text("Acme"), CellValue::Number(10.0)),
            row(CellValue::Number(44958.0), text("Beta"), text("20")),
        ];
        let records = normalize_rows(&rows).unwrap();

        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2023, 1, 1), ymd(2023, 2, 1), ymd(2023, 3, 1)]);
        assert_eq!(records[1].company, "Beta");
        assert_eq!(records[1].profit, 20.0);
        assert_eq!(records[1].month, "Feb 2023");
    }

    #[test]
    fn missing_profit_under_every_alias_fails_with_row_index() {
        let rows = vec![
            row(text("2023-01-01"), text("Acme"), CellValue::Number(1.0)),
            RawRow::from_pairs([("Date", text("2023-02-01")), ("Company", text("Acme"))]),
            row(text("2023-03-01"), text("Acme"), CellValue::Number(3.0)),
        ];
        let err = normalize_rows(&rows).unwrap_err();
        assert_eq!(err, IngestError::MissingField { row: 2, field: "profit" });
    }

    #[test]
    fn missing_date_and_company_are_reported() {
        let no_date = RawRow::from_pairs([("company", text("Acme")), ("profit", CellValue::Number(1.0))]);
        assert_eq!(
            normalize_rows(&[no_date]).unwrap_err(),
            IngestError::MissingField { row: 1, field: "date" }
        );

        let blank_company = row(text("2023-01-01"), text(""), CellValue::Number(1.0));
        assert_eq!(
            normalize_rows(&[blank_company]).unwrap_err(),
            IngestError::MissingField { row: 1, field: "company name" }
        );
    }

    #[test]
    fn invalid_date_fails_with_row_index() {
        let rows = vec![
            row(text("2023-01-01"), text("Acme"), CellValue::Number(1.0)),
            row(text("next tuesday"), text("Acme"), CellValue::Number(1.0)),
        ];
        let err = normalize_rows(&rows).unwrap_err();
        assert_eq!(err.row(), Some(2));
        assert!(matches!(err, IngestError::InvalidDate { .. }));

        let bool_date = row(CellValue::Bool(true), text("Acme"), CellValue::Number(1.0));
        assert!(matches!(normalize_rows(&[bool_date]), Err(IngestError::InvalidDate { row: 1, .. })));
    }

    #[test]
    fn unparsable_profit_defaults_to_zero() {
        let rows = vec![
            row(text("2023-01-01"), text("A"), text("n/a")),
            row(text("2023-01-02"), text("A"), text("100 USD")),
            row(text("2023-01-03"), text("A"), CellValue::Bool(true)),
            row(text("2023-01-04"), text("A"), CellValue::Number(f64::INFINITY)),
            row(text("2023-01-05"), text("A"), text("-1.5e2")),
        ];
        let profits: Vec<f64> = normalize_rows(&rows).unwrap().iter().map(|r| r.profit).collect();
        assert_eq!(profits, vec![0.0, 100.0, 0.0, 0.0, -150.0]);
    }

    #[test]
    fn blank_profit_text_is_zero_not_missing() {
        let r = row(text("2023-01-01"), text("Acme"), text("   "));
        assert_eq!(normalize_rows(&[r]).unwrap()[0].profit, 0.0);

        let empty = row(text("2023-01-01"), text("Acme"), CellValue::Empty);
        assert_eq!(
            normalize_rows(&[empty]).unwrap_err(),
            IngestError::MissingField { row: 1, field: "profit" }
        );

        // A blank primary alias still wins over a later one.
        let r = RawRow::from_pairs([
            ("date", text("2023-01-01")),
            ("company name", text("Acme")),
            ("profit", text(" ")),
            ("Profit", CellValue::Number(9.0)),
        ]);
        assert_eq!(normalize_rows(&[r]).unwrap()[0].profit, 0.0);
    }

    #[test]
    fn numeric_company_names_render_without_trailing_zero() {
        let r = row(text("2023-01-01"), CellValue::Number(42.0), CellValue::Number(1.0));
        assert_eq!(normalize_rows(&[r]).unwrap()[0].company, "42");
    }

    #[test]
    fn normalizing_sorted_records_is_idempotent() {
        let rows = vec![
            row(text("2023-02-01"), text("B"), CellValue::Number(2.0)),
            row(text("2023-01-01"), text("A"), CellValue::Number(1.0)),
            row(text("2023-02-01"), text("A"), CellValue::Number(3.0)),
        ];
        let first = normalize_rows(&rows).unwrap();

        let again: Vec<RawRow> = first
            .iter()
            .map(|r| {
                row(
                    text(&r.date.format("%Y-%m-%d").to_string()),
                    text(&r.company),
                    CellValue::Number(r.profit),
                )
            })
            .collect();
        assert_eq!(normalize_rows(&again).unwrap(), first);
        // Ties on date keep file order.
        assert_eq!(first[1].company, "B");
        assert_eq!(first[2].company, "A");
    }

    #[test]
    fn float_prefix_parsing() {
        assert_eq!(parse_float_prefix("  12.5abc"), Some(12.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("3."), Some(3.0));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("$100"), None);
        assert_eq!(parse_float_prefix("-"), None);
    }

    #[test]
    fn source_kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a.XLSX")).unwrap(), SourceKind::Workbook);
        assert_eq!(SourceKind::from_path(Path::new("a.xls")).unwrap(), SourceKind::Workbook);
        assert_eq!(SourceKind::from_path(Path::new("a.csv")).unwrap(), SourceKind::Csv);
        assert!(matches!(
            SourceKind::from_path(Path::new("a.txt")),
            Err(IngestError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn grid_rows_skip_blank_rows_and_unnamed_columns() {
        let headers = vec!["date".to_string(), String::new(), "profit".to_string()];
        let grid = vec![
            vec![text("2023-01-01"), text("ignored"), CellValue::Number(1.0)],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
            vec![text("2023-01-02")],
        ];
        let rows = rows_from_grid(&headers, grid.into_iter());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].get("date"), Some(&text("2023-01-02")));
    }

    #[test]
    fn csv_cells_are_typed() {
        assert_eq!(cell_from_text(""), CellValue::Empty);
        assert_eq!(cell_from_text("12"), CellValue::Number(12.0));
        assert_eq!(cell_from_text("TRUE"), CellValue::Bool(true));
        assert_eq!(cell_from_text("2023-01-01"), text("2023-01-01"));
    }
}
