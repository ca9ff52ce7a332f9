//! Date handling: spreadsheet serials, free-form text, month arithmetic, labels.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};

/// Day serial of 1970-01-01 in the 1900 date system (days since 1899-12-30).
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Largest timestamp magnitude (ms) we accept, ±100,000,000 days around the epoch.
const MAX_ABS_MILLIS: f64 = 8.64e15;

/// Convert a spreadsheet day serial to an instant.
///
/// `(serial - 25569) * 86400` seconds since the Unix epoch. Returns `None`
/// for non-finite or out-of-range serials.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - UNIX_EPOCH_SERIAL) * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > MAX_ABS_MILLIS {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
}

/// Parse a free-form date string.
///
/// We accept a fixed set of common spreadsheet/export formats so parsing stays
/// deterministic. Month-only inputs (`Jan 2023`, `2023-01`) resolve to the
/// first of the month.
pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    const DATETIME_FMTS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    const DATE_FMTS: [&str; 8] = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%d %b %Y",
        "%d %B %Y",
        "%Y.%m.%d",
    ];
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // Month precision: chrono needs a day, so pin it to the 1st.
    let with_day = [
        (format!("1 {s}"), "%d %b %Y"),
        (format!("1 {s}"), "%d %B %Y"),
        (format!("{s}-01"), "%Y-%m-%d"),
    ];
    for (candidate, fmt) in &with_day {
        if let Ok(d) = NaiveDate::parse_from_str(candidate, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// `date + months` calendar months; the day is clamped to the target month.
pub fn add_months(date: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    date.checked_add_months(Months::new(months))
}

/// Display label, e.g. `Jan 2023`.
pub fn month_label(date: NaiveDateTime) -> String {
    date.format("%b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn serial_epoch_and_known_dates() {
        assert_eq!(serial_to_datetime(25569.0), Some(ymd(1970, 1, 1)));
        // 44927 = 2023-01-01 in the 1900 date system.
        assert_eq!(serial_to_datetime(44927.0), Some(ymd(2023, 1, 1)));
        // Fractional part carries the time of day.
        let noon = serial_to_datetime(44927.5).unwrap();
        assert_eq!(noon, ymd(2023, 1, 1) + chrono::Duration::hours(12));
    }

    #[test]
    fn serial_rejects_non_finite_and_huge_values() {
        assert_eq!(serial_to_datetime(f64::NAN), None);
        assert_eq!(serial_to_datetime(f64::INFINITY), None);
        assert_eq!(serial_to_datetime(1e15), None);
    }

    #[test]
    fn parses_common_text_formats() {
        let jan1 = ymd(2023, 1, 1);
        for s in [
            "2023-01-01",
            "2023/01/01",
            "01/01/2023",
            "Jan 1, 2023",
            "January 1, 2023",
            "1 Jan 2023",
            "2023-01-01T00:00:00Z",
            "2023-01-01 00:00:00",
            "Jan 2023",
            "2023-01",
        ] {
            assert_eq!(parse_date_text(s), Some(jan1), "format: {s}");
        }
    }

    #[test]
    fn rejects_garbage_and_impossible_dates() {
        assert_eq!(parse_date_text("not a date"), None);
        assert_eq!(parse_date_text("2023-02-30"), None);
        assert_eq!(parse_date_text("   "), None);
    }

    #[test]
    fn month_addition_clamps_day() {
        assert_eq!(add_months(ymd(2023, 1, 31), 1), Some(ymd(2023, 2, 28)));
        assert_eq!(add_months(ymd(2023, 2, 1), 6), Some(ymd(2023, 8, 1)));
        assert_eq!(add_months(ymd(2023, 11, 15), 2), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn month_label_is_short_month_and_year() {
        assert_eq!(month_label(ymd(2023, 3, 9)), "Mar 2023");
    }
}
