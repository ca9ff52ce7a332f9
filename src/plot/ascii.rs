//! ASCII plotting for terminal output.
//!
//! Fixed-size grid, deterministic output (golden-testable).
//!
//! Plot elements:
//! - historical: `-` line, `o` points
//! - predicted: `.` line, `*` points
//!
//! Lines are drawn first for every series so points always overlay them.

use chrono::{Datelike, NaiveDate};

use crate::domain::{ChartSpec, SeriesKind};

/// Render a chart as a text grid with a one-line range header.
pub fn render_ascii_plot(chart: &ChartSpec, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(chart) else {
        return "Plot: no data\n".to_string();
    };
    let (t_min, t_max) = widen(day_number(d_min), day_number(d_max), 1.0);
    let (y_min, y_max) = y_range(chart).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cell = |d: NaiveDate, y: f64| {
        (
            map_x(day_number(d), t_min, t_max, width),
            map_y(y, y_min, y_max, height),
        )
    };

    for series in &chart.series {
        let line = match series.kind {
            SeriesKind::Historical => '-',
            SeriesKind::Predicted => '.',
        };
        let mut prev = None;
        for (d, y) in series.points() {
            let (x, yy) = cell(d, y);
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, x, yy, line);
            }
            prev = Some((x, yy));
        }
    }

    for series in &chart.series {
        let mark = match series.kind {
            SeriesKind::Historical => 'o',
            SeriesKind::Predicted => '*',
        };
        for (d, y) in series.points() {
            let (x, yy) = cell(d, y);
            grid[yy][x] = mark;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: date=[{d_min}, {d_max}] | profit=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Days since 0001-01-01, as a plotting coordinate.
pub fn day_number(d: NaiveDate) -> f64 {
    f64::from(d.num_days_from_ce())
}

fn date_range(chart: &ChartSpec) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = chart.series.iter().flat_map(|s| s.x.iter().copied());
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

fn y_range(chart: &ChartSpec) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &y in chart.series.iter().flat_map(|s| s.y.iter()) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    Some(widen(min_y, max_y, (min_y.abs() * 0.05).max(1.0)))
}

/// Expand a degenerate `[v, v]` range by `by` on each side.
fn widen(min: f64, max: f64, by: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - by, max + by) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only writes onto blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
