//! Plotters-powered SVG chart.
//!
//! Draws a `ChartSpec` with dates on the x axis (as day numbers, labelled
//! `%b %Y`) and dollar amounts on the y axis. Historical series are solid
//! lines with circle markers; predicted series are dashed with star markers.

use std::path::Path;

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::element::Polygon;
use plotters::prelude::*;

use crate::domain::{ChartSpec, LineDash, MarkerShape};
use crate::error::AppError;
use crate::plot::ascii::day_number;
use crate::report::fmt_currency;

const GRID_COLOR: RGBColor = RGBColor(0xe5, 0xe7, 0xeb);
const MARKER_RADIUS: i32 = 5;

/// Render the chart to an SVG file.
pub fn render_chart_svg(chart: &ChartSpec, path: &Path, size: (u32, u32)) -> Result<(), AppError> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    draw_chart(&root, chart).map_err(|e| AppError::new(4, format!("Failed to render chart: {e}")))?;
    root.present()
        .map_err(|e| AppError::new(2, format!("Failed to write chart '{}': {e}", path.display())))?;
    Ok(())
}

/// Render the chart to an in-memory SVG document.
pub fn render_chart_svg_string(chart: &ChartSpec, size: (u32, u32)) -> Result<String, AppError> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, size).into_drawing_area();
        draw_chart(&root, chart).map_err(|e| AppError::new(4, format!("Failed to render chart: {e}")))?;
        root.present()
            .map_err(|e| AppError::new(4, format!("Failed to finish chart: {e}")))?;
    }
    Ok(buf)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartSpec,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let Some(((x0, x1), (y0, y1))) = bounds(chart) else {
        root.titled(&chart.title, ("sans-serif", 22))?;
        return Ok(());
    };

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 22))
        .margin(16)
        .set_label_area_size(LabelAreaPosition::Left, 90)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&GRID_COLOR)
        .light_line_style(&WHITE)
        .x_desc(chart.x_title.as_str())
        .y_desc(chart.y_title.as_str())
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&|v| day_label(*v))
        .y_label_formatter(&|v| fmt_currency(*v))
        .draw()?;

    for series in &chart.series {
        let color = parse_hex_color(&series.color).unwrap_or(BLACK);
        let points: Vec<(f64, f64)> = series.points().map(|(d, y)| (day_number(d), y)).collect();

        let anno = match series.line {
            LineDash::Solid => ctx.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(3)))?,
            LineDash::Dash => ctx.draw_series(DashedLineSeries::new(
                points.iter().copied(),
                8,
                5,
                color.stroke_width(2),
            ))?,
        };
        anno.label(series.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        match series.marker {
            MarkerShape::Circle => {
                ctx.draw_series(points.iter().map(|&p| Circle::new(p, MARKER_RADIUS, color.filled())))?;
            }
            MarkerShape::Star => {
                ctx.draw_series(
                    points
                        .iter()
                        .map(|&p| EmptyElement::at(p) + Polygon::new(star_vertices(MARKER_RADIUS + 1), color.filled())),
                )?;
            }
        }
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// `(x range, y range)` covering every point, padded; `None` for an empty chart.
fn bounds(chart: &ChartSpec) -> Option<((f64, f64), (f64, f64))> {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);
    for (d, v) in chart.series.iter().flat_map(|s| s.points()) {
        let t = day_number(d);
        x = (x.0.min(t), x.1.max(t));
        y = (y.0.min(v), y.1.max(v));
    }
    if !(x.0.is_finite() && y.0.is_finite()) {
        return None;
    }

    let x_pad = ((x.1 - x.0) * 0.03).max(15.0);
    let y_pad = ((y.1 - y.0) * 0.08).max(y.1.abs() * 0.05).max(1.0);
    Some(((x.0 - x_pad, x.1 + x_pad), (y.0 - y_pad, y.1 + y_pad)))
}

fn day_label(day: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_default()
}

/// Five-pointed star centered on the origin, tip up (backend y grows down).
fn star_vertices(radius: i32) -> Vec<(i32, i32)> {
    let outer = f64::from(radius);
    let inner = outer * 0.45;
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = -std::f64::consts::FRAC_PI_2 + f64::from(i) * std::f64::consts::PI / 5.0;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect()
}

/// `#rrggbb` → color.
pub fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartSeries, SeriesKind};

    fn series(kind: SeriesKind, line: LineDash, marker: MarkerShape, days: &[u32], y: &[f64]) -> ChartSeries {
        ChartSeries {
            name: format!("Acme ({})", kind.label()),
            company: "Acme".to_string(),
            kind,
            color: "#3b82f6".to_string(),
            line,
            marker,
            x: days
                .iter()
                .map(|&m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap())
                .collect(),
            y: y.to_vec(),
        }
    }

    fn sample_chart() -> ChartSpec {
        ChartSpec {
            title: "Company Profit Trends and Predictions".to_string(),
            x_title: "Date".to_string(),
            y_title: "Profit ($)".to_string(),
            series: vec![
                series(SeriesKind::Historical, LineDash::Solid, MarkerShape::Circle, &[1, 2], &[100.0, 120.0]),
                series(
                    SeriesKind::Predicted,
                    LineDash::Dash,
                    MarkerShape::Star,
                    &[3, 4, 5],
                    &[130.0, 135.0, 140.0],
                ),
            ],
        }
    }

    #[test]
    fn svg_contains_title_and_legend() {
        let svg = render_chart_svg_string(&sample_chart(), (800, 400)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Company Profit Trends and Predictions"));
        assert!(svg.contains("Acme (Historical)"));
        assert!(svg.contains("Acme (Predicted)"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn empty_chart_still_renders() {
        let mut chart = sample_chart();
        chart.series.clear();
        let svg = render_chart_svg_string(&chart, (400, 200)).unwrap();
        assert!(svg.contains("Company Profit Trends and Predictions"));
    }

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render_chart_svg(&sample_chart(), &path, (640, 360)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("</svg>"));
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#3b82f6"), Some(RGBColor(0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex_color("3b82f6"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn day_labels_round_trip_dates() {
        let d = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        assert_eq!(day_label(day_number(d)), "Mar 2023");
    }

    #[test]
    fn star_has_ten_vertices_with_tip_up() {
        let v = star_vertices(6);
        assert_eq!(v.len(), 10);
        assert_eq!(v[0], (0, -6));
    }
}
