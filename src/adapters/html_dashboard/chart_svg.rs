//! Inline SVG rendering for the dashboard: normalized line chart and
//! correlation heatmap.

use crate::domain::correlation::CorrelationMatrix;
use crate::domain::normalize::BASE_VALUE;
use crate::domain::price_table::NormalizedTable;
use std::fmt::Write;

const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const CHART_WIDTH: f64 = 860.0;
const CHART_HEIGHT: f64 = 380.0;
const PAD_LEFT: f64 = 60.0;
const PAD_RIGHT: f64 = 20.0;
const PAD_TOP: f64 = 20.0;
const PAD_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 5;

const CELL: f64 = 64.0;
const LABEL_SPACE: f64 = 190.0;

pub fn series_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Escapes text for use inside SVG markup.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Multi-series line chart of a normalized table, one polyline per index.
pub fn line_chart_svg(table: &NormalizedTable) -> String {
    let rows = table.row_count();
    if rows == 0 || table.column_count() == 0 {
        return r#"<p class="empty">No normalized data available.</p>"#.to_string();
    }

    let (mut min, mut max) = table
        .columns()
        .iter()
        .flat_map(|c| c.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((BASE_VALUE, BASE_VALUE), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if max - min < f64::EPSILON {
        min -= 1.0;
        max += 1.0;
    }
    let margin = (max - min) * 0.05;
    min -= margin;
    max += margin;

    let plot_w = CHART_WIDTH - PAD_LEFT - PAD_RIGHT;
    let plot_h = CHART_HEIGHT - PAD_TOP - PAD_BOTTOM;
    let x_at = |i: usize| {
        if rows > 1 {
            PAD_LEFT + plot_w * i as f64 / (rows - 1) as f64
        } else {
            PAD_LEFT + plot_w / 2.0
        }
    };
    let y_at = |v: f64| PAD_TOP + plot_h * (max - v) / (max - min);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="line-chart" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img" aria-label="Normalized performance">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );

    for t in 0..=Y_TICKS {
        let v = min + (max - min) * t as f64 / Y_TICKS as f64;
        let y = y_at(v);
        let _ = write!(
            svg,
            r##"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="#e5e5e5"/><text x="{tx:.1}" y="{ty:.1}" font-size="11" text-anchor="end" fill="#555">{v:.1}</text>"##,
            x1 = PAD_LEFT,
            x2 = CHART_WIDTH - PAD_RIGHT,
            tx = PAD_LEFT - 6.0,
            ty = y + 4.0,
        );
    }

    let base_y = y_at(BASE_VALUE);
    let _ = write!(
        svg,
        r##"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="#999" stroke-dasharray="4 3"/>"##,
        x1 = PAD_LEFT,
        x2 = CHART_WIDTH - PAD_RIGHT,
        y = base_y,
    );

    let dates = table.dates();
    let mut label_rows = vec![0, rows / 2, rows - 1];
    label_rows.dedup();
    for i in label_rows {
        let _ = write!(
            svg,
            r##"<text x="{x:.1}" y="{y:.1}" font-size="11" text-anchor="middle" fill="#555">{d}</text>"##,
            x = x_at(i),
            y = CHART_HEIGHT - PAD_BOTTOM + 18.0,
            d = dates[i].format("%Y-%m-%d"),
        );
    }

    for (n, column) in table.columns().iter().enumerate() {
        let points: Vec<String> = column
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| format!("{:.1},{:.1}", x_at(i), y_at(*v)))
            .collect();
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{points}"><title>{name}</title></polyline>"#,
            color = series_color(n),
            points = points.join(" "),
            name = escape_xml(&column.name),
        );
    }

    svg.push_str("</svg>");
    svg
}

/// Diverging blue/white/red scale centered at 0; NaN is grey.
pub fn diverging_color(value: f64) -> String {
    if !value.is_finite() {
        return "#cccccc".to_string();
    }
    const BLUE: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const WHITE: (f64, f64, f64) = (247.0, 247.0, 247.0);
    const RED: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (WHITE, BLUE, -v)
    } else {
        (WHITE, RED, v)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(from.0, to.0),
        mix(from.1, to.1),
        mix(from.2, to.2)
    )
}

/// Annotated correlation heatmap, values to two decimals.
pub fn heatmap_svg(matrix: &CorrelationMatrix) -> String {
    let n = matrix.size();
    if n == 0 {
        return r#"<p class="empty">No correlation data available.</p>"#.to_string();
    }

    let side = LABEL_SPACE + CELL * n as f64;
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="heatmap" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {side:.0} {side:.0}" width="{side:.0}" height="{side:.0}" role="img" aria-label="Return correlation">"#,
    );

    for (i, name) in matrix.names().iter().enumerate() {
        let name = escape_xml(name);
        let centre = LABEL_SPACE + CELL * i as f64 + CELL / 2.0;
        let _ = write!(
            svg,
            r##"<text x="{x:.1}" y="{y:.1}" font-size="11" text-anchor="end" fill="#333">{name}</text>"##,
            x = LABEL_SPACE - 8.0,
            y = centre + 4.0,
        );
        let _ = write!(
            svg,
            r##"<text transform="translate({x:.1},{y:.1}) rotate(-45)" font-size="11" fill="#333">{name}</text>"##,
            x = centre,
            y = LABEL_SPACE - 8.0,
        );
    }

    for (row, values) in matrix.rows().iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            let x = LABEL_SPACE + CELL * col as f64;
            let y = LABEL_SPACE + CELL * row as f64;
            let text_color = if value.is_finite() && value.abs() > 0.6 {
                "#ffffff"
            } else {
                "#111111"
            };
            let label = if value.is_finite() {
                format!("{:.2}", value)
            } else {
                "n/a".to_string()
            };
            let _ = write!(
                svg,
                r##"<rect x="{x:.1}" y="{y:.1}" width="{c:.1}" height="{c:.1}" fill="{fill}" stroke="#ffffff"/><text x="{tx:.1}" y="{ty:.1}" font-size="12" text-anchor="middle" fill="{text_color}">{label}</text>"##,
                c = CELL,
                fill = diverging_color(value),
                tx = x + CELL / 2.0,
                ty = y + CELL / 2.0 + 4.0,
            );
        }
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::correlation::correlation_matrix;
    use crate::domain::price_table::{Column, DateTable};
    use chrono::NaiveDate;

    fn table(columns: &[(&str, &[f64])]) -> DateTable {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let dates = (0..rows)
            .map(|i| NaiveDate::from_ymd_opt(2022, 1, 3 + i as u32).unwrap())
            .collect();
        DateTable::new(
            dates,
            columns
                .iter()
                .map(|(name, values)| Column {
                    name: name.to_string(),
                    values: values.to_vec(),
                })
                .collect(),
        )
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let svg = line_chart_svg(&DateTable::default());
        assert!(svg.contains("No normalized data"));
    }

    #[test]
    fn one_polyline_per_series() {
        let t = table(&[
            ("S&P 500 (US)", &[100.0, 101.0, 99.5]),
            ("DAX (Germany)", &[100.0, 98.0, 102.0]),
        ]);
        let svg = line_chart_svg(&t);
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("S&amp;P 500 (US)"));
        assert!(svg.contains("2022-01-03"));
        assert!(svg.contains("2022-01-05"));
    }

    #[test]
    fn flat_single_row_chart_still_renders() {
        let t = table(&[("DAX (Germany)", &[100.0])]);
        let svg = line_chart_svg(&t);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn diverging_scale_is_centered_at_zero() {
        assert_eq!(diverging_color(0.0), "#f7f7f7");
        assert_eq!(diverging_color(1.0), "#b40426");
        assert_eq!(diverging_color(-1.0), "#3b4cc0");
        assert_eq!(diverging_color(f64::NAN), "#cccccc");
        assert_eq!(diverging_color(2.0), diverging_color(1.0));
    }

    #[test]
    fn heatmap_annotates_two_decimals() {
        let returns = table(&[
            ("A", &[0.01, 0.02, -0.01, 0.03]),
            ("B", &[0.02, 0.01, -0.02, 0.02]),
        ]);
        let svg = heatmap_svg(&correlation_matrix(&returns));
        assert_eq!(svg.matches("<rect").count(), 4);
        assert!(svg.contains(">1.00<"));
    }

    #[test]
    fn heatmap_marks_undefined_cells() {
        let returns = table(&[("Flat", &[0.0, 0.0, 0.0]), ("B", &[0.01, 0.02, 0.0])]);
        let svg = heatmap_svg(&correlation_matrix(&returns));
        assert!(svg.contains("n/a"));
        assert!(svg.contains("#cccccc"));
    }

    #[test]
    fn empty_matrix_renders_placeholder() {
        let svg = heatmap_svg(&correlation_matrix(&DateTable::default()));
        assert!(svg.contains("No correlation data"));
    }
}
