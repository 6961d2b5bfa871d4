use maud::{Markup, html};

use super::ChartPoint;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 200.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 30.0;

const TEXT_STYLE: &str = "fill: var(--foreground); font-family: inherit";
const SVG_CONTAINER_STYLE: &str = "width:100%;height:auto";

fn format_value(v: f64) -> String {
    if v == v.floor() && v.abs() < 1_000_000.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn fill(point: &ChartPoint<'_>) -> &'static str {
    if point.selected {
        "fill: var(--accent)"
    } else {
        "fill: var(--foreground)"
    }
}

pub fn render_bar_chart(points: &[ChartPoint<'_>], label: &str) -> Markup {
    if points.is_empty() {
        return empty_chart(label);
    }

    let max_val = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let min_val = points.iter().map(|p| p.value).fold(0.0_f64, f64::min);
    let range = if (max_val - min_val).abs() < f64::EPSILON {
        1.0
    } else {
        max_val - min_val
    };

    let chart_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let bar_w = chart_w / points.len() as f64;
    // Baseline sits at zero, which is above the bottom when values go negative.
    let zero_y = MARGIN_TOP + chart_h - ((0.0 - min_val) / range) * chart_h;

    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(MARGIN_LEFT) y="14" font-size="12" style=(TEXT_STYLE) { (label) }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + 10.0) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_value(max_val))
            }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + chart_h) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_value(min_val))
            }
            @for (i, point) in points.iter().enumerate() {
                @let bar_h = (point.value.abs() / range) * chart_h;
                @let x = MARGIN_LEFT + i as f64 * bar_w;
                @let y = if point.value >= 0.0 { zero_y - bar_h } else { zero_y };
                rect x=(x) y=(y) width=((bar_w - 1.0).max(0.5)) height=(bar_h) opacity="0.7" style=(fill(point)) {
                    title { (point.label) ": " (format_value(point.value)) }
                }
            }
            (write_x_axis(points, chart_w))
        }
    }
}

pub fn render_line_chart(points: &[ChartPoint<'_>], label: &str) -> Markup {
    if points.is_empty() {
        return empty_chart(label);
    }

    let max_val = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_val = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let range = if (max_val - min_val).abs() < f64::EPSILON {
        1.0
    } else {
        max_val - min_val
    };

    let chart_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x_at = |i: usize| MARGIN_LEFT + (i as f64 / (points.len() - 1).max(1) as f64) * chart_w;
    let y_at = |v: f64| MARGIN_TOP + chart_h - ((v - min_val) / range) * chart_h;

    let mut coords = String::new();
    for (i, point) in points.iter().enumerate() {
        if !coords.is_empty() {
            coords.push(' ');
        }
        use std::fmt::Write;
        let _ = write!(coords, "{},{}", x_at(i), y_at(point.value));
    }

    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(MARGIN_LEFT) y="14" font-size="12" style=(TEXT_STYLE) { (label) }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + 10.0) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_value(max_val))
            }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + chart_h) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_value(min_val))
            }
            polyline points=(coords) fill="none" stroke-width="2" style="stroke: var(--foreground)" {}
            @for (i, point) in points.iter().enumerate() {
                circle cx=(x_at(i)) cy=(y_at(point.value)) r=(if point.selected { "4" } else { "3" }) style=(fill(point)) {
                    title { (point.label) ": " (format_value(point.value)) }
                }
            }
            (write_x_axis(points, chart_w))
        }
    }
}

fn write_x_axis(points: &[ChartPoint<'_>], chart_w: f64) -> Markup {
    let label_y = HEIGHT - 5.0;
    html! {
        @if let Some(first) = points.first() {
            text x=(MARGIN_LEFT) y=(label_y) font-size="11" text-anchor="start" style=(TEXT_STYLE) {
                (first.label)
            }
        }
        @if points.len() > 2 {
            @let mid = points.len() / 2;
            @let mid_x = MARGIN_LEFT + chart_w / 2.0;
            text x=(mid_x) y=(label_y) font-size="11" text-anchor="middle" style=(TEXT_STYLE) {
                (points[mid].label)
            }
        }
        @if points.len() > 1 {
            @if let Some(last) = points.last() {
                @let end_x = MARGIN_LEFT + chart_w;
                text x=(end_x) y=(label_y) font-size="11" text-anchor="end" style=(TEXT_STYLE) {
                    (last.label)
                }
            }
        }
    }
}

fn empty_chart(label: &str) -> Markup {
    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(WIDTH / 2.0) y=(HEIGHT / 2.0) font-size="14" text-anchor="middle" style=(TEXT_STYLE) {
                (label) " (no data)"
            }
        }
    }
}
