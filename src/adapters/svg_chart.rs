//! SVG line charts for score history and backtest equity.

use chrono::NaiveDate;

use crate::domain::portfolio::EquityPoint;
use crate::domain::score::Score;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 240.0;
const PADDING: f64 = 40.0;

struct LineChart<'a> {
    title: &'a str,
    values: Vec<f64>,
    first: NaiveDate,
    last: NaiveDate,
    y_min: f64,
    y_max: f64,
    baseline: f64,
}

/// Composite score per day on a fixed [-1, 1] axis with a dashed zero line.
pub fn format_score_chart(symbol: &str, scores: &[Score]) -> String {
    let (Some(first), Some(last)) = (scores.first(), scores.last()) else {
        return empty_chart("No score data available.");
    };
    let title = format!("{symbol} trend score");
    LineChart {
        title: &title,
        values: scores.iter().map(|s| s.value).collect(),
        first: first.date,
        last: last.date,
        y_min: -1.0,
        y_max: 1.0,
        baseline: 0.0,
    }
    .render()
}

/// Equity per evaluated date, scaled to its range, with a dashed line at the starting capital.
pub fn format_equity_chart(equity_curve: &[EquityPoint], initial_capital: f64) -> String {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return empty_chart("No equity data available.");
    };

    let (mut y_min, mut y_max) = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold((initial_capital, initial_capital), |(lo, hi), e| {
            (lo.min(e), hi.max(e))
        });
    if y_max - y_min <= 0.0 {
        y_min -= 1.0;
        y_max += 1.0;
    }

    LineChart {
        title: "Equity curve",
        values: equity_curve.iter().map(|p| p.equity).collect(),
        first: first.date,
        last: last.date,
        y_min,
        y_max,
        baseline: initial_capital,
    }
    .render()
}

fn empty_chart(message: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}">
  <text x="{x:.0}" y="{y:.0}" text-anchor="middle" font-family="sans-serif">{message}</text>
</svg>
"#,
        w = WIDTH,
        h = HEIGHT,
        x = WIDTH / 2.0,
        y = HEIGHT / 2.0,
    )
}

impl LineChart<'_> {
    fn y(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - 2.0 * PADDING;
        HEIGHT - PADDING - (value - self.y_min) * plot_height / (self.y_max - self.y_min)
    }

    fn render(&self) -> String {
        let plot_width = WIDTH - 2.0 * PADDING;
        let scale_x = if self.values.len() > 1 {
            plot_width / (self.values.len() - 1) as f64
        } else {
            0.0
        };

        let points: Vec<String> = self
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| format!("{:.1},{:.1}", PADDING + i as f64 * scale_x, self.y(v)))
            .collect();

        let right = WIDTH - PADDING;
        let bottom = HEIGHT - PADDING;
        let baseline = self.y(self.baseline);

        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}">
  <rect width="{WIDTH:.0}" height="{HEIGHT:.0}" fill="white"/>
  <text x="{mid:.0}" y="20" text-anchor="middle" font-family="sans-serif" font-size="14">{title}</text>
  <line class="axis" x1="{PADDING:.1}" y1="{PADDING:.1}" x2="{PADDING:.1}" y2="{bottom:.1}" stroke="black"/>
  <line class="axis" x1="{PADDING:.1}" y1="{bottom:.1}" x2="{right:.1}" y2="{bottom:.1}" stroke="black"/>
  <line class="baseline" x1="{PADDING:.1}" y1="{baseline:.1}" x2="{right:.1}" y2="{baseline:.1}" stroke="gray" stroke-dasharray="4 4"/>
  <text x="{label_x:.1}" y="{PADDING:.1}" text-anchor="end" font-family="sans-serif" font-size="10">{y_max}</text>
  <text x="{label_x:.1}" y="{bottom:.1}" text-anchor="end" font-family="sans-serif" font-size="10">{y_min}</text>
  <text x="{PADDING:.1}" y="{date_y:.1}" font-family="sans-serif" font-size="10">{first}</text>
  <text x="{right:.1}" y="{date_y:.1}" text-anchor="end" font-family="sans-serif" font-size="10">{last}</text>
  <polyline fill="none" stroke="blue" stroke-width="1.5" points="{points}"/>
</svg>
"#,
            mid = WIDTH / 2.0,
            title = self.title,
            label_x = PADDING - 4.0,
            date_y = bottom + 16.0,
            y_max = self.y_max,
            y_min = self.y_min,
            first = self.first.format("%Y-%m-%d"),
            last = self.last.format("%Y-%m-%d"),
            points = points.join(" "),
        )
    }
}
