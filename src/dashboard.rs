//! Chart model for the dashboard: observed daily sentiment, the forecast and
//! its confidence band, plotted against day offsets from the first observed
//! day so the TUI can hand the series straight to a chart widget.

use crate::dataset::{ScoredArticle, SentimentLabel};
use crate::engine::forecast::{daily_series, Forecast};
use crate::engine::AlertLevel;
use crate::pipeline::ForecastHorizon;
use anyhow::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone)]
pub struct DashboardFigure {
    pub title: String,
    pub origin: NaiveDate,
    pub observed: Vec<(f64, f64)>,
    /// Starts at the last observed point so the two lines join.
    pub forecast: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
    pub upper: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_labels: Vec<String>,
    pub label_counts: LabelCounts,
    pub article_count: usize,
    pub aggregate: f64,
    pub alert: AlertLevel,
}

/// Builds the figure for a finished run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter;

fn offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

pub fn build_figure(
    rows: &[ScoredArticle],
    forecast: &Forecast,
    topic: &str,
    horizon: ForecastHorizon,
) -> Result<DashboardFigure> {
    let history = daily_series(rows);
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        anyhow::bail!("analyzed dataset has no rows to plot");
    };
    let origin = first.date;

    let observed: Vec<(f64, f64)> = history
        .iter()
        .map(|d| (offset(origin, d.date), d.mean))
        .collect();

    let mut forecast_line = vec![(offset(origin, last.date), last.mean)];
    forecast_line.extend(forecast.points.iter().map(|p| (offset(origin, p.date), p.yhat)));
    let lower: Vec<(f64, f64)> = forecast.points.iter()
        .map(|p| (offset(origin, p.date), p.yhat_lower))
        .collect();
    let upper: Vec<(f64, f64)> = forecast.points.iter()
        .map(|p| (offset(origin, p.date), p.yhat_upper))
        .collect();

    let end_date = forecast.points.last().map_or(last.date, |p| p.date);
    let x_max = offset(origin, end_date).max(1.0);

    let (y_min, y_max) = observed.iter()
        .chain(lower.iter())
        .chain(upper.iter())
        .fold((-1.0f64, 1.0f64), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));

    let mid_date = origin + chrono::Duration::days((x_max / 2.0).round() as i64);
    let x_labels = [origin, mid_date, end_date]
        .iter()
        .map(|d| d.format("%b %d").to_string())
        .collect();

    let mut label_counts = LabelCounts::default();
    for row in rows {
        match row.sentiment_label {
            SentimentLabel::Positive => label_counts.positive += 1,
            SentimentLabel::Neutral => label_counts.neutral += 1,
            SentimentLabel::Negative => label_counts.negative += 1,
        }
    }

    Ok(DashboardFigure {
        title: format!("Sentiment for '{}': {}-day forecast", topic, horizon.days()),
        origin,
        observed,
        forecast: forecast_line,
        lower,
        upper,
        x_bounds: [0.0, x_max],
        y_bounds: [y_min, y_max],
        x_labels,
        label_counts,
        article_count: rows.len(),
        aggregate: forecast.aggregate,
        alert: forecast.alert,
    })
}
