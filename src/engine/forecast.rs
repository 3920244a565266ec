//! Daily sentiment aggregation and short-horizon forecasting.

use super::alerts::{self, AlertLevel, Notifier};
use crate::config::AlertConfig;
use crate::dataset::{self, ScoredArticle};
use crate::pipeline::ForecastHorizon;
use anyhow::Result;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use std::path::Path;

/// z-score for a 95% interval.
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub mean: f64,
    /// Articles published that day. Zero for a gap-filled day.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Debug, Clone)]
pub struct Forecast {
    pub history: Vec<DailySentiment>,
    pub points: Vec<ForecastPoint>,
    pub horizon: ForecastHorizon,
    /// Mean predicted sentiment over the horizon; compared against the alert thresholds.
    pub aggregate: f64,
    pub alert: AlertLevel,
}

/// Mean sentiment per UTC day, contiguous from the first to the last day.
/// Days without articles repeat the previous day's mean.
pub fn daily_series(rows: &[ScoredArticle]) -> Vec<DailySentiment> {
    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = by_day.entry(row.day()).or_insert((0.0, 0));
        entry.0 += row.sentiment_score;
        entry.1 += 1;
    }

    let mut out: Vec<DailySentiment> = Vec::with_capacity(by_day.len());
    for (date, (sum, count)) in by_day {
        if let Some(prev) = out.last().cloned() {
            let mut day = prev.date;
            while let Some(next) = day.checked_add_days(Days::new(1)).filter(|d| *d < date) {
                out.push(DailySentiment { date: next, mean: prev.mean, count: 0 });
                day = next;
            }
        }
        out.push(DailySentiment { date, mean: sum / count as f64, count });
    }
    out
}

/// Holt's linear (double exponential) smoothing.
#[derive(Debug, Clone, Copy)]
pub struct HoltModel {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for HoltModel {
    fn default() -> Self {
        Self { alpha: 0.5, beta: 0.3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fitted {
    level: f64,
    trend: f64,
    residual_sd: f64,
}

impl HoltModel {
    fn fit(&self, ys: &[f64]) -> Option<Fitted> {
        let (&first, rest) = ys.split_first()?;
        let mut level = first;
        let mut trend = rest.first().map_or(0.0, |&second| second - first);
        let mut sq_err = 0.0;

        for &y in rest {
            let predicted = level + trend;
            sq_err += (y - predicted).powi(2);
            let prev_level = level;
            level = self.alpha * y + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
        }

        let residual_sd = if rest.is_empty() {
            0.0
        } else {
            (sq_err / rest.len() as f64).sqrt()
        };
        Some(Fitted { level, trend, residual_sd })
    }

    /// `(yhat, half_width)` for steps 1..=periods. Empty when `ys` is empty.
    pub fn predict(&self, ys: &[f64], periods: usize) -> Vec<(f64, f64)> {
        let Some(fit) = self.fit(ys) else { return Vec::new() };
        (1..=periods)
            .map(|h| {
                let h = h as f64;
                (fit.level + h * fit.trend, Z_95 * fit.residual_sd * h.sqrt())
            })
            .collect()
    }
}

/// Forecast `horizon` days past the last observed day. Values are bounded
/// to the sentiment range [-1, 1].
pub fn forecast_series(
    history: &[DailySentiment],
    horizon: ForecastHorizon,
    model: &HoltModel,
) -> Vec<ForecastPoint> {
    let Some(last) = history.last() else { return Vec::new() };
    let ys: Vec<f64> = history.iter().map(|d| d.mean).collect();

    model
        .predict(&ys, horizon.days() as usize)
        .into_iter()
        .enumerate()
        .filter_map(|(i, (yhat, half))| {
            let date = last.date.checked_add_days(Days::new(i as u64 + 1))?;
            Some(ForecastPoint {
                date,
                yhat: yhat.clamp(-1.0, 1.0),
                yhat_lower: (yhat - half).clamp(-1.0, 1.0),
                yhat_upper: (yhat + half).clamp(-1.0, 1.0),
            })
        })
        .collect()
}

/// Everything the forecasting stage is invoked with.
#[derive(Debug, Clone)]
pub struct ForecastRequest<'a> {
    pub input: &'a Path,
    pub thresholds: AlertConfig,
    pub webhook_url: &'a str,
    pub horizon: ForecastHorizon,
}

/// Reads the enriched dataset, forecasts it and raises threshold alerts.
pub struct Forecaster {
    model: HoltModel,
    notifier: Box<dyn Notifier>,
}

impl Forecaster {
    pub fn new(model: HoltModel, notifier: Box<dyn Notifier>) -> Self {
        Self { model, notifier }
    }

    pub fn build(rows: &[ScoredArticle], horizon: ForecastHorizon, model: &HoltModel, thresholds: &AlertConfig) -> Result<Forecast> {
        if rows.is_empty() {
            anyhow::bail!("enriched dataset has no rows to forecast");
        }
        let history = daily_series(rows);
        let points = forecast_series(&history, horizon, model);
        if points.len() != horizon.days() as usize {
            anyhow::bail!("forecast produced {} rows, expected {}", points.len(), horizon.days());
        }

        let aggregate = points.iter().map(|p| p.yhat).sum::<f64>() / points.len() as f64;
        let alert = alerts::classify(aggregate, thresholds);
        Ok(Forecast { history, points, horizon, aggregate, alert })
    }

    pub async fn run(&self, request: &ForecastRequest<'_>) -> Result<Forecast> {
        let rows = dataset::read_scored(request.input)?;
        let forecast = Self::build(&rows, request.horizon, &self.model, &request.thresholds)?;

        tracing::info!(
            days = forecast.history.len(),
            horizon = request.horizon.days(),
            aggregate = format!("{:.3}", forecast.aggregate),
            alert = ?forecast.alert,
            "forecast built"
        );

        if let Some(message) = alerts::alert_message(&forecast, &request.thresholds) {
            match self.notifier.notify(request.webhook_url, &message).await {
                Ok(()) => tracing::info!(alert = ?forecast.alert, "alert delivered"),
                Err(e) => tracing::warn!(error = %format!("{:#}", e), "alert delivery failed"),
            }
        }

        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SentimentLabel;
    use chrono::{TimeZone, Utc};

    fn row(day: u32, hour: u32, score: f64) -> ScoredArticle {
        ScoredArticle {
            source: "NewsAPI".into(),
            title: "t".into(),
            description: String::new(),
            url: format!("https://x/{}/{}", day, hour),
            published_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
            content: String::new(),
            sentiment_score: score,
            sentiment_label: crate::engine::sentiment::label_for(score),
        }
    }

    fn thresholds() -> AlertConfig {
        AlertConfig { positive_threshold: 0.5, negative_threshold: -0.5 }
    }

    #[test]
    fn test_daily_series_means_and_gap_fill() {
        let rows = vec![row(1, 9, 0.2), row(1, 15, 0.4), row(4, 8, -0.1)];
        let series = daily_series(&rows);
        assert_eq!(series.len(), 4);
        assert!((series[0].mean - 0.3).abs() < 1e-12);
        assert_eq!(series[0].count, 2);
        assert_eq!(series[1].count, 0);
        assert!((series[2].mean - 0.3).abs() < 1e-12);
        assert_eq!(series[3].date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(series[3].count, 1);
    }

    #[test]
    fn test_linear_history_extends_trend_exactly() {
        let rows = vec![row(1, 0, 0.1), row(2, 0, 0.2), row(3, 0, 0.3), row(4, 0, 0.4)];
        let history = daily_series(&rows);
        let points = forecast_series(&history, ForecastHorizon::Week, &HoltModel::default());

        assert_eq!(points.len(), 7);
        assert!((points[0].yhat - 0.5).abs() < 1e-9);
        assert!((points[1].yhat - 0.6).abs() < 1e-9);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
        // zero residuals -> zero-width band
        assert!((points[0].yhat_upper - points[0].yhat_lower).abs() < 1e-9);
        // clamped to the sentiment range
        assert_eq!(points[6].yhat, 1.0);
    }

    #[test]
    fn test_single_day_forecast_is_flat() {
        let history = daily_series(&[row(10, 12, -0.25)]);
        let points = forecast_series(&history, ForecastHorizon::HalfMonth, &HoltModel::default());
        assert_eq!(points.len(), 15);
        assert!(points.iter().all(|p| (p.yhat + 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_bounds_bracket_prediction_and_widen() {
        let rows: Vec<_> = [0.3, -0.2, 0.4, -0.1, 0.2, -0.3, 0.1]
            .iter()
            .enumerate()
            .map(|(i, &s)| row(i as u32 + 1, 12, s))
            .collect();
        let history = daily_series(&rows);
        let points = forecast_series(&history, ForecastHorizon::Month, &HoltModel::default());

        assert_eq!(points.len(), 30);
        for p in &points {
            assert!(p.yhat_lower <= p.yhat && p.yhat <= p.yhat_upper);
            assert!((-1.0..=1.0).contains(&p.yhat_lower) && (-1.0..=1.0).contains(&p.yhat_upper));
        }
        let w0 = points[0].yhat_upper - points[0].yhat_lower;
        let w1 = points[1].yhat_upper - points[1].yhat_lower;
        assert!(w1 >= w0);
    }

    #[test]
    fn test_build_rejects_empty_dataset() {
        let err = Forecaster::build(&[], ForecastHorizon::Week, &HoltModel::default(), &thresholds());
        assert!(err.is_err());
    }

    #[test]
    fn test_build_classifies_alert() {
        let rows = vec![row(1, 0, 0.8), row(2, 0, 0.8)];
        let f = Forecaster::build(&rows, ForecastHorizon::Week, &HoltModel::default(), &thresholds()).unwrap();
        assert_eq!(f.alert, AlertLevel::Positive);
        assert!((f.aggregate - 0.8).abs() < 1e-9);
        assert_eq!(rows[0].sentiment_label, SentimentLabel::Positive);
    }
}
