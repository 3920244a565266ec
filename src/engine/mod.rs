pub mod alerts;
pub mod analyzer;
pub mod forecast;
pub mod sentiment;

pub use alerts::{AlertLevel, Notifier, SlackWebhook};
pub use analyzer::{AnalysisReport, Analyzer};
pub use forecast::{Forecast, ForecastPoint, ForecastRequest, Forecaster, HoltModel};
