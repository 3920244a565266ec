//! The seams between the sequencer and its four collaborators.

use super::ForecastHorizon;
use crate::dashboard::{DashboardFigure, Presenter};
use crate::dataset::ScoredArticle;
use crate::engine::{AnalysisReport, Analyzer, Forecast, ForecastRequest, Forecaster};
use crate::feed::{CollectionReport, Collector};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Collect: Send + Sync {
    async fn collect(&self, topic: &str, output: &Path) -> Result<CollectionReport>;
}

#[async_trait]
pub trait Analyze: Send + Sync {
    async fn analyze(&self, raw: &Path, enriched: &Path) -> Result<AnalysisReport>;
}

#[async_trait]
pub trait ForecastStage: Send + Sync {
    async fn forecast(&self, request: &ForecastRequest<'_>) -> Result<Forecast>;
}

pub trait Present: Send + Sync {
    fn present(
        &self,
        rows: &[ScoredArticle],
        forecast: &Forecast,
        topic: &str,
        horizon: ForecastHorizon,
    ) -> Result<DashboardFigure>;
}

#[async_trait]
impl Collect for Collector {
    async fn collect(&self, topic: &str, output: &Path) -> Result<CollectionReport> {
        self.run(topic, output).await
    }
}

#[async_trait]
impl Analyze for Analyzer {
    async fn analyze(&self, raw: &Path, enriched: &Path) -> Result<AnalysisReport> {
        self.run(raw, enriched)
    }
}

#[async_trait]
impl ForecastStage for Forecaster {
    async fn forecast(&self, request: &ForecastRequest<'_>) -> Result<Forecast> {
        self.run(request).await
    }
}

impl Present for Presenter {
    fn present(
        &self,
        rows: &[ScoredArticle],
        forecast: &Forecast,
        topic: &str,
        horizon: ForecastHorizon,
    ) -> Result<DashboardFigure> {
        crate::dashboard::build_figure(rows, forecast, topic, horizon)
    }
}
