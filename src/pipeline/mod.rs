//! Run sequencing: collect, analyze, forecast, render, strictly in that order.
//!
//! A run starts from `Idle` every time and stops at the first failing stage.
//! Stages 1 and 2 signal failure through their `Result`; stage 3 does too
//! (a forecaster error ends the run instead of escaping as a crash); stage 4
//! re-reads the enriched dataset from disk and distinguishes a missing file
//! from every other render error.

pub mod params;
pub mod stages;

pub use params::{ForecastHorizon, InvalidHorizon, RunParams};
pub use stages::{Analyze, Collect, ForecastStage, Present};

use crate::config::Settings;
use crate::dashboard::{DashboardFigure, Presenter};
use crate::dataset;
use crate::engine::{Analyzer, Forecast, ForecastRequest, Forecaster, HoltModel, SlackWebhook};
use crate::error::PipelineError;
use crate::feed::Collector;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const IDLE_PROMPT: &str =
    "Enter a topic in the sidebar and press Enter to generate a new report.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Accepted by the engine, first stage not started yet.
    Queued,
    Collecting,
    Analyzing,
    Forecasting,
    Rendering,
    Done,
    Failed,
}

impl RunState {
    pub fn is_running(self) -> bool {
        matches!(
            self,
            RunState::Queued
                | RunState::Collecting
                | RunState::Analyzing | RunState::Forecasting | RunState::Rendering
        )
    }

    /// 1-based stage number for the four working states.
    pub fn step(self) -> Option<u8> {
        match self {
            RunState::Collecting => Some(1),
            RunState::Analyzing => Some(2),
            RunState::Forecasting => Some(3),
            RunState::Rendering => Some(4),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Queued => "Queued",
            RunState::Collecting => "Collecting",
            RunState::Analyzing => "Analyzing",
            RunState::Forecasting => "Forecasting",
            RunState::Rendering => "Rendering",
            RunState::Done => "Done",
            RunState::Failed => "Failed",
        }
    }
}

/// Progress reported while a run advances.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A stage began; the message is the spinner text.
    Started { state: RunState, message: String },
    /// A stage finished successfully.
    Completed { state: RunState, message: String },
    /// The run stopped in `state`.
    Failed { state: RunState, error: PipelineError },
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Done {
        figure: Box<DashboardFigure>,
        forecast: Box<Forecast>,
        elapsed: Duration,
    },
    Failed {
        /// Stage that was running when the run stopped.
        at: RunState,
        error: PipelineError,
    },
}

impl RunOutcome {
    pub fn final_state(&self) -> RunState {
        match self {
            RunOutcome::Done { .. } => RunState::Done,
            RunOutcome::Failed { .. } => RunState::Failed,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            RunOutcome::Failed { error, .. } => Some(error),
            RunOutcome::Done { .. } => None,
        }
    }
}

pub struct Stages {
    pub collector: Box<dyn Collect>,
    pub analyzer: Box<dyn Analyze>,
    pub forecaster: Box<dyn ForecastStage>,
    pub presenter: Box<dyn Present>,
}

impl Stages {
    /// The production collaborators, wired from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_millis(settings.config.sources.request_timeout_ms);
        Ok(Self {
            collector: Box::new(Collector::from_settings(settings)?),
            analyzer: Box::new(Analyzer::new()),
            forecaster: Box::new(Forecaster::new(
                HoltModel::default(),
                Box::new(SlackWebhook::new(timeout)?),
            )),
            presenter: Box::new(Presenter),
        })
    }
}

pub struct Sequencer {
    settings: Arc<Settings>,
    stages: Stages,
}

impl Sequencer {
    pub fn new(settings: Arc<Settings>, stages: Stages) -> Self {
        Self { settings, stages }
    }

    pub fn from_settings(settings: Arc<Settings>) -> Result<Self> {
        let stages = Stages::from_settings(&settings)?;
        Ok(Self::new(settings, stages))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute one full run. Every call is independent: nothing from an
    /// earlier run is consulted.
    pub async fn run<F>(&self, params: &RunParams, mut on_event: F) -> RunOutcome
    where
        F: FnMut(RunEvent) + Send,
    {
        let started = Instant::now();
        tracing::info!(topic = %params.topic, horizon = params.horizon.days(), "run started");

        let outcome = match self.run_stages(params, &mut on_event).await {
            Ok((figure, forecast)) => {
                on_event(RunEvent::Completed {
                    state: RunState::Rendering,
                    message: "Dashboard generated successfully!".to_string(),
                });
                RunOutcome::Done {
                    figure: Box::new(figure),
                    forecast: Box::new(forecast),
                    elapsed: started.elapsed(),
                }
            }
            Err((at, error)) => {
                tracing::error!(stage = at.label(), error = %error, detail = %error.detail(), "run failed");
                on_event(RunEvent::Failed { state: at, error: error.clone() });
                RunOutcome::Failed { at, error }
            }
        };

        tracing::info!(
            state = outcome.final_state().label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        outcome
    }

    async fn run_stages<F>(
        &self,
        params: &RunParams,
        on_event: &mut F,
    ) -> std::result::Result<(DashboardFigure, Forecast), (RunState, PipelineError)>
    where
        F: FnMut(RunEvent) + Send,
    {
        let settings = &*self.settings;
        let raw_path = settings.raw_path();
        let analyzed_path = settings.analyzed_path();

        // Stage 1
        on_event(RunEvent::Started {
            state: RunState::Collecting,
            message: "Step 1/4: Collecting articles from NewsAPI, GNews, and Twitter...".to_string(),
        });
        let report = self.stages.collector
            .collect(&params.topic, raw_path)
            .await
            .map_err(|e| (RunState::Collecting, PipelineError::Collection { cause: format!("{:#}", e) }))?;
        tracing::info!(total = report.total, failed = ?report.failed_sources, "collection complete");
        on_event(RunEvent::Completed {
            state: RunState::Collecting,
            message: "Step 1/4: Data collection complete!".to_string(),
        });

        // Stage 2
        on_event(RunEvent::Started {
            state: RunState::Analyzing,
            message: "Step 2/4: Analyzing sentiment of collected articles...".to_string(),
        });
        self.stages.analyzer
            .analyze(raw_path, analyzed_path)
            .await
            .map_err(|e| (RunState::Analyzing, PipelineError::Analysis { cause: format!("{:#}", e) }))?;
        on_event(RunEvent::Completed {
            state: RunState::Analyzing,
            message: "Step 2/4: Sentiment analysis complete!".to_string(),
        });

        // Stage 3
        on_event(RunEvent::Started {
            state: RunState::Forecasting,
            message: "Step 3/4: Generating forecast and checking for alerts...".to_string(),
        });
        let request = ForecastRequest {
            input: analyzed_path,
            thresholds: settings.config.alerts,
            webhook_url: &settings.credentials.slack_webhook_url,
            horizon: params.horizon,
        };
        let forecast = self.stages.forecaster
            .forecast(&request)
            .await
            .map_err(|e| (RunState::Forecasting, PipelineError::Forecast { cause: format!("{:#}", e) }))?;
        on_event(RunEvent::Completed {
            state: RunState::Forecasting,
            message: "Step 3/4: Forecasting complete!".to_string(),
        });

        // Stage 4: re-read from disk rather than reusing stage 2 output
        on_event(RunEvent::Started {
            state: RunState::Rendering,
            message: "Step 4/4: Creating dashboard visualization...".to_string(),
        });
        let rows = dataset::read_scored(analyzed_path).map_err(|e| {
            let error = if dataset::is_not_found(&e) {
                PipelineError::MissingDataset(analyzed_path.to_path_buf())
            } else {
                PipelineError::Render(format!("{:#}", e))
            };
            (RunState::Rendering, error)
        })?;
        let figure = self.stages.presenter
            .present(&rows, &forecast, &params.topic, params.horizon)
            .map_err(|e| (RunState::Rendering, PipelineError::Render(format!("{:#}", e))))?;

        Ok((figure, forecast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_states() {
        assert!(!RunState::Idle.is_running());
        assert!(RunState::Queued.is_running());
        assert_eq!(RunState::Queued.step(), None);
        assert!(RunState::Collecting.is_running());
        assert!(RunState::Rendering.is_running());
        assert!(!RunState::Done.is_running());
        assert!(!RunState::Failed.is_running());
        assert_eq!(RunState::Forecasting.step(), Some(3));
        assert_eq!(RunState::Done.step(), None);
    }
}
