use crate::dashboard::DashboardFigure;
use crate::engine::ForecastPoint;
use crate::pipeline::{ForecastHorizon, RunEvent, RunOutcome, RunParams, RunState, IDLE_PROMPT};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Progress,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageMessage {
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

/// Engine-owned view state, published to the TUI over a watch channel.
#[derive(Debug, Clone)]
pub struct AppState {
    pub run_state: RunState,
    pub active: Option<RunParams>,
    pub messages: Vec<StageMessage>,
    pub figure: Option<DashboardFigure>,
    pub forecast_rows: Vec<ForecastPoint>,
    pub runs_started: u64,
    pub run_started_at: Option<Instant>,
    pub last_run_secs: Option<f64>,
    pub logs: VecDeque<LogEntry>,
    pub start_time: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            run_state: RunState::Idle,
            active: None,
            messages: vec![StageMessage {
                kind: MessageKind::Info,
                text: IDLE_PROMPT.to_string(),
            }],
            figure: None,
            forecast_rows: Vec::new(),
            runs_started: 0,
            run_started_at: None,
            last_run_secs: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            start_time: Instant::now(),
        }
    }

    /// Reset everything a previous run left behind.
    pub fn begin_run(&mut self, params: &RunParams) {
        self.run_state = RunState::Queued;
        self.active = Some(params.clone());
        self.messages.clear();
        self.figure = None;
        self.forecast_rows.clear();
        self.runs_started += 1;
        self.run_started_at = Some(Instant::now());
        self.push_log(
            "INFO",
            format!("run #{} started: '{}' ({})", self.runs_started, params.topic, params.horizon),
        );
    }

    pub fn apply_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::Started { state, message } => {
                self.run_state = state;
                self.push_log("INFO", message.clone());
                self.messages.push(StageMessage { kind: MessageKind::Progress, text: message });
            }
            RunEvent::Completed { message, .. } => {
                // the spinner line for a finished stage is replaced by its result
                if self.messages.last().is_some_and(|m| m.kind == MessageKind::Progress) {
                    self.messages.pop();
                }
                self.push_log("INFO", message.clone());
                self.messages.push(StageMessage { kind: MessageKind::Success, text: message });
            }
            RunEvent::Failed { state, error } => {
                if self.messages.last().is_some_and(|m| m.kind == MessageKind::Progress) {
                    self.messages.pop();
                }
                self.push_log("ERROR", format!("{} failed: {}", state.label(), error.detail()));
                self.messages.push(StageMessage { kind: MessageKind::Error, text: error.to_string() });
            }
        }
    }

    pub fn finish(&mut self, outcome: RunOutcome) {
        self.run_state = outcome.final_state();
        self.last_run_secs = self.run_started_at.take().map(|t| t.elapsed().as_secs_f64());
        if let RunOutcome::Done { figure, forecast, .. } = outcome {
            self.forecast_rows = forecast.points.clone();
            self.figure = Some(*figure);
        }
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.kind == MessageKind::Error).count()
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}

/// Sidebar inputs. Owned by the TUI loop; only copied into a command when
/// the operator triggers a run.
#[derive(Debug, Clone)]
pub struct Controls {
    pub topic: String,
    pub horizon: ForecastHorizon,
    /// `runs_started` as seen when the last run was requested. Set until the
    /// engine picks that request up.
    pending: Option<u64>,
}

impl Controls {
    pub fn new(default_topic: &str, horizon: ForecastHorizon) -> Self {
        Self {
            topic: default_topic.to_string(),
            horizon,
            pending: None,
        }
    }

    /// False while a run is active or a requested run has not begun yet.
    pub fn can_trigger(&self, state: &AppState) -> bool {
        if state.run_state.is_running() {
            return false;
        }
        self.pending.map_or(true, |seen| state.runs_started > seen)
    }

    pub fn mark_requested(&mut self, state: &AppState) {
        self.pending = Some(state.runs_started);
    }
}
