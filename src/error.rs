use std::path::PathBuf;
use thiserror::Error;

/// Why a run ended in `Failed`. `Display` is the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("Failed to collect any articles. Please check your API keys and the query term.")]
    Collection { cause: String },

    #[error("Sentiment analysis failed. Please check the logs.")]
    Analysis { cause: String },

    #[error("Forecasting failed: {cause}")]
    Forecast { cause: String },

    #[error("Could not find the analyzed data file: {}", .0.display())]
    MissingDataset(PathBuf),

    #[error("An error occurred while creating the dashboard: {0}")]
    Render(String),
}

impl PipelineError {
    /// Underlying detail, for the log pane and the log file.
    pub fn detail(&self) -> String {
        match self {
            PipelineError::Collection { cause }
            | PipelineError::Analysis { cause }
            | PipelineError::Forecast { cause } => cause.clone(),
            PipelineError::MissingDataset(path) => path.display().to_string(),
            PipelineError::Render(cause) => cause.clone(),
        }
    }
}
