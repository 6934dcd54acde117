use sfstat::core::io::xtck::XtckError;
use sfstat::engine::error::EngineError;
use sfstat::workflows::ensemble::EnsembleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Xtck(#[from] XtckError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Ensemble(#[from] EnsembleError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
