//! Error types for the walk-forward engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the walk-forward engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("not enough history: {available} usable rows, {required} required")]
    InsufficientHistory { required: usize, available: usize },

    #[error("unable to build walk-forward folds: train={train_bars} test={test_bars} over {rows} rows")]
    NoFoldsPossible {
        train_bars: usize,
        test_bars: usize,
        rows: usize,
    },

    #[error("unknown model")]
    UnknownModel,

    #[error("{0}")]
    ModelUnavailable(String),

    #[error("model training failed: {0}")]
    AdapterFailure(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid shape: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EngineError {
    /// Whether the error is confined to a single requested model. Local
    /// errors are recovered by skipping that model; everything else is
    /// fatal to the job.
    pub fn is_model_local(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownModel
                | EngineError::ModelUnavailable(_)
                | EngineError::AdapterFailure(_)
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
