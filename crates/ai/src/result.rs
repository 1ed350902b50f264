use thiserror::Error;

/// Failure of a forecasting call.
///
/// Every variant is reported to the immediate caller; no partial forecast is
/// ever returned alongside one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("insufficient data: need at least {required} observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("dataset has no training pairs")]
    EmptyDataset,

    #[error("forecast horizon must be at least 1")]
    ZeroHorizon,

    #[error("window length mismatch: expected {expected}, got {actual}")]
    WindowMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training diverged at epoch {epoch} (non-finite loss or prediction)")]
    TrainingDiverged { epoch: usize },

    #[error("training cancelled before epoch {epoch}")]
    Cancelled { epoch: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ForecastError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
