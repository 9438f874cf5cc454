use crate::prediction::PredictionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictionError),
    #[error("watch channel send failed")]
    WatchSend,
    #[error("state lock poisoned")]
    StateLock,
}
