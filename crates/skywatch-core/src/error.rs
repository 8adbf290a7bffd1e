//! Errors raised while decoding wire data or parsing user selections.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown date filter `{0}`")]
    DateFilter(String),
    #[error("unknown source filter `{0}`")]
    SourceFilter(String),
    #[error("unknown processing mode `{0}`")]
    Mode(String),
    #[error("unknown mode switch policy `{0}`")]
    ModePolicy(String),
    #[error("unknown history failure policy `{0}`")]
    HistoryPolicy(String),
}
