//! Error types for the fallible edges of the engine.
//!
//! Matching itself never fails; only ticker persistence can.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ticker store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ticker store format error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
