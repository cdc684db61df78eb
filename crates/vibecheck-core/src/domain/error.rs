//! Domain-level error taxonomy for vibecheck.
//!
//! Only I/O and record-format problems surface here. Normalization and
//! generation failures are recovered inside the harness and never reach
//! this type.

/// Vibecheck domain errors.
#[derive(Debug, thiserror::Error)]
pub enum VibecheckError {
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("invalid source corpus: {0}")]
    InvalidSource(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for vibecheck domain operations.
pub type Result<T> = std::result::Result<T, VibecheckError>;
