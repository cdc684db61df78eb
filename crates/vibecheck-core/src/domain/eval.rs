//! Evaluation run configuration and per-model aggregates.

use serde::{Deserialize, Serialize};

/// Number of examples evaluated per model when no limit is given.
pub const DEFAULT_LIMIT: usize = 10;

/// Configuration for a harness run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// Maximum number of examples attempted per model, counting skipped ones.
    pub limit: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

impl HarnessConfig {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Per-model aggregate of one harness run.
///
/// # Invariants
///
/// `total_checks == matches + mismatches`, and `accuracy` is
/// `matches / total_checks`, or `0.0` when nothing was checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub model: String,
    pub total_checks: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub accuracy: f64,
}

impl EvaluationResult {
    /// Build a result from raw counters, deriving the total and accuracy.
    pub fn from_counts(model: impl Into<String>, matches: usize, mismatches: usize) -> Self {
        let total_checks = matches + mismatches;
        let accuracy = if total_checks > 0 {
            matches as f64 / total_checks as f64
        } else {
            0.0
        };
        Self {
            model: model.into(),
            total_checks,
            matches,
            mismatches,
            accuracy,
        }
    }
}
