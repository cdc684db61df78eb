//! Reference-vs-candidate comparison of tool-call responses.

use crate::normalize::{normalize, Normalized};
use crate::obs::DiagnosticSink;

/// Result of comparing one reference response with one generated response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub matched: bool,
    pub reference: Normalized,
    pub candidate: Normalized,
}

/// Whether two normalization outcomes count as equal.
///
/// Both must be tool-call sets and equal as sorted sequences. A sentinel
/// never matches anything, another sentinel included.
pub fn outcomes_match(reference: &Normalized, candidate: &Normalized) -> bool {
    match (reference, candidate) {
        (Ok(reference), Ok(candidate)) => reference == candidate,
        _ => false,
    }
}

/// Normalize both texts independently and compare them.
pub fn score(correct: &str, generated: &str, diagnostics: &dyn DiagnosticSink) -> ScoreOutcome {
    let reference = normalize(correct, diagnostics);
    let candidate = normalize(generated, diagnostics);
    ScoreOutcome {
        matched: outcomes_match(&reference, &candidate),
        reference,
        candidate,
    }
}
