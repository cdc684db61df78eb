//! Vibecheck Core Library
//!
//! Tool-call normalization and comparison, the evaluation harness built on
//! them, and the dataset preparer that produces its record streams.

pub mod compare;
pub mod digest;
pub mod domain;
pub mod fakes;
pub mod harness;
pub mod normalize;
pub mod obs;
pub mod prepare;
pub mod records;
pub mod reporting;
pub mod telemetry;

pub use compare::{outcomes_match, score, ScoreOutcome};
pub use digest::{file_digest, sha256_hex};
pub use domain::{
    ConversationRecord, EvaluationResult, HarnessConfig, Message, RawConversation, RawTurn,
    Result, Role, VibecheckError, DEFAULT_LIMIT,
};
pub use harness::{CaseOutcome, GenerationError, Generator, Harness};
pub use normalize::{
    canonical_json, normalize, normalized_to_json, parse_tool_call, BlockParseError,
    NormalizeError, Normalized, ToolCall, ToolCallSet, CLOSE_MARKER, OPEN_MARKER,
};
pub use obs::{
    DiagnosticEvent, DiagnosticSink, Instrumentation, RecordingDiagnostics, SpanHandle,
    TracingDiagnostics, TracingInstrumentation, SPAN_EVAL_MODEL, SPAN_GENERATE,
};
pub use prepare::{
    is_validation_index, prepare, write_prepared, ManifestEntry, PreparedDataset,
    PreparedManifest, SliceSize, TRAINING_SLICES, VALIDATION_STRIDE,
};
pub use records::{
    parse_raw_conversations, parse_records, read_raw_conversations, read_records,
    render_records, write_records,
};
pub use reporting::{
    format_accuracy, render_summary_table, write_eval_results_json, EvalResultsArtifact,
};
pub use telemetry::init_tracing;

/// Vibecheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
