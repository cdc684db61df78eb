//! Observability hooks for normalization and evaluation runs.
//!
//! The core never touches a global logger. Callers pass in:
//! - a [`DiagnosticSink`] receiving recoverable problems (dropped blocks,
//!   failed generations) and per-case comparison detail;
//! - an [`Instrumentation`] receiving explicit start/end calls around each
//!   model run and each generation request.
//!
//! [`TracingDiagnostics`] and [`TracingInstrumentation`] forward to `tracing`
//! (filter with `RUST_LOG`, JSON output via `init_tracing(true, ..)`).
//! [`RecordingDiagnostics`] keeps everything in memory for tests.

use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::domain::Message;
use crate::harness::{CaseOutcome, GenerationError};
use crate::normalize::{normalized_to_json, BlockParseError};

/// Span wrapping one model's pass over the examples.
pub const SPAN_EVAL_MODEL: &str = "eval.model";

/// Span wrapping one generation request.
pub const SPAN_GENERATE: &str = "eval.generate";

/// Prompt messages are cut to this many characters in debug output.
const PROMPT_PREVIEW_CHARS: usize = 100;

/// Receiver for recoverable problems and comparison detail.
pub trait DiagnosticSink: Send + Sync {
    /// A tool-call block failed to parse and was dropped.
    fn block_dropped(&self, content: &str, error: &BlockParseError);

    /// Generation failed for one example; the example is skipped.
    fn generation_failed(&self, model: &str, example: usize, error: &GenerationError);

    /// A record had no messages to split into prompt and reference.
    fn record_skipped(&self, model: &str, example: usize);

    /// One example was generated and compared.
    fn case_compared(&self, model: &str, prompt: &[Message], outcome: &CaseOutcome);
}

/// An open span returned by [`Instrumentation::start_span`].
#[derive(Debug, Clone)]
pub struct SpanHandle {
    pub name: &'static str,
    pub model: String,
    pub run_id: String,
    started: Instant,
}

impl SpanHandle {
    pub fn new(name: &'static str, model: &str, run_id: &str) -> Self {
        Self {
            name,
            model: model.to_string(),
            run_id: run_id.to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Explicit start/end instrumentation around harness work.
pub trait Instrumentation: Send + Sync {
    fn start_span(&self, name: &'static str, model: &str, run_id: &str) -> SpanHandle;

    fn end_span(&self, span: SpanHandle, success: bool);
}

// ---------------------------------------------------------------------------
// tracing-backed implementations
// ---------------------------------------------------------------------------

/// Forwards diagnostics to `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn block_dropped(&self, content: &str, error: &BlockParseError) {
        error!(
            event = "normalize.block_dropped",
            content = %content,
            error = %error,
            "Error parsing tool call"
        );
    }

    fn generation_failed(&self, model: &str, example: usize, error: &GenerationError) {
        error!(
            event = "eval.generation_failed",
            model = %model,
            example = example,
            error = %error,
            "Error generating response"
        );
    }

    fn record_skipped(&self, model: &str, example: usize) {
        warn!(event = "eval.record_skipped", model = %model, example = example);
    }

    fn case_compared(&self, model: &str, prompt: &[Message], outcome: &CaseOutcome) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let preview: Vec<String> = prompt
            .iter()
            .map(|m| {
                let head: String = m.content.chars().take(PROMPT_PREVIEW_CHARS).collect();
                format!("{}: {}...", m.role, head)
            })
            .collect();
        let result = if outcome.matched { "MATCH" } else { "MISMATCH" };
        debug!(
            event = "eval.case_compared",
            model = %model,
            example = outcome.example,
            prompt = ?preview,
            reference_text = %outcome.reference_text,
            generated_text = %outcome.generated_text,
            reference = %normalized_to_json(&outcome.reference),
            candidate = %normalized_to_json(&outcome.candidate),
            result = result,
        );
    }
}

/// Emits `span.started` / `span.finished` events with durations.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInstrumentation;

impl Instrumentation for TracingInstrumentation {
    fn start_span(&self, name: &'static str, model: &str, run_id: &str) -> SpanHandle {
        if name == SPAN_EVAL_MODEL {
            info!(event = "span.started", span = name, model = %model, run_id = %run_id);
        } else {
            debug!(event = "span.started", span = name, model = %model, run_id = %run_id);
        }
        SpanHandle::new(name, model, run_id)
    }

    fn end_span(&self, span: SpanHandle, success: bool) {
        let duration_ms = span.elapsed_ms();
        if span.name == SPAN_EVAL_MODEL {
            info!(
                event = "span.finished",
                span = span.name,
                model = %span.model,
                run_id = %span.run_id,
                duration_ms = duration_ms,
                success = success,
            );
        } else {
            debug!(
                event = "span.finished",
                span = span.name,
                model = %span.model,
                run_id = %span.run_id,
                duration_ms = duration_ms,
                success = success,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory recorder
// ---------------------------------------------------------------------------

/// A diagnostic or instrumentation call captured by [`RecordingDiagnostics`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    BlockDropped {
        content: String,
        error: BlockParseError,
    },
    GenerationFailed {
        model: String,
        example: usize,
        error: GenerationError,
    },
    RecordSkipped {
        model: String,
        example: usize,
    },
    CaseCompared {
        model: String,
        example: usize,
        matched: bool,
    },
    SpanStarted {
        name: &'static str,
        model: String,
    },
    SpanEnded {
        name: &'static str,
        model: String,
        success: bool,
    },
}

/// Records every hook call; implements both [`DiagnosticSink`] and [`Instrumentation`].
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    /// Snapshot of all recorded events, in call order.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn dropped_blocks(&self) -> Vec<(String, BlockParseError)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DiagnosticEvent::BlockDropped { content, error } => Some((content, error)),
                _ => None,
            })
            .collect()
    }

    pub fn generation_failures(&self) -> Vec<(String, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DiagnosticEvent::GenerationFailed { model, example, .. } => Some((model, example)),
                _ => None,
            })
            .collect()
    }

    /// `(span name, success)` for every ended span.
    pub fn ended_spans(&self) -> Vec<(&'static str, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DiagnosticEvent::SpanEnded { name, success, .. } => Some((name, success)),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn block_dropped(&self, content: &str, error: &BlockParseError) {
        self.push(DiagnosticEvent::BlockDropped {
            content: content.to_string(),
            error: error.clone(),
        });
    }

    fn generation_failed(&self, model: &str, example: usize, error: &GenerationError) {
        self.push(DiagnosticEvent::GenerationFailed {
            model: model.to_string(),
            example,
            error: error.clone(),
        });
    }

    fn record_skipped(&self, model: &str, example: usize) {
        self.push(DiagnosticEvent::RecordSkipped {
            model: model.to_string(),
            example,
        });
    }

    fn case_compared(&self, model: &str, _prompt: &[Message], outcome: &CaseOutcome) {
        self.push(DiagnosticEvent::CaseCompared {
            model: model.to_string(),
            example: outcome.example,
            matched: outcome.matched,
        });
    }
}

impl Instrumentation for RecordingDiagnostics {
    fn start_span(&self, name: &'static str, model: &str, run_id: &str) -> SpanHandle {
        self.push(DiagnosticEvent::SpanStarted {
            name,
            model: model.to_string(),
        });
        SpanHandle::new(name, model, run_id)
    }

    fn end_span(&self, span: SpanHandle, success: bool) {
        self.push(DiagnosticEvent::SpanEnded {
            name: span.name,
            model: span.model,
            success,
        });
    }
}
