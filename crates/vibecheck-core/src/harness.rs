//! Evaluation orchestrator.
//!
//! For each model, walks the first `limit` examples in order, asks the
//! [`Generator`] for a completion of every prompt (all messages but the last),
//! and compares it against the last message. Failed generations are skipped
//! and do not count toward the totals. Models and examples are processed
//! strictly one at a time.

use async_trait::async_trait;
use uuid::Uuid;

use crate::compare::score;
use crate::domain::{ConversationRecord, EvaluationResult, HarnessConfig, Message};
use crate::normalize::Normalized;
use crate::obs::{DiagnosticSink, Instrumentation, SPAN_EVAL_MODEL, SPAN_GENERATE};

// ---------------------------------------------------------------------------
// Generation capability
// ---------------------------------------------------------------------------

/// Why a generation request produced no usable completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("provider is not configured: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider response could not be decoded: {0}")]
    Decode(String),

    #[error("provider returned no content")]
    EmptyResponse,
}

/// Produces a completion for a prompt with a given model.
///
/// Implementations must decode deterministically (temperature 0) and must
/// report every failure as a [`GenerationError`] instead of panicking.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, messages: &[Message], model: &str) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// Per-case outcome
// ---------------------------------------------------------------------------

/// Detail of one compared example, handed to the diagnostic sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    /// Zero-based position of the example in the input.
    pub example: usize,
    pub reference_text: String,
    pub generated_text: String,
    pub reference: Normalized,
    pub candidate: Normalized,
    pub matched: bool,
}

#[derive(Debug, Default)]
struct Tally {
    matches: usize,
    mismatches: usize,
}

impl Tally {
    fn record(&mut self, matched: bool) {
        if matched {
            self.matches += 1;
        } else {
            self.mismatches += 1;
        }
    }

    fn finish(self, model: &str) -> EvaluationResult {
        EvaluationResult::from_counts(model, self.matches, self.mismatches)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Runs the comparison over examples for one or more models.
pub struct Harness<'a> {
    generator: &'a dyn Generator,
    diagnostics: &'a dyn DiagnosticSink,
    instrumentation: &'a dyn Instrumentation,
    config: HarnessConfig,
}

impl<'a> Harness<'a> {
    pub fn new(
        generator: &'a dyn Generator,
        diagnostics: &'a dyn DiagnosticSink,
        instrumentation: &'a dyn Instrumentation,
    ) -> Self {
        Self {
            generator,
            diagnostics,
            instrumentation,
            config: HarnessConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Evaluate one model over at most `limit` examples.
    ///
    /// `limit` counts attempted examples, skipped ones included.
    pub async fn run_model(
        &self,
        examples: &[ConversationRecord],
        model: &str,
        limit: usize,
    ) -> EvaluationResult {
        let run_id = Uuid::new_v4().to_string();
        let model_span = self
            .instrumentation
            .start_span(SPAN_EVAL_MODEL, model, &run_id);
        let mut tally = Tally::default();

        for (index, record) in examples.iter().take(limit).enumerate() {
            let Some((prompt, reference)) = record.split_for_eval() else {
                self.diagnostics.record_skipped(model, index);
                continue;
            };

            let Some(generated) = self.generate(prompt, model, &run_id, index).await else {
                continue;
            };

            let outcome = score(&reference.content, &generated, self.diagnostics);
            tally.record(outcome.matched);

            self.diagnostics.case_compared(
                model,
                prompt,
                &CaseOutcome {
                    example: index,
                    reference_text: reference.content.clone(),
                    generated_text: generated,
                    reference: outcome.reference,
                    candidate: outcome.candidate,
                    matched: outcome.matched,
                },
            );
        }

        let result = tally.finish(model);
        self.instrumentation.end_span(model_span, true);
        result
    }

    /// Evaluate each model in order with the configured limit.
    pub async fn run_models(
        &self,
        examples: &[ConversationRecord],
        models: &[String],
    ) -> Vec<EvaluationResult> {
        let mut results = Vec::with_capacity(models.len());
        for model in models {
            results.push(self.run_model(examples, model, self.config.limit).await);
        }
        results
    }

    /// One instrumented generation request. `None` means skip the example.
    async fn generate(
        &self,
        prompt: &[Message],
        model: &str,
        run_id: &str,
        index: usize,
    ) -> Option<String> {
        let span = self.instrumentation.start_span(SPAN_GENERATE, model, run_id);
        let generated = match self.generator.generate(prompt, model).await {
            Ok(text) if text.is_empty() => Err(GenerationError::EmptyResponse),
            other => other,
        };
        self.instrumentation.end_span(span, generated.is_ok());

        match generated {
            Ok(text) => Some(text),
            Err(err) => {
                self.diagnostics.generation_failed(model, index, &err);
                None
            }
        }
    }
}
