//! In-memory fakes for the generation capability (testing only)
//!
//! `ScriptedGenerator` replays queued responses in order and records every
//! request, so harness behavior can be checked without a provider.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::Message;
use crate::harness::{GenerationError, Generator};

type Script = VecDeque<Result<String, GenerationError>>;

/// Replays scripted completions; per-model scripts take precedence over the shared one.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    shared: Mutex<Script>,
    per_model: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(Vec<Message>, String)>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            shared: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Queue responses returned only for `model`.
    pub fn with_model_script(
        self,
        model: &str,
        responses: Vec<Result<String, GenerationError>>,
    ) -> Self {
        self.per_model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(model.to_string(), responses.into());
        self
    }

    /// Every `(prompt, model)` pair received so far, in order.
    pub fn calls(&self) -> Vec<(Vec<Message>, String)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn next_response(&self, model: &str) -> Option<Result<String, GenerationError>> {
        let mut per_model = self
            .per_model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(script) = per_model.get_mut(model) {
            return script.pop_front();
        }
        drop(per_model);
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, messages: &[Message], model: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((messages.to_vec(), model.to_string()));
        self.next_response(model).unwrap_or_else(|| {
            Err(GenerationError::Transport(format!(
                "no scripted response left for {model}"
            )))
        })
    }
}
