//! Domain models for vibecheck.
//!
//! Canonical definitions for the core entities:
//! - `ConversationRecord`: role-tagged message list, one per record-stream line
//! - `RawConversation`: source-corpus conversation before role mapping
//! - `EvaluationResult`: per-model aggregate of a harness run

pub mod conversation;
pub mod error;
pub mod eval;

pub use conversation::{ConversationRecord, Message, RawConversation, RawTurn, Role};
pub use error::{Result, VibecheckError};
pub use eval::{EvaluationResult, HarnessConfig, DEFAULT_LIMIT};
