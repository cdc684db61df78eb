//! Conversation records shared by the preparer and the evaluation harness.

use serde::{Deserialize, Serialize};

/// Canonical speaker role of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Map a source-corpus speaker label (`system`, `human`, `gpt`) to a role.
    ///
    /// Returns `None` for labels outside the fixed table; callers drop those turns.
    pub fn from_source_label(label: &str) -> Option<Self> {
        match label {
            "system" => Some(Role::System),
            "human" => Some(Role::User),
            "gpt" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An ordered conversation; one line of a record stream.
///
/// The final message is the reference ("correct") response during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationRecord {
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Split into the prompt (all but last) and the reference response (last).
    ///
    /// Returns `None` for a record with no messages.
    pub fn split_for_eval(&self) -> Option<(&[Message], &Message)> {
        self.messages
            .split_last()
            .map(|(last, prompt)| (prompt, last))
    }
}

/// One turn of a source-corpus conversation (ShareGPT shape).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawTurn {
    pub from: String,
    pub value: String,
}

/// A source-corpus conversation before role mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawConversation {
    pub conversations: Vec<RawTurn>,
}

impl RawConversation {
    /// Map turns through the role table, silently dropping unrecognized labels.
    pub fn to_record(&self) -> ConversationRecord {
        let messages = self
            .conversations
            .iter()
            .filter_map(|turn| {
                Role::from_source_label(&turn.from).map(|role| Message::new(role, turn.value.clone()))
            })
            .collect();
        ConversationRecord { messages }
    }
}
