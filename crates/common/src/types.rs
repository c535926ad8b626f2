//! Domain types shared by the channel, storage, retrieval and pipeline crates.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A message received from a messaging channel.
///
/// Immutable once built; the orchestrator consumes it exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    sender_id: String,
    text: String,
}

impl InboundMessage {
    /// Build an inbound message. The sender id is opaque and kept verbatim
    /// (e.g. `whatsapp:+5511999990000`), but it must not be blank.
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let sender_id = sender_id.into();
        if sender_id.trim().is_empty() {
            return Err(Error::MissingSender);
        }
        Ok(Self {
            sender_id,
            text: text.into(),
        })
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Author of a stored conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "bot" => Ok(Self::Bot),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

/// One prior turn of a sender's conversation, oldest first when listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub created_at: i64,
}

/// A retrieved piece of supporting context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Where the text came from (document path, URL, ...).
    pub source: String,
    pub text: String,
    /// Similarity to the query, higher is better.
    pub score: f32,
}
