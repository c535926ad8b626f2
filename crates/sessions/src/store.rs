use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use {
    answerline_common::types::{ConversationTurn, Role},
    async_trait::async_trait,
    tokio::sync::RwLock,
};

use crate::Result;

/// Persistent log of conversation turns per sender.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one turn to the sender's conversation.
    async fn store(&self, sender_id: &str, text: &str, role: Role) -> Result<()>;

    /// The most recent `limit` turns for `sender_id`, oldest first.
    async fn history(&self, sender_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;
}

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryConversationStore {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored turns for a sender.
    pub async fn len(&self, sender_id: &str) -> usize {
        self.turns
            .read()
            .await
            .get(sender_id)
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, sender_id: &str) -> bool {
        self.len(sender_id).await == 0
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn store(&self, sender_id: &str, text: &str, role: Role) -> Result<()> {
        self.turns
            .write()
            .await
            .entry(sender_id.to_string())
            .or_default()
            .push(ConversationTurn {
                role,
                content: text.to_string(),
                created_at: now_ms(),
            });
        Ok(())
    }

    async fn history(&self, sender_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let turns = self.turns.read().await;
        let Some(all) = turns.get(sender_id) else {
            return Ok(Vec::new());
        };
        let skip = all.len().saturating_sub(limit);
        Ok(all[skip..].to_vec())
    }
}
