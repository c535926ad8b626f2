//! Conversation persistence: every user and bot turn, keyed by sender.

pub mod error;
pub mod store;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    store::{ConversationStore, MemoryConversationStore},
    store_sqlite::SqliteConversationStore,
};
