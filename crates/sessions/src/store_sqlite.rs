//! SQLite-backed conversation store.

use {
    answerline_common::types::{ConversationTurn, Role},
    async_trait::async_trait,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

use crate::{Result, store::ConversationStore, store::now_ms};

#[derive(sqlx::FromRow)]
struct MessageRow {
    role: String,
    content: String,
    created_at: i64,
}

impl TryFrom<MessageRow> for ConversationTurn {
    type Error = crate::Error;

    fn try_from(r: MessageRow) -> Result<Self> {
        Ok(Self {
            role: r.role.parse::<Role>()?,
            content: r.content,
            created_at: r.created_at,
        })
    }
}

pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    /// Wrap an existing pool and make sure the schema exists.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Open (creating if needed) the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await?;
        debug!(url, "conversation database opened");
        Self::new(pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS messages (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id  TEXT NOT NULL,
            role       TEXT NOT NULL CHECK (role IN ('user', 'bot')),
            content    TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages (sender_id, id)")
        .execute(pool)
        .await?;
    Ok(())
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn store(&self, sender_id: &str, text: &str, role: Role) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (sender_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(sender_id)
        .bind(role.as_str())
        .bind(text)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(&self, sender_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        // Newest `limit` rows, flipped back to chronological order.
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT role, content, created_at FROM (
                SELECT id, role, content, created_at FROM messages
                WHERE sender_id = ? ORDER BY id DESC LIMIT ?
             ) ORDER BY id ASC",
        )
        .bind(sender_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ConversationTurn::try_from).collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteConversationStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteConversationStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn stores_and_lists_turns() {
        let store = memory_store().await;
        store.store("+1", "oi", Role::User).await.unwrap();
        store.store("+1", "olá, como posso ajudar?", Role::Bot).await.unwrap();
        store.store("+2", "outro", Role::User).await.unwrap();

        let history = store.history("+1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "olá, como posso ajudar?");
    }

    #[tokio::test]
    async fn history_keeps_most_recent_in_order() {
        let store = memory_store().await;
        for i in 0..5 {
            store.store("+1", &format!("m{i}"), Role::User).await.unwrap();
        }
        let history = store.history("+1", 3).await.unwrap();
        let contents: Vec<_> = history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn file_database_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("conversations.db").display()
        );

        let store = SqliteConversationStore::connect(&url).await.unwrap();
        store.store("+1", "persisted", Role::User).await.unwrap();
        store.pool().close().await;

        let reopened = SqliteConversationStore::connect(&url).await.unwrap();
        let history = reopened.history("+1", 10).await.unwrap();
        assert_eq!(history[0].content, "persisted");
    }
}
