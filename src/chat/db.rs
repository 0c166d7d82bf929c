//! Persistence of conversations.
use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};
use uuid::Uuid;

use super::models::{Conversation, ConversationSummary, Message};

/// The narrow set of operations the turn pipeline and routes need from
/// storage. Implementations hold no business logic.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>, Error>;

    async fn create(&self, title: &str, messages: Vec<Message>) -> Result<Conversation, Error>;

    /// Append a user/assistant pair. Either both messages are written or
    /// neither is. Returns `None` if the conversation doesn't exist.
    async fn append_messages(
        &self,
        id: &str,
        messages: [Message; 2],
    ) -> Result<Option<Conversation>, Error>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: &str) -> Result<bool, Error>;

    /// All conversations, most recently updated first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, Error>;
}

#[derive(Clone)]
pub struct SqliteConversationStore {
    db: Connection,
}

struct ConversationRow {
    id: String,
    title: String,
    created_at: i64,
    updated_at: i64,
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| anyhow!("Invalid timestamp: {}", micros))
}

// Timestamps are stored with microsecond precision so round to that
// up front to return the same value that will be read back later.
fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

fn serialize_messages(messages: &[Message]) -> Result<Vec<(String, String)>, Error> {
    messages
        .iter()
        .map(|m| Ok((m.id.clone(), serde_json::to_string(m)?)))
        .collect()
}

impl SqliteConversationStore {
    pub fn new(db: Connection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>, Error> {
        let c_id = id.to_owned();
        let result = self
            .db
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, title, created_at, updated_at FROM conversation WHERE id = ?",
                        [&c_id],
                        |row| {
                            Ok(ConversationRow {
                                id: row.get(0)?,
                                title: row.get(1)?,
                                created_at: row.get(2)?,
                                updated_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?;
                let Some(row) = row else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare(
                    "SELECT data FROM conversation_message WHERE conversation_id = ? ORDER BY position",
                )?;
                let data = stmt
                    .query_map([&c_id], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(Some((row, data)))
            })
            .await?;

        let Some((row, data)) = result else {
            return Ok(None);
        };

        let messages = data
            .iter()
            .map(|d| serde_json::from_str::<Message>(d))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Conversation {
            id: row.id,
            title: row.title,
            messages,
            created_at: from_micros(row.created_at)?,
            updated_at: from_micros(row.updated_at)?,
        }))
    }

    async fn create(&self, title: &str, messages: Vec<Message>) -> Result<Conversation, Error> {
        let id = Uuid::new_v4().to_string();
        let now = now();
        let rows = serialize_messages(&messages)?;

        let c_id = id.clone();
        let c_title = title.to_owned();
        let ts = now.timestamp_micros();
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO conversation (id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                    params![c_id, c_title, ts],
                )?;
                for (position, (msg_id, data)) in rows.into_iter().enumerate() {
                    tx.execute(
                        "INSERT INTO conversation_message (id, conversation_id, position, data) VALUES (?1, ?2, ?3, ?4)",
                        params![msg_id, c_id, position as i64, data],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;

        Ok(Conversation {
            id,
            title: title.to_owned(),
            messages,
            created_at: now,
            updated_at: now,
        })
    }

    async fn append_messages(
        &self,
        id: &str,
        messages: [Message; 2],
    ) -> Result<Option<Conversation>, Error> {
        let rows = serialize_messages(&messages)?;
        let c_id = id.to_owned();
        let ts = now().timestamp_micros();

        let appended = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                // updated_at must strictly advance even when two appends
                // land within the same microsecond
                let updated = tx.execute(
                    "UPDATE conversation SET updated_at = MAX(updated_at + 1, ?2) WHERE id = ?1",
                    params![c_id, ts],
                )?;
                if updated == 0 {
                    return Ok(false);
                }

                let next_position: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(position) + 1, 0) FROM conversation_message WHERE conversation_id = ?",
                    [&c_id],
                    |row| row.get(0),
                )?;
                for (offset, (msg_id, data)) in rows.into_iter().enumerate() {
                    tx.execute(
                        "INSERT INTO conversation_message (id, conversation_id, position, data) VALUES (?1, ?2, ?3, ?4)",
                        params![msg_id, c_id, next_position + offset as i64, data],
                    )?;
                }
                tx.commit()?;
                Ok(true)
            })
            .await?;

        if !appended {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool, Error> {
        let c_id = id.to_owned();
        let deleted = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM conversation_message WHERE conversation_id = ?",
                    [&c_id],
                )?;
                let deleted = tx.execute("DELETE FROM conversation WHERE id = ?", [&c_id])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await?;
        Ok(deleted)
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, Error> {
        let rows = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT c.id, c.title, c.created_at, c.updated_at, COUNT(m.id)
                    FROM conversation c
                    LEFT JOIN conversation_message m ON m.conversation_id = c.id
                    GROUP BY c.id, c.title, c.created_at, c.updated_at
                    ORDER BY c.updated_at DESC
                    "#,
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            ConversationRow {
                                id: row.get(0)?,
                                title: row.get(1)?,
                                created_at: row.get(2)?,
                                updated_at: row.get(3)?,
                            },
                            row.get::<_, i64>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(row, count)| {
                Ok(ConversationSummary {
                    id: row.id,
                    title: row.title,
                    created_at: from_micros(row.created_at)?,
                    updated_at: from_micros(row.updated_at)?,
                    message_count: count as usize,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::content::Content;
    use crate::chat::models::Role;
    use crate::core::db::initialize_db;

    async fn test_store() -> SqliteConversationStore {
        let db = Connection::open_in_memory().await.unwrap();
        db.call(|conn| {
            initialize_db(conn)?;
            Ok(())
        })
        .await
        .unwrap();
        SqliteConversationStore::new(db)
    }

    fn pair(question: &str, answer: &str) -> [Message; 2] {
        [Message::user(question, vec![]), Message::assistant(answer)]
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = test_store().await;
        let [user, assistant] = pair("hello", "hi!");
        let created = store
            .create("hello", vec![user.clone(), assistant.clone()])
            .await
            .unwrap();

        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.messages, vec![user, assistant]);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = test_store().await;
        assert!(store.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_keeps_order_and_bumps_updated_at() {
        let store = test_store().await;
        let created = store
            .create("first", pair("first", "one").to_vec())
            .await
            .unwrap();

        let second = pair("second", "two");
        let updated = store
            .append_messages(&created.id, second.clone())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.messages.len(), 4);
        assert_eq!(updated.messages[2], second[0]);
        assert_eq!(updated.messages[3], second[1]);
        assert_eq!(updated.messages[2].content, Content::from("second"));
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "first");
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_split_a_pair() {
        let store = test_store().await;
        let created = store
            .create("start", pair("q-start", "a-start").to_vec())
            .await
            .unwrap();

        let turns = 8;
        let mut set = tokio::task::JoinSet::new();
        for i in 0..turns {
            let store = store.clone();
            let id = created.id.clone();
            set.spawn(async move {
                store
                    .append_messages(&id, pair(&format!("q-{}", i), &format!("a-{}", i)))
                    .await
            });
        }
        while let Some(result) = set.join_next().await {
            assert!(result.unwrap().unwrap().is_some());
        }

        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.messages.len(), 2 + 2 * turns);
        for exchange in found.messages.chunks(2) {
            let (user, assistant) = (&exchange[0], &exchange[1]);
            assert_eq!(user.role, Role::User);
            assert_eq!(assistant.role, Role::Assistant);
            let question = user.content.text();
            let answer = assistant.content.text();
            assert_eq!(
                question.trim_start_matches("q-"),
                answer.trim_start_matches("a-")
            );
        }
        assert!(found.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_append_to_missing_conversation() {
        let store = test_store().await;
        let result = store.append_messages("missing", pair("a", "b")).await.unwrap();
        assert!(result.is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = test_store().await;
        let created = store.create("t", pair("a", "b").to_vec()).await.unwrap();

        assert!(store.delete(&created.id).await.unwrap());
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());
        assert!(!store.delete(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_sorted_by_updated_at() {
        let store = test_store().await;
        let older = store.create("older", pair("a", "b").to_vec()).await.unwrap();
        let newer = store.create("newer", pair("c", "d").to_vec()).await.unwrap();

        // Touching the older one moves it to the front
        store
            .append_messages(&older.id, pair("e", "f"))
            .await
            .unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, older.id);
        assert_eq!(list[0].message_count, 4);
        assert_eq!(list[1].id, newer.id);
        assert_eq!(list[1].message_count, 2);
    }
}
