use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::Message;

pub struct MessageRepo {
    db: PgPool,
}

impl MessageRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, sender_id: Uuid, receiver_id: Uuid, content: &str) -> Result<Message> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, sender_id, receiver_id, content) VALUES ($1, $2, $3, $4) \
             RETURNING id, sender_id, receiver_id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(&self.db)
        .await
    }

    /// The conversation between two users in insertion order, optionally only
    /// messages newer than `after`.
    pub async fn conversation(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT id, sender_id, receiver_id, content, created_at FROM messages \
             WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)) \
               AND ($3::timestamptz IS NULL OR created_at > $3) \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(friend_id)
        .bind(after)
        .fetch_all(&self.db)
        .await
    }
}
