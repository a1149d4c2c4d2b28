use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{Notification, NotificationType};

const NOTIFICATION_COLUMNS: &str = "id, user_id, type, content, is_read, created_at";

pub const LIST_LIMIT: i64 = 100;

pub struct NotificationRepo {
    db: PgPool,
}

impl NotificationRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        content: &str,
    ) -> Result<Notification> {
        let sql = format!(
            "INSERT INTO notifications (id, user_id, type, content) VALUES ($1, $2, $3, $4) RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(kind)
            .bind(content)
            .fetch_one(&self.db)
            .await
    }

    /// One notification per recipient with identical content.
    pub async fn create_many(
        &self,
        user_ids: &[Uuid],
        kind: NotificationType,
        content: &str,
    ) -> Result<Vec<Notification>> {
        let ids: Vec<Uuid> = user_ids.iter().map(|_| Uuid::new_v4()).collect();
        let sql = format!(
            "INSERT INTO notifications (id, user_id, type, content) \
             SELECT id, user_id, $3, $4 FROM UNNEST($1::uuid[], $2::uuid[]) AS t(id, user_id) \
             RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(ids)
            .bind(user_ids)
            .bind(kind)
            .bind(content)
            .fetch_all(&self.db)
            .await
    }

    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(LIST_LIMIT)
            .fetch_all(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Notification>> {
        let sql = format!("SELECT {} FROM notifications WHERE id = $1", NOTIFICATION_COLUMNS);
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Marking an already-read notification is a no-op that still returns it.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let sql = format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected())
    }
}
