use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{FriendView, Friendship, FriendshipStatus};

const FRIENDSHIP_COLUMNS: &str = "id, user_id, friend_id, status, created_at, responded_at";

pub enum RequestOutcome {
    Created(Friendship),
    /// A PENDING or ACCEPTED relation already links the pair.
    AlreadyLinked(Friendship),
}

pub struct FriendRepo {
    db: PgPool,
}

impl FriendRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Friendship>> {
        let sql = format!("SELECT {} FROM friendships WHERE id = $1", FRIENDSHIP_COLUMNS);
        sqlx::query_as::<_, Friendship>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// The row linking two users, in either direction.
    pub async fn between(&self, a: Uuid, b: Uuid) -> Result<Option<Friendship>> {
        let sql = format!(
            "SELECT {} FROM friendships \
             WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)",
            FRIENDSHIP_COLUMNS
        );
        sqlx::query_as::<_, Friendship>(&sql)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool> {
        Ok(self
            .between(a, b)
            .await?
            .is_some_and(|f| f.status == FriendshipStatus::Accepted))
    }

    /// Creates a PENDING request from `sender` to `recipient`.
    ///
    /// A REJECTED row for the pair is discarded first so the new request
    /// starts a fresh lifecycle; rows never move out of REJECTED. Two racing
    /// requests for the same pair hit the pair index and the loser sees a
    /// unique violation.
    pub async fn request(&self, sender: Uuid, recipient: Uuid) -> Result<RequestOutcome> {
        let mut tx = self.db.begin().await?;

        let sql = format!(
            "SELECT {} FROM friendships \
             WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1) \
             FOR UPDATE",
            FRIENDSHIP_COLUMNS
        );
        let existing = sqlx::query_as::<_, Friendship>(&sql)
            .bind(sender)
            .bind(recipient)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            if row.status.blocks_new_request() {
                tx.rollback().await?;
                return Ok(RequestOutcome::AlreadyLinked(row));
            }
            sqlx::query("DELETE FROM friendships WHERE id = $1")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "INSERT INTO friendships (id, user_id, friend_id, status) VALUES ($1, $2, $3, 'PENDING') \
             RETURNING {}",
            FRIENDSHIP_COLUMNS
        );
        let created = sqlx::query_as::<_, Friendship>(&sql)
            .bind(Uuid::new_v4())
            .bind(sender)
            .bind(recipient)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(RequestOutcome::Created(created))
    }

    /// Answers a PENDING request addressed to `recipient`. Returns `None` if
    /// no such PENDING row exists.
    pub async fn respond(
        &self,
        friendship_id: Uuid,
        recipient: Uuid,
        status: FriendshipStatus,
    ) -> Result<Option<Friendship>> {
        let sql = format!(
            "UPDATE friendships SET status = $3, responded_at = NOW() \
             WHERE id = $1 AND friend_id = $2 AND status = 'PENDING' RETURNING {}",
            FRIENDSHIP_COLUMNS
        );
        sqlx::query_as::<_, Friendship>(&sql)
            .bind(friendship_id)
            .bind(recipient)
            .bind(status)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn list_for(&self, viewer: Uuid) -> Result<Vec<FriendView>> {
        sqlx::query_as::<_, FriendView>(
            "SELECT f.id AS friendship_id, u.id, u.name, u.email, u.role, u.designation, \
                    u.profile_image AS image, f.status, (f.friend_id = $1) AS is_incoming, f.created_at \
             FROM friendships f \
             JOIN users u ON u.id = CASE WHEN f.user_id = $1 THEN f.friend_id ELSE f.user_id END \
             WHERE f.user_id = $1 OR f.friend_id = $1 \
             ORDER BY f.status, u.name",
        )
        .bind(viewer)
        .fetch_all(&self.db)
        .await
    }

    pub async fn accepted_friend_ids(&self, user: Uuid) -> Result<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT CASE WHEN user_id = $1 THEN friend_id ELSE user_id END \
             FROM friendships WHERE (user_id = $1 OR friend_id = $1) AND status = 'ACCEPTED'",
        )
        .bind(user)
        .fetch_all(&self.db)
        .await
    }
}
