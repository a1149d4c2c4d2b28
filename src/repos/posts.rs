use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{Comment, CommentView, LikeStatus, Post, PostRow};

pub struct PostRepo {
    db: PgPool,
}

impl PostRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        event_id: Uuid,
        author_id: Uuid,
        content: &str,
        image_url: Option<String>,
    ) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            "INSERT INTO posts (id, event_id, author_id, content, image_url) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, event_id, author_id, content, image_url, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(author_id)
        .bind(content)
        .bind(image_url)
        .fetch_one(&self.db)
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        sqlx::query_as::<_, Post>(
            "SELECT id, event_id, author_id, content, image_url, created_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    /// Newest first, with like counts and whether `viewer` liked each post.
    pub async fn list_for_event(&self, event_id: Uuid, viewer: Option<Uuid>) -> Result<Vec<PostRow>> {
        sqlx::query_as::<_, PostRow>(
            "SELECT p.id, p.event_id, p.author_id, u.name AS author_name, u.profile_image AS author_image, \
                    p.content, p.image_url, \
                    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count, \
                    EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $2) AS is_liked, \
                    p.created_at \
             FROM posts p JOIN users u ON u.id = p.author_id \
             WHERE p.event_id = $1 \
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(event_id)
        .bind(viewer)
        .fetch_all(&self.db)
        .await
    }

    pub async fn comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<CommentView>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, CommentView>(
            "SELECT c.id, c.post_id, c.parent_id, c.author_id, u.name AS author_name, \
                    u.profile_image, c.content, c.created_at \
             FROM post_comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ANY($1) \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_ids)
        .fetch_all(&self.db)
        .await
    }

    /// Flips the viewer's like on a post: removes it if present, adds it
    /// otherwise.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus> {
        let mut tx = self.db.begin().await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed > 0 {
            false
        } else {
            let inserted = sqlx::query(
                "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                true
            } else {
                // A concurrent toggle committed the like first; this one undoes it
                sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
                    .bind(post_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                false
            }
        };

        let like_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(LikeStatus {
            post_id,
            liked,
            like_count,
        })
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, parent_id, content, created_at FROM post_comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO post_comments (id, post_id, author_id, parent_id, content) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, post_id, author_id, parent_id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(&self.db)
        .await
    }
}
