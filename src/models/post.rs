use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub event_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Post row as seen by a particular viewer.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_image: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub author_name: String,
    pub profile_image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub event_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_image: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeStatus {
    pub post_id: Uuid,
    pub liked: bool,
    pub like_count: i64,
}

/// Attaches comments to their posts, keeping post order and comment order
/// as given.
pub fn assemble_feed(posts: Vec<PostRow>, comments: Vec<CommentView>) -> Vec<PostView> {
    let mut by_post: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for comment in comments {
        by_post.entry(comment.post_id).or_default().push(comment);
    }

    posts
        .into_iter()
        .map(|p| PostView {
            comments: by_post.remove(&p.id).unwrap_or_default(),
            id: p.id,
            event_id: p.event_id,
            author_id: p.author_id,
            author_name: p.author_name,
            author_image: p.author_image,
            content: p.content,
            image_url: p.image_url,
            like_count: p.like_count,
            is_liked: p.is_liked,
            created_at: p.created_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(id: Uuid, at: DateTime<Utc>) -> PostRow {
        PostRow {
            id,
            event_id: Uuid::nil(),
            author_id: Uuid::nil(),
            author_name: "Org".into(),
            author_image: None,
            content: "Doors open at 7".into(),
            image_url: None,
            like_count: 0,
            is_liked: false,
            created_at: at,
        }
    }

    fn comment(post_id: Uuid, content: &str, parent_id: Option<Uuid>) -> CommentView {
        CommentView {
            id: Uuid::new_v4(),
            post_id,
            parent_id,
            author_id: Uuid::nil(),
            author_name: "Guest".into(),
            profile_image: None,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_comments_are_grouped_under_their_post() {
        let now = Utc::now();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let first = comment(a, "first", None);
        let reply = comment(a, "reply", Some(first.id));
        let other = comment(b, "other", None);

        let feed = assemble_feed(
            vec![post(b, now), post(a, now - Duration::hours(1))],
            vec![first.clone(), other, reply],
        );

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, b);
        assert_eq!(feed[0].comments.len(), 1);
        assert_eq!(feed[1].comments.len(), 2);
        assert_eq!(feed[1].comments[0].content, "first");
        assert_eq!(feed[1].comments[1].parent_id, Some(first.id));
    }

    #[test]
    fn test_posts_without_comments() {
        let feed = assemble_feed(vec![post(Uuid::new_v4(), Utc::now())], vec![]);
        assert!(feed[0].comments.is_empty());
    }
}
