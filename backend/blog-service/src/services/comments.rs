/// Comment service - comment creation and listing
///
/// Comments are immutable: there is no update path, and they disappear with
/// their post via cascade. The post author is notified after commit unless
/// they commented on their own post.
use crate::error::{AppError, Result};
use crate::models::Comment;
use crate::services::notifications::{NotificationDispatcher, NotificationEvent};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    pool: PgPool,
    dispatcher: Arc<NotificationDispatcher>,
}

impl CommentService {
    pub fn new(pool: PgPool, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { pool, dispatcher }
    }

    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("comment must not be empty".to_string()));
        }

        let post: Option<(String, Uuid)> =
            sqlx::query_as("SELECT title, author_id FROM posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&self.pool)
                .await?;
        let (post_title, post_author_id) =
            post.ok_or_else(|| AppError::NotFound("post".to_string()))?;

        let commenter_name: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
                .bind(author_id)
                .fetch_optional(&self.pool)
                .await?;
        let commenter_name =
            commenter_name.ok_or_else(|| AppError::NotFound("user".to_string()))?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author_id, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        self.dispatcher.dispatch(NotificationEvent::NewComment {
            post_id,
            post_title,
            post_author_id,
            commenter_id: author_id,
            commenter_name,
        });

        Ok(comment)
    }

    pub async fn list_for_post(
        &self,
        post_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
