use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Like operations
#[derive(Clone)]
pub struct LikeRepository {
    pool: PgPool,
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a like for (post, user) and return `(liked, total_likes)`.
    ///
    /// The whole operation runs in one transaction: an `ON CONFLICT DO
    /// NOTHING` insert decides create-vs-delete, so a toggle that loses a
    /// concurrent race with the same user's first like observes the existing
    /// row and takes the delete branch instead of erroring. The count is
    /// read inside the same transaction so callers never see a stale pair
    /// of (liked, total).
    pub async fn toggle(&self, post_id: Uuid, user_id: Uuid) -> Result<(bool, i64)> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let liked = inserted.is_some();
        if !liked {
            sqlx::query(
                r#"
                DELETE FROM likes
                WHERE post_id = $1 AND user_id = $2
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM likes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((liked, total))
    }

    /// Check if a user has liked a post
    pub async fn is_liked(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE post_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Total likes received across all of an author's posts, for the
    /// profile counters.
    pub async fn count_for_author(&self, author_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM likes l
            JOIN posts p ON p.id = l.post_id
            WHERE p.author_id = $1
            "#,
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Get like count for a post
    pub async fn count_likes(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM likes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
