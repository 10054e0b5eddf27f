use crate::error::Result;
use crate::models::SubscriptionEntry;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Subscription (follow) operations
///
/// The `follower != author` rule is a service-boundary precondition, not a
/// storage concern; this repository assumes callers have already enforced it.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a subscription for (follower, author) and return
    /// `(subscribed, followers_count)`. Same atomic insert-or-delete
    /// protocol as the like toggle.
    pub async fn toggle(&self, follower_id: Uuid, author_id: Uuid) -> Result<(bool, i64)> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (follower_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await?;

        let subscribed = inserted.is_some();
        if !subscribed {
            sqlx::query(
                r#"
                DELETE FROM subscriptions
                WHERE follower_id = $1 AND author_id = $2
                "#,
            )
            .bind(follower_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await?;
        }

        let followers: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE author_id = $1
            "#,
        )
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((subscribed, followers))
    }

    /// Check if a follower is subscribed to an author
    pub async fn is_subscribed(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subscriptions
                WHERE follower_id = $1 AND author_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Get follower count for an author
    pub async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE author_id = $1
            "#,
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Get follow count for a user (how many authors they subscribe to)
    pub async fn count_following(&self, follower_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE follower_id = $1
            "#,
        )
        .bind(follower_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Authors a user subscribes to, newest subscription first.
    pub async fn following(&self, follower_id: Uuid) -> Result<Vec<SubscriptionEntry>> {
        let entries = sqlx::query_as::<_, SubscriptionEntry>(
            r#"
            SELECT u.id AS user_id, u.username, s.created_at AS subscribed_at
            FROM subscriptions s
            JOIN users u ON u.id = s.author_id
            WHERE s.follower_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Users subscribed to an author, newest subscription first.
    pub async fn subscribers_of(&self, author_id: Uuid) -> Result<Vec<SubscriptionEntry>> {
        let entries = sqlx::query_as::<_, SubscriptionEntry>(
            r#"
            SELECT u.id AS user_id, u.username, s.created_at AS subscribed_at
            FROM subscriptions s
            JOIN users u ON u.id = s.follower_id
            WHERE s.author_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Get all follower ids for an author, oldest subscription first.
    /// This is the fan-out source for new-post notifications.
    pub async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>> {
        let followers: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT follower_id
            FROM subscriptions
            WHERE author_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(followers)
    }
}
