/// Social service - like and subscribe toggles over the social graph store
///
/// Enforces the service-boundary preconditions (post/user existence, no
/// self-subscription) and emits notification events when a toggle creates a
/// relation. Toggle atomicity itself lives in the repositories.
use crate::error::{AppError, Result};
use crate::models::{LikeToggle, SubscribeToggle, SubscriptionEntry};
use crate::repository::{LikeRepository, SubscriptionRepository};
use crate::services::notifications::{NotificationDispatcher, NotificationEvent};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct SocialService {
    pool: PgPool,
    likes: LikeRepository,
    subscriptions: SubscriptionRepository,
    dispatcher: Arc<NotificationDispatcher>,
}

impl SocialService {
    pub fn new(pool: PgPool, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            likes: LikeRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            pool,
            dispatcher,
        }
    }

    /// Toggle the caller's like on a post. Emits `NewLike` only when the
    /// toggle created the relation, and only after it has committed.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        let post: Option<(String, Uuid)> =
            sqlx::query_as("SELECT title, author_id FROM posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&self.pool)
                .await?;
        let (post_title, post_author_id) =
            post.ok_or_else(|| AppError::NotFound("post".to_string()))?;

        let liker_name = self.username(user_id).await?;

        let (liked, total_likes) = self.likes.toggle(post_id, user_id).await?;

        if liked {
            self.dispatcher.dispatch(NotificationEvent::NewLike {
                post_id,
                post_title,
                post_author_id,
                liker_id: user_id,
                liker_name,
            });
        }

        Ok(LikeToggle { liked, total_likes })
    }

    /// Toggle the caller's subscription to an author. `follower == author`
    /// is rejected before any storage work. Emits `NewFollow` on create.
    pub async fn toggle_subscribe(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> Result<SubscribeToggle> {
        if follower_id == author_id {
            return Err(AppError::InvalidOperation("cannot follow self".to_string()));
        }

        // Both sides must exist; missing users surface as not-found.
        self.username(author_id).await?;
        let follower_name = self.username(follower_id).await?;

        let (subscribed, followers_count) =
            self.subscriptions.toggle(follower_id, author_id).await?;

        if subscribed {
            self.dispatcher.dispatch(NotificationEvent::NewFollow {
                author_id,
                follower_name,
            });
        }

        Ok(SubscribeToggle {
            subscribed,
            followers_count,
        })
    }

    pub async fn is_liked(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.likes.is_liked(post_id, user_id).await
    }

    pub async fn is_subscribed(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool> {
        self.subscriptions.is_subscribed(follower_id, author_id).await
    }

    pub async fn count_followers(&self, author_id: Uuid) -> Result<i64> {
        self.subscriptions.count_followers(author_id).await
    }

    pub async fn count_following(&self, follower_id: Uuid) -> Result<i64> {
        self.subscriptions.count_following(follower_id).await
    }

    /// Likes received across all of a user's posts.
    pub async fn total_likes_received(&self, author_id: Uuid) -> Result<i64> {
        self.likes.count_for_author(author_id).await
    }

    pub async fn following(&self, follower_id: Uuid) -> Result<Vec<SubscriptionEntry>> {
        self.subscriptions.following(follower_id).await
    }

    pub async fn subscribers(&self, author_id: Uuid) -> Result<Vec<SubscriptionEntry>> {
        self.subscriptions.subscribers_of(author_id).await
    }

    async fn username(&self, user_id: Uuid) -> Result<String> {
        let name: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        name.ok_or_else(|| AppError::NotFound("user".to_string()))
    }
}
