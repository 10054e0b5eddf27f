/// Data models for blog-service
///
/// Row-level structures backing the relational schema: users with their
/// companion profile/settings rows, posts with tags, comments, and the
/// social graph relations (likes, subscriptions).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: String,
    pub location: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub theme: String,
    pub sound_enabled: bool,
    pub email_notifications: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One side of a subscription joined with the counterpart user, as served
/// by the subscription/subscriber listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubscriptionEntry {
    pub user_id: Uuid,
    pub username: String,
    pub subscribed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    /// Tag names; unknown names are created on demand.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettings {
    pub theme: Option<String>,
    pub sound_enabled: Option<bool>,
    pub email_notifications: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfile {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

// ---------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------

/// A post as served to clients: raw Markdown plus the sanitized rendering.
/// `is_liked` is present only when the request carried a caller identity.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub content_html: String,
    pub tags: Vec<Tag>,
    pub total_likes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

/// A tag with its usage count, for the popular-tags listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TagSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub total_likes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribeToggle {
    pub subscribed: bool,
    pub followers_count: i64,
}
