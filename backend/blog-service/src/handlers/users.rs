/// User handlers - registration, profiles, and settings
use crate::error::{AppError, Result};
use crate::handlers::UserId;
use crate::models::{NewUser, Profile, UpdateProfile, UpdateSettings, User};
use crate::services::{NotificationDispatcher, SocialService, UserService};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub profile: Profile,
    pub followers_count: i64,
    pub following_count: i64,
    pub total_likes: i64,
    /// Whether the viewer follows this user; false for anonymous viewers
    /// and for a user's own profile.
    pub is_subscribed: bool,
}

/// Register a new user. The companion profile and settings rows are created
/// atomically with the user.
pub async fn register(pool: web::Data<PgPool>, req: web::Json<NewUser>) -> Result<HttpResponse> {
    let user = UserService::new(pool.get_ref().clone())
        .register(req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(user))
}

/// Public profile page data for a user: the profile row plus follower,
/// following, and received-like counters, and whether the viewer follows
/// this user.
pub async fn profile(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    viewer: Option<UserId>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let users = UserService::new(pool.get_ref().clone());
    let user = users.get_by_username(&path.into_inner()).await?;
    let profile = users.get_profile(user.id).await?;

    let social = SocialService::new(pool.get_ref().clone(), dispatcher.get_ref().clone());
    let followers_count = social.count_followers(user.id).await?;
    let following_count = social.count_following(user.id).await?;
    let total_likes = social.total_likes_received(user.id).await?;
    let is_subscribed = match viewer {
        Some(UserId(viewer_id)) if viewer_id != user.id => {
            social.is_subscribed(viewer_id, user.id).await?
        }
        _ => false,
    };

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user,
        profile,
        followers_count,
        following_count,
        total_likes,
        is_subscribed,
    }))
}

/// Authors the caller subscribes to. Self only, like settings.
pub async fn subscriptions(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = UserService::new(pool.get_ref().clone())
        .get_by_username(&path.into_inner())
        .await?;
    if user.id != user_id.0 {
        return Err(AppError::NotFound("subscriptions".to_string()));
    }

    let entries = SocialService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
        .following(user.id)
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Users subscribed to the caller. Self only, like settings.
pub async fn subscribers(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = UserService::new(pool.get_ref().clone())
        .get_by_username(&path.into_inner())
        .await?;
    if user.id != user_id.0 {
        return Err(AppError::NotFound("subscribers".to_string()));
    }

    let entries = SocialService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
        .subscribers(user.id)
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Update the caller's own profile. A mismatch between the path user and
/// the caller is reported as not-found.
pub async fn update_profile(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
    req: web::Json<UpdateProfile>,
) -> Result<HttpResponse> {
    let users = UserService::new(pool.get_ref().clone());
    let user = users.get_by_username(&path.into_inner()).await?;
    if user.id != user_id.0 {
        return Err(AppError::NotFound("profile".to_string()));
    }

    let profile = users.update_profile(user.id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Update the caller's own settings, including the email notification flag.
pub async fn update_settings(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
    req: web::Json<UpdateSettings>,
) -> Result<HttpResponse> {
    let users = UserService::new(pool.get_ref().clone());
    let user = users.get_by_username(&path.into_inner()).await?;
    if user.id != user_id.0 {
        return Err(AppError::NotFound("settings".to_string()));
    }

    let settings = users.update_settings(user.id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(settings))
}
