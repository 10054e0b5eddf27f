/// Social handlers - like and subscribe toggle endpoints
use crate::error::Result;
use crate::handlers::UserId;
use crate::services::{NotificationDispatcher, SocialService, UserService};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Toggle the caller's like on a post.
/// Returns `{"liked": bool, "total_likes": n}`.
pub async fn toggle_like(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let toggle = SocialService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
        .toggle_like(path.into_inner(), user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(toggle))
}

/// Toggle the caller's subscription to an author, addressed by username.
/// Returns `{"subscribed": bool, "followers_count": n}`; following yourself
/// is a 400 with `{"error": "cannot follow self"}`.
pub async fn toggle_subscribe(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = UserService::new(pool.get_ref().clone())
        .get_by_username(&path.into_inner())
        .await?;

    let toggle = SocialService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
        .toggle_subscribe(user_id.0, author.id)
        .await?;
    Ok(HttpResponse::Ok().json(toggle))
}
