/// Comment handlers - HTTP endpoints for comment operations
use crate::error::Result;
use crate::handlers::{Pagination, UserId};
use crate::models::NewComment;
use crate::services::{CommentService, NotificationDispatcher};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Create a comment on a post
pub async fn create_comment(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<Uuid>,
    req: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let comment = CommentService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
        .create_comment(path.into_inner(), user_id.0, &req.content)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

/// List comments for a post, newest first
pub async fn list_comments(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    path: web::Path<Uuid>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse> {
    let (limit, offset) = pagination.clamped();
    let comments = CommentService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
        .list_for_post(path.into_inner(), limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}
