/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::handlers::{Pagination, UserId};
use crate::models::{NewPost, Post, UpdatePost};
use crate::services::{NotificationDispatcher, PostService, SocialService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

fn service(pool: &web::Data<PgPool>, dispatcher: &web::Data<Arc<NotificationDispatcher>>) -> PostService {
    PostService::new(pool.get_ref().clone(), dispatcher.get_ref().clone())
}

/// Create a new post
pub async fn create_post(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let view = service(&pool, &dispatcher)
        .create_post(user_id.0, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// List recent posts
pub async fn list_posts(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse> {
    let (limit, offset) = pagination.clamped();
    let posts = service(&pool, &dispatcher).list_posts(limit, offset).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Post detail view; every hit bumps the view counter. A caller identity,
/// when present, adds their like state to the payload.
pub async fn get_post(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    viewer: Option<UserId>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let posts = service(&pool, &dispatcher);

    let mut post: Post = posts.get_post(post_id).await?;
    post.views_count = posts.increment_views(post_id).await?;

    let mut view = posts.view(post).await?;
    if let Some(UserId(viewer_id)) = viewer {
        let social = SocialService::new(pool.get_ref().clone(), dispatcher.get_ref().clone());
        view.is_liked = Some(social.is_liked(post_id, viewer_id).await?);
    }
    Ok(HttpResponse::Ok().json(view))
}

/// Update a post (author only)
pub async fn update_post(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePost>,
) -> Result<HttpResponse> {
    let view = service(&pool, &dispatcher)
        .update_post(user_id.0, path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Delete a post (author only)
pub async fn delete_post(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    user_id: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&pool, &dispatcher)
        .delete_post(user_id.0, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Posts carrying a tag, addressed by slug
pub async fn posts_by_tag(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    path: web::Path<String>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse> {
    let (limit, offset) = pagination.clamped();
    let (tag, posts) = service(&pool, &dispatcher)
        .list_by_tag(&path.into_inner(), limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "tag": tag,
        "posts": posts,
    })))
}

/// Most-used tags, for the tag cloud
pub async fn list_tags(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
) -> Result<HttpResponse> {
    let tags = service(&pool, &dispatcher).popular_tags(10).await?;
    Ok(HttpResponse::Ok().json(tags))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_search_limit() -> i64 {
    10
}

/// Free-text search over title, content, and tag names
pub async fn search(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = (query.limit.clamp(1, 50), query.offset.max(0));
    let posts = service(&pool, &dispatcher)
        .search(&query.q, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}
