/// HTTP request handlers
///
/// Thin actix-web layer over the service structs. Authentication itself is a
/// delegated collaborator; callers identify themselves with an `x-user-id`
/// header and mutating handlers extract it via [`UserId`].
pub mod comments;
pub mod posts;
pub mod social;
pub mod users;

use crate::error::AppError;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::future::{ready, Ready};
use uuid::Uuid;

/// Authenticated caller id, taken from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(UserId)
            .ok_or_else(|| {
                AppError::Unauthorized("missing or invalid x-user-id header".to_string()).into()
            });
        ready(user_id)
    }
}

/// Shared limit/offset query parameters.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

impl Pagination {
    /// Clamp to sane bounds before the values reach SQL.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 50), self.offset.max(0))
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "blog-service",
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/users")
                .route("", web::post().to(users::register))
                .route("/{username}", web::get().to(users::profile))
                .route("/{username}/profile", web::put().to(users::update_profile))
                .route("/{username}/settings", web::put().to(users::update_settings))
                .route("/{username}/subscribe", web::post().to(social::toggle_subscribe))
                .route("/{username}/subscriptions", web::get().to(users::subscriptions))
                .route("/{username}/subscribers", web::get().to(users::subscribers)),
        )
        .service(
            web::scope("/posts")
                .route("", web::post().to(posts::create_post))
                .route("", web::get().to(posts::list_posts))
                .route("/{id}", web::get().to(posts::get_post))
                .route("/{id}", web::put().to(posts::update_post))
                .route("/{id}", web::delete().to(posts::delete_post))
                .route("/{id}/comments", web::post().to(comments::create_comment))
                .route("/{id}/comments", web::get().to(comments::list_comments))
                .route("/{id}/like", web::post().to(social::toggle_like)),
        )
        .route("/tags", web::get().to(posts::list_tags))
        .route("/tags/{slug}/posts", web::get().to(posts::posts_by_tag))
        .route("/search", web::get().to(posts::search));
}
