//! Database-backed tests for toggle semantics, registration atomicity, and
//! cascade cleanup. Each test boots its own Postgres container and applies
//! migrations, so runs are independent and need no external setup.

mod common;

use blog_service::models::{NewPost, NewUser};
use blog_service::repository::{LikeRepository, SubscriptionRepository};
use blog_service::services::{
    CommentService, NotificationDispatcher, PostService, SocialService, UserService,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

async fn register(pool: &PgPool, prefix: &str) -> Uuid {
    UserService::new(pool.clone())
        .register(NewUser {
            username: format!("{prefix}-{}", Uuid::new_v4()),
            email: Some(format!("{prefix}@example.com")),
            password: "long-enough-password".to_string(),
        })
        .await
        .expect("registration failed")
        .id
}

async fn publish(pool: &PgPool, dispatcher: &Arc<NotificationDispatcher>, author: Uuid) -> Uuid {
    PostService::new(pool.clone(), dispatcher.clone())
        .create_post(
            author,
            NewPost {
                title: "Hello".to_string(),
                content: "# Hello\n\nworld".to_string(),
                tags: vec!["rust".to_string()],
            },
        )
        .await
        .expect("post creation failed")
        .post
        .id
}

#[tokio::test]
async fn like_toggle_pair_returns_to_baseline() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    let reader = register(&pool, "reader").await;
    let post_id = publish(&pool, &dispatcher, author).await;

    let social = SocialService::new(pool.clone(), dispatcher.clone());
    assert!(!social.is_liked(post_id, reader).await.unwrap());

    let first = social.toggle_like(post_id, reader).await.unwrap();
    assert!(first.liked);
    assert_eq!(first.total_likes, 1);
    assert!(social.is_liked(post_id, reader).await.unwrap());

    let second = social.toggle_like(post_id, reader).await.unwrap();
    assert!(!second.liked);
    assert_eq!(second.total_likes, 0);
    assert!(!social.is_liked(post_id, reader).await.unwrap());
}

#[tokio::test]
async fn concurrent_toggles_never_duplicate_a_like() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    let reader = register(&pool, "reader").await;
    let post_id = publish(&pool, &dispatcher, author).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            SocialService::new(pool, dispatcher)
                .toggle_like(post_id, reader)
                .await
        }));
    }
    for handle in handles {
        // Losing a race must resolve as the other branch, never an error.
        handle
            .await
            .unwrap()
            .expect("toggle must not fail under contention");
    }

    let count = LikeRepository::new(pool.clone())
        .count_likes(post_id)
        .await
        .unwrap();
    assert!(count <= 1, "unique constraint violated: {count} likes for one pair");
}

#[tokio::test]
async fn self_subscription_is_rejected_without_mutation() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let user = register(&pool, "loner").await;

    let social = SocialService::new(pool.clone(), dispatcher.clone());
    let err = social.toggle_subscribe(user, user).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot follow self");

    let followers = SubscriptionRepository::new(pool.clone())
        .count_followers(user)
        .await
        .unwrap();
    assert_eq!(followers, 0);
}

#[tokio::test]
async fn subscribe_toggle_pair_returns_to_baseline() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    let fan = register(&pool, "fan").await;

    let social = SocialService::new(pool.clone(), dispatcher.clone());
    assert!(!social.is_subscribed(fan, author).await.unwrap());

    let first = social.toggle_subscribe(fan, author).await.unwrap();
    assert!(first.subscribed);
    assert_eq!(first.followers_count, 1);
    assert!(social.is_subscribed(fan, author).await.unwrap());

    let second = social.toggle_subscribe(fan, author).await.unwrap();
    assert!(!second.subscribed);
    assert_eq!(second.followers_count, 0);
    assert!(!social.is_subscribed(fan, author).await.unwrap());
}

#[tokio::test]
async fn subscription_listings_show_both_sides() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    let fan = register(&pool, "fan").await;

    let social = SocialService::new(pool.clone(), dispatcher.clone());
    social.toggle_subscribe(fan, author).await.unwrap();

    let following = social.following(fan).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].user_id, author);
    assert!(following[0].username.starts_with("author-"));

    let subscribers = social.subscribers(author).await.unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].user_id, fan);

    assert_eq!(social.count_following(fan).await.unwrap(), 1);
    assert_eq!(social.count_followers(author).await.unwrap(), 1);
}

#[tokio::test]
async fn likes_received_counter_spans_all_posts() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    let reader = register(&pool, "reader").await;
    let first_post = publish(&pool, &dispatcher, author).await;
    let second_post = publish(&pool, &dispatcher, author).await;

    let social = SocialService::new(pool.clone(), dispatcher.clone());
    social.toggle_like(first_post, reader).await.unwrap();
    social.toggle_like(second_post, reader).await.unwrap();

    assert_eq!(social.total_likes_received(author).await.unwrap(), 2);
    assert_eq!(social.total_likes_received(reader).await.unwrap(), 0);
}

#[tokio::test]
async fn registration_creates_profile_and_settings_atomically() {
    let (_pg, pool) = common::setup_db().await;
    let user_id = register(&pool, "fresh").await;

    let users = UserService::new(pool.clone());
    let settings = users.get_settings(user_id).await.unwrap();
    assert!(settings.email_notifications, "notifications default on");
    assert_eq!(settings.theme, "light");

    users.get_profile(user_id).await.expect("profile must exist");
}

#[tokio::test]
async fn deleting_a_post_cascades_to_comments_and_likes() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    let reader = register(&pool, "reader").await;
    let post_id = publish(&pool, &dispatcher, author).await;

    CommentService::new(pool.clone(), dispatcher.clone())
        .create_comment(post_id, reader, "nice post")
        .await
        .unwrap();
    SocialService::new(pool.clone(), dispatcher.clone())
        .toggle_like(post_id, reader)
        .await
        .unwrap();

    PostService::new(pool.clone(), dispatcher.clone())
        .delete_post(author, post_id)
        .await
        .unwrap();

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((comments, likes), (0, 0));
}

#[tokio::test]
async fn popular_tags_rank_by_usage() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;

    let posts = PostService::new(pool.clone(), dispatcher.clone());
    for tags in [vec!["rust", "web"], vec!["rust"]] {
        posts
            .create_post(
                author,
                NewPost {
                    title: "Hello".to_string(),
                    content: "world".to_string(),
                    tags: tags.into_iter().map(str::to_string).collect(),
                },
            )
            .await
            .unwrap();
    }

    let ranked = posts.popular_tags(10).await.unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].name, "rust");
    assert_eq!(ranked[0].post_count, 2);
    assert_eq!(ranked[1].name, "web");
    assert_eq!(ranked[1].post_count, 1);
}

#[tokio::test]
async fn empty_search_returns_nothing_not_everything() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let author = register(&pool, "author").await;
    publish(&pool, &dispatcher, author).await;

    let posts = PostService::new(pool.clone(), dispatcher.clone());
    assert!(posts.search("", 10, 0).await.unwrap().is_empty());
    assert!(posts.search("   ", 10, 0).await.unwrap().is_empty());
}
