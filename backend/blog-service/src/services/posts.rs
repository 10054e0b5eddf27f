/// Post service - post CRUD, tags, view counts, and search
///
/// Emits a `NewPost` event to the notification dispatcher after a post has
/// durably committed; dispatch is fire-and-forget and can never fail the
/// author's request.
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, PostView, Tag, TagSummary, UpdatePost};
use crate::services::notifications::{NotificationDispatcher, NotificationEvent};
use heck::ToKebabCase;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

pub struct PostService {
    pool: PgPool,
    dispatcher: Arc<NotificationDispatcher>,
}

impl PostService {
    pub fn new(pool: PgPool, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { pool, dispatcher }
    }

    /// Create a new post with its tags; unknown tag names are created on
    /// demand. Followers of the author are notified after commit.
    pub async fn create_post(&self, author_id: Uuid, new_post: NewPost) -> Result<PostView> {
        let title = new_post.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if new_post.content.trim().is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let author_name: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
                .bind(author_id)
                .fetch_optional(&mut *tx)
                .await?;
        let author_name = author_name.ok_or_else(|| AppError::NotFound("user".to_string()))?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, title, content, views_count, created_at, updated_at
            "#,
        )
        .bind(author_id)
        .bind(title)
        .bind(&new_post.content)
        .fetch_one(&mut *tx)
        .await?;

        let tags = link_tags(&mut tx, post.id, &new_post.tags).await?;
        tx.commit().await?;

        tracing::info!(post_id = %post.id, author = %author_name, "created post");
        self.dispatcher.dispatch(NotificationEvent::NewPost {
            post_id: post.id,
            post_title: post.title.clone(),
            author_id,
            author_name,
        });

        Ok(PostView {
            content_html: markdown_pipeline::render(&post.content),
            total_likes: 0,
            is_liked: None,
            post,
            tags,
        })
    }

    /// Update a post. Scoped to the author: a post that exists but belongs
    /// to someone else is reported as not found.
    pub async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        update: UpdatePost,
    ) -> Result<PostView> {
        let title = update.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if update.content.trim().is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $3, content = $4, updated_at = NOW()
            WHERE id = $1 AND author_id = $2
            RETURNING id, author_id, title, content, views_count, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(title)
        .bind(&update.content)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("post".to_string()))?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let tags = link_tags(&mut tx, post.id, &update.tags).await?;

        tx.commit().await?;

        let total_likes = self.count_likes(post.id).await?;
        Ok(PostView {
            content_html: markdown_pipeline::render(&post.content),
            total_likes,
            is_liked: None,
            post,
            tags,
        })
    }

    /// Delete a post; comments and likes go with it via cascade.
    /// Author-scoped like `update_post`.
    pub async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Result<()> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND author_id = $2
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("post".to_string()));
        }
        tracing::info!(%post_id, "deleted post");
        Ok(())
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, views_count, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("post".to_string()))
    }

    /// Bump the view counter for a detail view. Monotonic; not an event.
    pub async fn increment_views(&self, post_id: Uuid) -> Result<i32> {
        let views: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET views_count = views_count + 1
            WHERE id = $1
            RETURNING views_count
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        views.ok_or_else(|| AppError::NotFound("post".to_string()))
    }

    pub async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, views_count, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Posts carrying the tag with the given slug; unknown slug is an error.
    pub async fn list_by_tag(&self, slug: &str, limit: i64, offset: i64) -> Result<(Tag, Vec<Post>)> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, slug FROM tags WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("tag".to_string()))?;

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.title, p.content, p.views_count, p.created_at, p.updated_at
            FROM posts p
            JOIN post_tags pt ON pt.post_id = p.id
            WHERE pt.tag_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tag.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((tag, posts))
    }

    /// Free-text search across title, content, and tag names: OR semantics,
    /// case-insensitive substring match, de-duplicated. An empty query is an
    /// empty result, never "all posts".
    pub async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(query));
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT DISTINCT p.id, p.author_id, p.title, p.content, p.views_count,
                   p.created_at, p.updated_at
            FROM posts p
            LEFT JOIN post_tags pt ON pt.post_id = p.id
            LEFT JOIN tags t ON t.id = pt.tag_id
            WHERE p.title ILIKE $1 OR p.content ILIKE $1 OR t.name ILIKE $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Most-used tags first, for the tag listing.
    pub async fn popular_tags(&self, limit: i64) -> Result<Vec<TagSummary>> {
        let tags = sqlx::query_as::<_, TagSummary>(
            r#"
            SELECT t.id, t.name, t.slug, COUNT(pt.post_id) AS post_count
            FROM tags t
            LEFT JOIN post_tags pt ON pt.tag_id = t.id
            GROUP BY t.id, t.name, t.slug
            ORDER BY post_count DESC, t.name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    pub async fn tags_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.slug
            FROM tags t
            JOIN post_tags pt ON pt.tag_id = t.id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Assemble the client-facing shape of a post: sanitized HTML, tags,
    /// and the like count.
    pub async fn view(&self, post: Post) -> Result<PostView> {
        let tags = self.tags_for_post(post.id).await?;
        let total_likes = self.count_likes(post.id).await?;
        Ok(PostView {
            content_html: markdown_pipeline::render(&post.content),
            total_likes,
            is_liked: None,
            post,
            tags,
        })
    }
}

/// Get-or-create each named tag and attach it to the post. Runs inside the
/// caller's transaction.
async fn link_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    names: &[String],
) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();
    for raw in names {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        let slug = name.to_kebab_case();

        sqlx::query(
            r#"
            INSERT INTO tags (name, slug)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(name)
        .bind(&slug)
        .execute(&mut **tx)
        .await?;

        // The insert may have been a no-op on either unique column; resolve
        // whichever row now owns this name or slug.
        let tag: Option<Tag> = sqlx::query_as(
            r#"
            SELECT id, name, slug FROM tags
            WHERE name = $1 OR slug = $2
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(&slug)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(tag) = tag else { continue };

        sqlx::query(
            r#"
            INSERT INTO post_tags (post_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(tag.id)
        .execute(&mut **tx)
        .await?;

        if !tags.iter().any(|t: &Tag| t.id == tag.id) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Escape ILIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
