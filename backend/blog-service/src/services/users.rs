/// User service - registration, profiles, and per-user settings
use crate::error::{AppError, Result};
use crate::models::{NewUser, Profile, UpdateProfile, UpdateSettings, User, UserSettings};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

const THEMES: &[&str] = &["light", "dark", "cyber"];

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user.
    ///
    /// The user row and its companion profile and settings rows are created
    /// in one transaction: there is no observable state in which a user
    /// exists without them.
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let username = new_user.username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }
        if new_user.password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }
        let email = new_user
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(&email)
        .bind(hash_password(&new_user.password))
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation(format!("username \"{username}\" is already taken"))
            }
            _ => AppError::from(err),
        })?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, bio, location, website
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, update: UpdateProfile) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET bio = COALESCE($2, bio),
                location = COALESCE($3, location),
                website = COALESCE($4, website)
            WHERE user_id = $1
            RETURNING user_id, bio, location, website
            "#,
        )
        .bind(user_id)
        .bind(update.bio)
        .bind(update.location)
        .bind(update.website)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))
    }

    pub async fn get_settings(&self, user_id: Uuid) -> Result<UserSettings> {
        sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT user_id, theme, sound_enabled, email_notifications
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("settings".to_string()))
    }

    pub async fn update_settings(
        &self,
        user_id: Uuid,
        update: UpdateSettings,
    ) -> Result<UserSettings> {
        if let Some(theme) = update.theme.as_deref() {
            if !THEMES.contains(&theme) {
                return Err(AppError::Validation(format!("unknown theme \"{theme}\"")));
            }
        }

        sqlx::query_as::<_, UserSettings>(
            r#"
            UPDATE user_settings
            SET theme = COALESCE($2, theme),
                sound_enabled = COALESCE($3, sound_enabled),
                email_notifications = COALESCE($4, email_notifications)
            WHERE user_id = $1
            RETURNING user_id, theme, sound_enabled, email_notifications
            "#,
        )
        .bind(user_id)
        .bind(update.theme)
        .bind(update.sound_enabled)
        .bind(update.email_notifications)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("settings".to_string()))
    }
}

/// Password storage is a delegated concern in this service; the credential
/// is hashed only so it is never persisted in clear text.
fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
