//! Notification dispatcher.
//!
//! Consumes domain events (new comment, like, follow, post), resolves the
//! recipients, applies per-user notification preferences, and hands composed
//! emails to the [`Mailer`]. Everything here is best-effort: delivery
//! problems are logged and swallowed, and the user action that produced the
//! event has already committed by the time an event reaches this module.

use crate::error::Result;
use crate::repository::SubscriptionRepository;
use crate::services::mailer::{EmailMessage, Mailer};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A domain event that may produce notifications. Events carry snapshots of
/// the data the templates need so composition never goes back to the store.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    NewComment {
        post_id: Uuid,
        post_title: String,
        post_author_id: Uuid,
        commenter_id: Uuid,
        commenter_name: String,
    },
    NewLike {
        post_id: Uuid,
        post_title: String,
        post_author_id: Uuid,
        liker_id: Uuid,
        liker_name: String,
    },
    NewFollow {
        author_id: Uuid,
        follower_name: String,
    },
    NewPost {
        post_id: Uuid,
        post_title: String,
        author_id: Uuid,
        author_name: String,
    },
}

impl NotificationEvent {
    fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::NewComment { .. } => "new_comment",
            NotificationEvent::NewLike { .. } => "new_like",
            NotificationEvent::NewFollow { .. } => "new_follower",
            NotificationEvent::NewPost { .. } => "new_post",
        }
    }
}

/// What the dispatcher needs to know about a potential recipient.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_notifications: bool,
}

/// Resolves a user id to its notification-relevant state.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn recipient(&self, user_id: Uuid) -> Result<Option<Recipient>>;
}

/// Resolves the followers of an author for new-post fan-out.
#[async_trait]
pub trait FollowerSource: Send + Sync {
    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Postgres-backed recipient lookup joining users with their settings row.
#[derive(Clone)]
pub struct PgRecipientDirectory {
    pool: PgPool,
}

impl PgRecipientDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PgRecipientDirectory {
    async fn recipient(&self, user_id: Uuid) -> Result<Option<Recipient>> {
        let row: Option<(Uuid, Option<String>, bool)> = sqlx::query_as(
            r#"
            SELECT u.id, u.email, s.email_notifications
            FROM users u
            JOIN user_settings s ON s.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, email_notifications)| Recipient {
            id,
            email,
            email_notifications,
        }))
    }
}

#[async_trait]
impl FollowerSource for SubscriptionRepository {
    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>> {
        SubscriptionRepository::followers_of(self, author_id).await
    }
}

pub struct NotificationDispatcher {
    directory: Arc<dyn RecipientDirectory>,
    followers: Arc<dyn FollowerSource>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn RecipientDirectory>,
        followers: Arc<dyn FollowerSource>,
        mailer: Arc<dyn Mailer>,
        base_url: String,
    ) -> Self {
        Self {
            directory,
            followers,
            mailer,
            base_url,
        }
    }

    /// Fire-and-forget entry point. Delivery runs on a background task so a
    /// new-post fan-out does not stretch the author's request, and no error
    /// ever reaches the caller.
    pub fn dispatch(self: &Arc<Self>, event: NotificationEvent) {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.deliver(event).await;
        });
    }

    /// Synchronous delivery path; returns the number of emails actually
    /// handed to the mailer (skips and failures count as zero).
    pub async fn deliver(&self, event: NotificationEvent) -> usize {
        debug!(kind = event.kind(), "delivering notification event");
        match event {
            NotificationEvent::NewComment {
                post_id,
                post_title,
                post_author_id,
                commenter_id,
                ..
            } if commenter_id == post_author_id => {
                debug!(%post_id, title = %post_title, "author commented on own post, skipping");
                0
            }
            NotificationEvent::NewComment {
                post_id,
                post_title,
                post_author_id,
                ..
            } => {
                let subject = format!("New comment on your post \"{post_title}\"");
                let body = self.post_body(&subject, post_id);
                usize::from(
                    self.notify(post_author_id, subject, "new_comment", body)
                        .await,
                )
            }
            NotificationEvent::NewLike {
                post_id,
                post_title,
                post_author_id,
                liker_id,
                ..
            } if liker_id == post_author_id => {
                debug!(%post_id, title = %post_title, "author liked own post, skipping");
                0
            }
            NotificationEvent::NewLike {
                post_id,
                post_title,
                post_author_id,
                liker_name,
                ..
            } => {
                let subject = format!("{liker_name} liked your post \"{post_title}\"");
                let body = self.post_body(&subject, post_id);
                usize::from(self.notify(post_author_id, subject, "new_like", body).await)
            }
            NotificationEvent::NewFollow {
                author_id,
                follower_name,
            } => {
                // Self-follow is rejected upstream, no gate needed here.
                let subject = format!("{follower_name} is now following you!");
                let body = self.plain_body(&subject);
                usize::from(
                    self.notify(author_id, subject, "new_follower", body)
                        .await,
                )
            }
            NotificationEvent::NewPost {
                post_id,
                post_title,
                author_id,
                author_name,
            } => {
                let followers = match self.followers.followers_of(author_id).await {
                    Ok(followers) => followers,
                    Err(err) => {
                        warn!(%author_id, "failed to resolve followers for fan-out: {err}");
                        return 0;
                    }
                };

                let subject = format!("{author_name} published a new post: \"{post_title}\"");
                let mut sent = 0;
                for follower_id in followers {
                    let body = self.post_body(&subject, post_id);
                    if self
                        .notify(follower_id, subject.clone(), "new_post", body)
                        .await
                    {
                        sent += 1;
                    }
                }
                sent
            }
        }
    }

    /// Resolve one recipient, apply the preference gates, and send. A
    /// skipped recipient (notifications off, no address) is success; a
    /// failed send is logged and swallowed.
    async fn notify(
        &self,
        recipient_id: Uuid,
        subject: String,
        template: &'static str,
        body: String,
    ) -> bool {
        let recipient = match self.directory.recipient(recipient_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                debug!(%recipient_id, "notification recipient no longer exists");
                return false;
            }
            Err(err) => {
                warn!(%recipient_id, "failed to resolve notification recipient: {err}");
                return false;
            }
        };

        if !recipient.email_notifications {
            debug!(%recipient_id, template, "email notifications disabled, skipping");
            return false;
        }

        let to = match recipient.email {
            Some(email) if !email.trim().is_empty() => email,
            _ => {
                debug!(%recipient_id, template, "recipient has no email address, skipping");
                return false;
            }
        };

        let message = EmailMessage {
            to,
            subject,
            template,
            body,
        };

        match self.mailer.send(&message).await {
            Ok(()) => {
                debug!(%recipient_id, template, "notification email sent");
                true
            }
            Err(err) => {
                warn!(%recipient_id, template, "notification email failed: {err}");
                false
            }
        }
    }

    fn post_body(&self, subject: &str, post_id: Uuid) -> String {
        format!(
            "{subject}\n\nRead it here: {base}/posts/{post_id}\n\n{footer}",
            base = self.base_url,
            footer = self.footer(),
        )
    }

    fn plain_body(&self, subject: &str) -> String {
        format!("{subject}\n\n{footer}", footer = self.footer())
    }

    fn footer(&self) -> String {
        format!(
            "You can turn off email notifications in your settings:\n{}/users/settings",
            self.base_url
        )
    }
}
