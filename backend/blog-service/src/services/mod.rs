/// Business logic layer
pub mod comments;
pub mod mailer;
pub mod notifications;
pub mod posts;
pub mod social;
pub mod users;

pub use comments::CommentService;
pub use mailer::{EmailMessage, Mailer, SmtpMailer};
pub use notifications::{
    FollowerSource, NotificationDispatcher, NotificationEvent, PgRecipientDirectory, Recipient,
    RecipientDirectory,
};
pub use posts::PostService;
pub use social::SocialService;
pub use users::UserService;
