/// Blog Service Library
///
/// Server-rendered blogging platform backend: users author Markdown posts,
/// comment, like, and follow each other; followers get best-effort email
/// notifications on new content.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Row and payload structures
/// - `services`: Business logic (posts, comments, users, social graph,
///   notification dispatch, mail transport)
/// - `repository`: Social graph store (likes, subscriptions)
/// - `db`: Pool construction and migrations
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
