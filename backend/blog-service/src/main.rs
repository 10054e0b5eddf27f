use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use blog_service::config::Config;
use blog_service::db;
use blog_service::handlers;
use blog_service::repository::SubscriptionRepository;
use blog_service::services::{NotificationDispatcher, PgRecipientDirectory, SmtpMailer};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = db::init_pool(&config.database)
        .await
        .context("failed to connect to database")?;
    db::MIGRATOR
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("database ready");

    let mailer = SmtpMailer::new(&config.smtp).context("failed to build SMTP mailer")?;
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(PgRecipientDirectory::new(pool.clone())),
        Arc::new(SubscriptionRepository::new(pool.clone())),
        Arc::new(mailer),
        config.app.base_url.clone(),
    ));

    let bind_addr = (config.app.host.clone(), config.app.port);
    info!(host = %config.app.host, port = config.app.port, "starting blog-service");

    HttpServer::new({
        let pool = pool.clone();
        let dispatcher = dispatcher.clone();
        move || {
            App::new()
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(pool.clone()))
                .app_data(web::Data::new(dispatcher.clone()))
                .configure(handlers::configure)
        }
    })
    .bind(bind_addr)
    .context("failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server error")
}
