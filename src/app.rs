//! HTTP server assembly.

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};

use crate::db::open_pool;
use crate::models::config::ServerConfig;
use crate::ratelimit::{InMemoryRateLimiter, SharedRateLimiter};
use crate::repository::DieselRepository;
use crate::services::Notifier;
use crate::webhooks::ChannelDispatcher;
use crate::{email, routes};

/// Builds the outbound side-effect sinks. Spawns tasks, so it must be called
/// from within a tokio runtime.
pub fn build_notifier(
    server_config: &ServerConfig,
    repo: &DieselRepository,
) -> std::io::Result<Notifier> {
    let dispatcher = ChannelDispatcher::start(repo.clone())
        .map_err(|e| std::io::Error::other(format!("Failed to start webhook dispatcher: {e}")))?;
    let email = email::sender_from_config(server_config)
        .map_err(|e| std::io::Error::other(format!("Failed to start email sender: {e}")))?;
    Ok(Notifier::new(
        Arc::new(dispatcher),
        email,
        server_config.app_url.clone(),
    ))
}

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    let pool = open_pool(&server_config.database_url, server_config.pool_settings())
        .map_err(|e| std::io::Error::other(format!("Failed to open database: {e}")))?;

    let repo = DieselRepository::new(pool);
    let notifier = build_notifier(&server_config, &repo)?;

    let limiter: SharedRateLimiter = Arc::new(InMemoryRateLimiter::new(
        server_config.rate_limit_requests,
        Duration::from_secs(server_config.rate_limit_window_secs),
    ));

    if server_config.cron_secret.is_none() {
        log::warn!("CRON_SECRET is not set, cron endpoints will reject every request");
    }

    // Keys and stores for identity and sessions of dashboard users.
    let secret_key = Key::from(server_config.secret.as_bytes());

    let bind_address = (server_config.address.clone(), server_config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{}", server_config.domain)))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}
