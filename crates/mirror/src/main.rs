//! Catalog Mirror server.
//!
//! Serves the Shopify webhook receiver on port 3002 and runs in-process job
//! workers (`MIRROR_WORKERS`, default 2) against the `PostgreSQL` queue.
//!
//! # Security
//!
//! Webhooks are accepted only with a valid `X-Shopify-Hmac-SHA256` signature.
//! Without `SHOPIFY_WEBHOOK_SECRET` every delivery is rejected.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use catalog_mirror::config::MirrorConfig;
use catalog_mirror::db::{self, PgProductStore};
use catalog_mirror::jobs::{JobRunner, PgJobQueue, WorkerPool};
use catalog_mirror::services::ProductSyncService;
use catalog_mirror::shopify::ShopifyClient;
use catalog_mirror::{AppState, app};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &MirrorConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = MirrorConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "catalog_mirror=info,tower_http=debug".into());

    // JSON on Fly.io for structured log parsing, text locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    config.log_warnings();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p catalog-mirror-cli -- migrate

    let sync = ProductSyncService::new(
        Arc::new(PgProductStore::new(pool.clone())),
        Arc::new(PgJobQueue::new(pool)),
    );
    let source = Arc::new(
        ShopifyClient::new(&config.shopify).expect("Failed to create Shopify client"),
    );
    let workers = WorkerPool::spawn(JobRunner::new(source, sync.clone()), config.workers);

    let state = AppState::new(sync, config.webhook_secret.clone());
    let addr = config.socket_addr();

    // NOTE: Binding to 127.0.0.1 by default - put a TLS proxy in front for Shopify
    tracing::info!("catalog-mirror listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    workers.shutdown().await;
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
