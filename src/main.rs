use anyhow::Context;
use shelfquest::api::{self, app_state::AppState};
use shelfquest::config::loader::ConfigLoader;
use shelfquest::observability::{ObservabilityState, create_observability_router, init_tracing};
use shelfquest::security::rate_limit::RateLimiter;
use shelfquest::services::{
    BookSource, GenreCache, NotificationGateway, OtpLifecycleManager, OtpPolicy,
    create_book_source, create_notification_gateway,
};
use shelfquest::storage::{AccountDirectory, InMemoryAccountDirectory};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;

    let _log_guard = init_tracing(&config.logging)?;
    info!(
        "Starting {} ({} environment)...",
        config.app_name, config.environment
    );

    let book_source: Arc<dyn BookSource> = Arc::from(create_book_source(&config.books)?);
    info!("Book source initialized: {}", config.books.api_url);

    let notifier: Arc<dyn NotificationGateway> = Arc::from(create_notification_gateway(&config.mail)?);
    info!("Notification gateway initialized: {:?}", config.mail.backend);

    let directory = InMemoryAccountDirectory::with_accounts(
        config
            .accounts
            .iter()
            .map(|a| (a.username.as_str(), a.email.as_str())),
    );
    info!("Account directory seeded with {} accounts", directory.len());
    let accounts: Arc<dyn AccountDirectory> = Arc::new(directory);

    let genre_cache = GenreCache::new(book_source);
    let otp_manager = OtpLifecycleManager::new(
        accounts.clone(),
        notifier,
        OtpPolicy::from(&config.otp),
    );
    let rate_limiter = RateLimiter::per_minute(
        config.security.otp_requests_per_minute,
        config.security.rate_limit_enabled,
    );

    let observability = Arc::new(ObservabilityState::new(env!("CARGO_PKG_VERSION")));
    let app_state = AppState::new(
        genre_cache,
        otp_manager,
        accounts,
        rate_limiter,
        observability.clone(),
        config.books.clone(),
    );
    info!("Application state created");

    if config.otp.sweep_interval_secs > 0 {
        let period = Duration::from_secs(config.otp.sweep_interval_secs);
        OtpLifecycleManager::spawn_expiry_sweeper(app_state.otp_manager.clone(), period);
        info!("Expiry sweeper running every {:?}", period);
    }

    RateLimiter::spawn_pruner(app_state.rate_limiter.clone(), RATE_LIMIT_PRUNE_INTERVAL);

    if config.books.warm_on_startup {
        let result = app_state
            .genre_cache
            .populate_all(&config.books.genres, config.books.cache_limit)
            .await;
        observability.observe_upstream("book_source", &result).await;
        match result {
            Ok(report) => info!(
                genres = ?app_state.genre_cache.cached_genres(),
                "Cache warmed with {} books",
                report.total_books
            ),
            Err(e) => warn!("Cache warm-up failed, serving without cache: {}", e),
        }
    }

    let api_router = api::create_router(app_state, &config.security);
    let router = create_observability_router(observability)
        .merge(api_router)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
