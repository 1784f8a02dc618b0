use crate::config::config::BooksConfig;
use crate::observability::ObservabilityState;
use crate::security::rate_limit::RateLimiter;
use crate::services::genre_cache::GenreCache;
use crate::services::otp::OtpLifecycleManager;
use crate::storage::account_directory::AccountDirectory;
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Genre cache and live book lookups
    pub genre_cache: Arc<GenreCache>,
    /// OTP issuance and verification
    pub otp_manager: Arc<OtpLifecycleManager>,
    /// Registered accounts
    pub accounts: Arc<dyn AccountDirectory>,
    /// Rate limiter for the OTP endpoints
    pub rate_limiter: Arc<RateLimiter>,
    /// Metrics and dependency health
    pub observability: Arc<ObservabilityState>,
    /// Genres to cache and default limits
    pub books: Arc<BooksConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("genre_cache", &"Arc<GenreCache>")
            .field("otp_manager", &"Arc<OtpLifecycleManager>")
            .field("accounts", &"Arc<dyn AccountDirectory>")
            .field("rate_limiter", &self.rate_limiter)
            .field("observability", &self.observability)
            .field("books", &self.books)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        genre_cache: GenreCache,
        otp_manager: OtpLifecycleManager,
        accounts: Arc<dyn AccountDirectory>,
        rate_limiter: RateLimiter,
        observability: Arc<ObservabilityState>,
        books: BooksConfig,
    ) -> Self {
        Self {
            genre_cache: Arc::new(genre_cache),
            otp_manager: Arc::new(otp_manager),
            accounts,
            rate_limiter: Arc::new(rate_limiter),
            observability,
            books: Arc::new(books),
        }
    }
}
