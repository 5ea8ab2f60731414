//! Server configuration — loaded from environment variables.

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the source-control service API.
    pub scm_base_url: String,
    /// Access token for source-control API calls.
    pub scm_token: String,
    /// Maximum database connections in the pool.
    pub db_pool_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let scm_base_url = std::env::var("SCM_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());
        let scm_token = std::env::var("SCM_TOKEN").unwrap_or_default();
        let db_pool_size = std::env::var("DB_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16);

        if scm_token.is_empty() {
            tracing::warn!("SCM_TOKEN not set -- source-control requests are unauthenticated");
        }

        Self {
            scm_base_url,
            scm_token,
            db_pool_size,
        }
    }
}
