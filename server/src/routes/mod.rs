//! HTTP routes — publish, application, iteration.
//!
//! All endpoints are POST with JSON bodies, mirroring the front-end contract:
//! required-field validation happens here, before any service call.

pub mod app;
pub mod iteration;
pub mod publish;

use axum::Router;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::AsyncPgConnection;

use crate::config::AppConfig;
use crate::error::ApiError;

pub type DbPool = Pool<AsyncPgConnection>;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct RouterState {
    pub pool: DbPool,
    pub config: AppConfig,
}

/// Build the API router.
pub fn api_router(state: RouterState) -> Router {
    Router::new()
        .nest("/publish", publish::router())
        .nest("/app", app::router())
        .nest("/iteration", iteration::router())
        .with_state(state)
}

/// A required body field.
pub(crate) fn required<T>(value: Option<T>) -> Result<T, ApiError> {
    value.ok_or(ApiError::Validation)
}

/// A required, non-empty string field.
pub(crate) fn required_str(value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ApiError::Validation),
    }
}

/// First element of a filter array; the wire format sends single-element
/// arrays for equality filters.
pub(crate) fn first<T>(values: Option<Vec<T>>) -> Option<T> {
    values.and_then(|v| v.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_strings_fail_validation() {
        assert!(matches!(required_str(None), Err(ApiError::Validation)));
        assert!(matches!(
            required_str(Some("  ".into())),
            Err(ApiError::Validation)
        ));
        assert_eq!(required_str(Some("daily".into())).unwrap(), "daily");
    }

    #[test]
    fn first_takes_the_leading_filter_element() {
        assert_eq!(first(Some(vec!["4001", "4003"])), Some("4001"));
        assert_eq!(first::<&str>(Some(vec![])), None);
        assert_eq!(first::<&str>(None), None);
    }
}
