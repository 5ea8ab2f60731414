//! Error taxonomy and HTTP mapping.
//!
//! Business failures (validation, missing rows, admission rejections, range
//! errors) are expected control flow: they map to HTTP 200 with a
//! `{success:false}` envelope. Persistence and upstream faults abort the
//! request with a 500 and a generic message; the detail goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::response::Envelope;

pub const PARAM_MISSING: &str = "required parameter missing";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required request field is absent or empty.
    #[error("required parameter missing")]
    Validation,

    /// A referenced row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Business-rule rejection; the message is shown to the caller verbatim.
    #[error("{0}")]
    Rejected(&'static str),

    /// Pagination offset beyond the filtered total.
    #[error("out of range")]
    OutOfRange,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("source control request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl ApiError {
    /// True for unexpected faults that must surface as transport errors.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Pool(_) | Self::Upstream(_)
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_fault() {
            tracing::error!(error = %self, "request aborted");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Envelope::<serde_json::Value>::fail("internal server error")),
            )
                .into_response();
        }

        Json(Envelope::<serde_json::Value>::fail(self.to_string())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_are_not_faults() {
        assert!(!ApiError::Validation.is_fault());
        assert!(!ApiError::NotFound("application").is_fault());
        assert!(!ApiError::Rejected("this commit has already been published").is_fault());
        assert!(!ApiError::OutOfRange.is_fault());
    }

    #[test]
    fn database_errors_are_faults() {
        assert!(ApiError::Database(diesel::result::Error::NotInTransaction).is_fault());
    }

    #[test]
    fn messages_match_the_wire_contract() {
        assert_eq!(ApiError::Validation.to_string(), PARAM_MISSING);
        assert_eq!(ApiError::OutOfRange.to_string(), "out of range");
        assert_eq!(
            ApiError::NotFound("iteration").to_string(),
            "iteration not found"
        );
    }
}
