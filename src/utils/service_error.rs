// Unified service error type mapped onto HTTP responses
// Services return ServiceError; handlers bubble it straight into axum

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::generated_image::RevisionChainError;
use crate::services::ai::OpenAiError;
use crate::services::jwt::JwtError;
use crate::services::scrape::ScrapeError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Usage quota exceeded")]
    QuotaExceeded,

    #[error("Share link has expired")]
    ShareLinkExpired,

    #[error("Share link is no longer active")]
    ShareLinkInactive,

    #[error("Could not allocate a unique share code")]
    CodeCollision,

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            ServiceError::ShareLinkExpired | ServiceError::ShareLinkInactive => StatusCode::GONE,
            ServiceError::CodeCollision | ServiceError::InvalidStateTransition(_) => {
                StatusCode::CONFLICT
            },
            ServiceError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            ServiceError::DatabaseError(_)
            | ServiceError::CacheError(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code for API clients
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::ValidationError(_) => "VALIDATION_ERROR",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::QuotaExceeded => "QUOTA_EXCEEDED",
            ServiceError::ShareLinkExpired => "SHARE_LINK_EXPIRED",
            ServiceError::ShareLinkInactive => "SHARE_LINK_INACTIVE",
            ServiceError::CodeCollision => "CODE_COLLISION",
            ServiceError::ExternalApi(_) => "EXTERNAL_API_ERROR",
            ServiceError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            ServiceError::DatabaseError(_) => "DATABASE_ERROR",
            ServiceError::CacheError(_) => "CACHE_ERROR",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to expose to API clients. Internal failure details stay
    /// in the logs.
    fn public_message(&self) -> String {
        match self {
            ServiceError::DatabaseError(_) | ServiceError::CacheError(_) => {
                "An internal error occurred".to_string()
            },
            ServiceError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Service error: {}", self);
        }

        let body = Json(json!({
            "error": self.error_code(),
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                ServiceError::NotFound("Record not found".to_string())
            },
            other => ServiceError::DatabaseError(other.to_string()),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for ServiceError {
    fn from(err: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        ServiceError::DatabaseError(format!("Connection pool error: {}", err))
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        ServiceError::CacheError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let message = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        ServiceError::ValidationError(message)
    }
}

impl From<OpenAiError> for ServiceError {
    fn from(err: OpenAiError) -> Self {
        ServiceError::ExternalApi(err.to_string())
    }
}

impl From<ScrapeError> for ServiceError {
    fn from(err: ScrapeError) -> Self {
        ServiceError::ExternalApi(err.to_string())
    }
}

impl From<RevisionChainError> for ServiceError {
    fn from(err: RevisionChainError) -> Self {
        match err {
            RevisionChainError::ParentOutsideSession(_) => {
                ServiceError::NotFound(err.to_string())
            },
            RevisionChainError::ParentNotCompleted(_)
            | RevisionChainError::OutstandingSibling(_) => {
                ServiceError::InvalidStateTransition(err.to_string())
            },
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Unauthorized(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("Serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::QuotaExceeded.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(ServiceError::ShareLinkExpired.status_code(), StatusCode::GONE);
        assert_eq!(ServiceError::ShareLinkInactive.status_code(), StatusCode::GONE);
        assert_eq!(ServiceError::CodeCollision.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServiceError::ExternalApi("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::InvalidStateTransition("x".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_not_found_from_diesel() {
        let err: ServiceError = diesel::result::Error::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = ServiceError::DatabaseError("password=hunter2 rejected".to_string());
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[test]
    fn test_revision_chain_mapping() {
        let id = uuid::Uuid::new_v4();
        let err: ServiceError = RevisionChainError::OutstandingSibling(id).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ServiceError = RevisionChainError::ParentOutsideSession(id).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
