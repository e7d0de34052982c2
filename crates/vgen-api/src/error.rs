//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("You have reached your generation limit for this month. Upgrade your plan to continue.")]
    QuotaExhausted { upgrade_url: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Generation(#[from] vgen_sora::SoraError),

    #[error("Storage error: {0}")]
    Storage(#[from] vgen_storage::StorageError),

    #[error("Database error: {0}")]
    Db(#[from] vgen_db::DbError),

    #[error("Billing error: {0}")]
    Billing(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn billing(msg: impl Into<String>) -> Self {
        Self::Billing(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        use vgen_sora::SoraError;

        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExhausted { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(e) => match e {
                SoraError::JobFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SoraError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Db(_)
            | ApiError::Billing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, when one exists. The disallowed-face
    /// rejection must be distinguishable from generic upstream failures.
    fn error_code(&self) -> Option<String> {
        match self {
            ApiError::QuotaExhausted { .. } => Some("quota_exhausted".to_string()),
            ApiError::Generation(vgen_sora::SoraError::JobFailed { reason, .. }) => {
                Some(reason.clone())
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upgrade_url: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Don't expose internal error details in production. Generation
        // errors stay verbatim: their messages are user-facing.
        let detail = match &self {
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Db(_)
            | ApiError::Billing(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let upgrade_url = match &self {
            ApiError::QuotaExhausted { upgrade_url } => Some(upgrade_url.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            detail,
            code,
            upgrade_url,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_rejection_keeps_its_code() {
        let err = ApiError::Generation(vgen_sora::SoraError::JobFailed {
            reason: "face_upload_not_allowed".to_string(),
            message: vgen_sora::failure_reason_message("face_upload_not_allowed"),
        });
        assert_eq!(err.error_code().as_deref(), Some("face_upload_not_allowed"));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn quota_exhausted_is_forbidden() {
        let err = ApiError::QuotaExhausted {
            upgrade_url: "/pricing".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code().as_deref(), Some("quota_exhausted"));
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = ApiError::Generation(vgen_sora::SoraError::Timeout {
            attempts: 60,
            seconds: 120,
        });
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
