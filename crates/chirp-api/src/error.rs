use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use chirp_types::api::{ErrorBody, ErrorItem};

/// Every failure a handler can surface. Rendered as
/// `{"errors": [{"msg": ...}]}` with a matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("request validation failed")]
    Validation(Vec<ErrorItem>),

    /// The request could not be extracted at all (bad JSON, wrong content
    /// type, missing query parameter, oversized body).
    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Shared by every sign-in failure so callers cannot tell a missing
    /// account from a wrong password.
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Invalid credentials".into())
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Authentication required".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidOperation(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Rejected(status, _) => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let errors = match self {
            Self::Validation(items) => items,
            Self::Internal(err) => {
                error!("Internal error: {:#}", err);
                vec![ErrorItem {
                    msg: "Internal server error".into(),
                    param: None,
                }]
            }
            other => vec![ErrorItem {
                msg: other.to_string(),
                param: None,
            }],
        };

        (status, Json(ErrorBody { errors })).into_response()
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::anyhow!("spawn_blocking join error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}
