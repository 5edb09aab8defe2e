//! Unified error handling for the console.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use chimax_core::AdminId;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::identity::IdentityError;
use crate::resource::ResourceError;

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Sign-in flow failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Browser session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Status code for a backend failure.
#[must_use]
pub const fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ApiError::Logical(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::Transport(_)
        | ApiError::Status { .. }
        | ApiError::Decode(_)
        | ApiError::InvalidUrl(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Status code for a failed collection operation.
#[must_use]
pub const fn resource_status(err: &ResourceError) -> StatusCode {
    match err {
        ResourceError::Api(err) => api_status(err),
        ResourceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ResourceError::ReadOnly(_) => StatusCode::METHOD_NOT_ALLOWED,
    }
}

/// Status code for a failed auth flow.
#[must_use]
pub const fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidEmail(_) | AuthError::PasswordTooShort | AuthError::MissingName => {
            StatusCode::BAD_REQUEST
        }
        AuthError::Identity(
            IdentityError::InvalidCredentials
            | IdentityError::EmailNotFound
            | IdentityError::UserDisabled,
        )
        | AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
        AuthError::Identity(IdentityError::EmailExists | IdentityError::WeakPassword(_)) => {
            StatusCode::CONFLICT
        }
        AuthError::Identity(IdentityError::TooManyAttempts) => StatusCode::TOO_MANY_REQUESTS,
        AuthError::Identity(IdentityError::Provider(_) | IdentityError::Transport(_)) => {
            StatusCode::BAD_GATEWAY
        }
        AuthError::Api(err) => api_status(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console request error"
            );
        }

        let status = match &self {
            Self::Api(err) => api_status(err),
            Self::Auth(err) => auth_status(err),
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Api(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context from an admin id.
pub fn set_sentry_user(admin_id: &AdminId, is_sub_admin: bool) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            ..Default::default()
        }));
        scope.set_tag("sub_admin", is_sub_admin);
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("banner-123".to_string());
        assert_eq!(err.to_string(), "Not found: banner-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Unauthorized)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::PasswordTooShort)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::Identity(IdentityError::EmailExists))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_backend_status_mapping() {
        assert_eq!(
            api_status(&ApiError::Logical("not found".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(api_status(&ApiError::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            resource_status(&ResourceError::ReadOnly("Transaction")),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
