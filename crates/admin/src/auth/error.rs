//! Auth flow errors.

use chimax_core::EmailError;
use thiserror::Error;

use super::MIN_PASSWORD_LENGTH;
use crate::api::ApiError;
use crate::identity::IdentityError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail(#[from] EmailError),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("Name is required")]
    MissingName,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation needs a signed-in session.
    #[error("Not signed in")]
    NotSignedIn,
}

impl AuthError {
    /// Whether the error came from input checks rather than a remote call.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_) | Self::PasswordTooShort | Self::MissingName
        )
    }
}
