//! Third-party identity provider.
//!
//! The provider authenticates the operator's email and password and issues a
//! short-lived id token, which the auth flow exchanges for backend session
//! tokens. Principal changes are published on a [`tokio::sync::watch`]
//! channel so guards can react when the operator signs out elsewhere.

mod toolkit;

pub use toolkit::IdentityToolkit;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use chimax_core::Email;

/// Session store key holding the signed-in principal.
pub const PRINCIPAL_KEY: &str = "identity";

/// Errors reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailExists,

    #[error("No account found for this email")]
    EmailNotFound,

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    #[error("This account has been disabled")]
    UserDisabled,

    #[error("Too many attempts, please try again later")]
    TooManyAttempts,

    /// Any other provider error code.
    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Could not reach the identity provider: {0}")]
    Transport(String),
}

/// An operator authenticated by the identity provider.
#[derive(Clone)]
pub struct Principal {
    pub uid: String,
    pub email: Email,
    pub id_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.email == other.email
            && self.expires_at == other.expires_at
            && self.id_token.expose_secret() == other.id_token.expose_secret()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredPrincipal {
    uid: String,
    email: Email,
    id_token: String,
    expires_at: DateTime<Utc>,
}

impl Principal {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Write the principal into the browser's session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn persist(
        &self,
        store: &tower_sessions::Session,
    ) -> Result<(), tower_sessions::session::Error> {
        let record = StoredPrincipal {
            uid: self.uid.clone(),
            email: self.email.clone(),
            id_token: self.id_token.expose_secret().to_string(),
            expires_at: self.expires_at,
        };
        store.insert(PRINCIPAL_KEY, record).await
    }

    /// Read the principal from the browser's session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn restore(
        store: &tower_sessions::Session,
    ) -> Result<Option<Self>, tower_sessions::session::Error> {
        let record: Option<StoredPrincipal> = store.get(PRINCIPAL_KEY).await?;
        Ok(record.map(|record| Self {
            uid: record.uid,
            email: record.email,
            id_token: SecretString::from(record.id_token),
            expires_at: record.expires_at,
        }))
    }

    /// Remove the principal from the browser's session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn forget(store: &tower_sessions::Session) -> Result<(), tower_sessions::session::Error> {
        store.remove_value(PRINCIPAL_KEY).await.map(|_| ())
    }
}

/// Publisher of principal changes.
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct PrincipalWatch {
    tx: Arc<watch::Sender<Option<Principal>>>,
}

impl Default for PrincipalWatch {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PrincipalWatch {
    #[must_use]
    pub fn new(initial: Option<Principal>) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// Publish a new principal (or sign-out) to every subscriber.
    pub fn publish(&self, principal: Option<Principal>) {
        self.tx.send_replace(principal);
    }

    #[must_use]
    pub fn current(&self) -> Option<Principal> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.tx.subscribe()
    }
}

/// Email/password identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Authenticate and publish the resulting principal.
    fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<Principal, IdentityError>> + Send;

    /// Create an account and publish the resulting principal.
    fn register(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<Principal, IdentityError>> + Send;

    /// Send a password reset email.
    fn send_password_reset(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Publish a signed-out state.
    fn sign_out(&self);

    /// The principal as last published.
    fn current(&self) -> Option<Principal>;

    /// Follow principal changes.
    fn subscribe(&self) -> watch::Receiver<Option<Principal>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn principal(expires_at: DateTime<Utc>) -> Principal {
        Principal {
            uid: "fb-1".to_string(),
            email: Email::parse("ops@zeolive.app").unwrap(),
            id_token: SecretString::from("id-token"),
            expires_at,
        }
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        assert!(principal(now - chrono::Duration::seconds(1)).is_expired());
        assert!(!principal(now + chrono::Duration::hours(1)).is_expired());
    }

    #[test]
    fn test_watch_publishes_to_subscribers() {
        let watch = PrincipalWatch::default();
        let mut rx = watch.subscribe();
        assert!(rx.borrow_and_update().is_none());

        let signed_in = principal(Utc::now() + chrono::Duration::hours(1));
        watch.publish(Some(signed_in.clone()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&signed_in));

        watch.publish(None);
        assert!(watch.current().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", principal(Utc::now()));
        assert!(!debug.contains("id-token"));
    }
}
