//! Identity Toolkit REST client.
//!
//! Talks to the `accounts:*` endpoints of an Identity Toolkit compatible API,
//! authenticated by the project API key.

use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use chimax_core::Email;

use super::{IdentityError, IdentityProvider, Principal, PrincipalWatch};
use crate::config::IdentityConfig;

/// Token lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Identity provider backed by the Identity Toolkit REST API.
///
/// Cloning shares the HTTP client and the principal channel.
#[derive(Clone)]
pub struct IdentityToolkit {
    inner: Arc<IdentityToolkitInner>,
    principal: PrincipalWatch,
}

struct IdentityToolkitInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for IdentityToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToolkit")
            .field("base_url", &self.inner.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl IdentityToolkit {
    /// Create a client with no principal signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &IdentityConfig, timeout: std::time::Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(IdentityToolkitInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
            }),
            principal: PrincipalWatch::default(),
        })
    }

    /// Same client, with its own principal channel seeded from `principal`.
    #[must_use]
    pub fn for_principal(&self, principal: Option<Principal>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            principal: PrincipalWatch::new(principal),
        }
    }

    /// The channel principal changes are published on.
    #[must_use]
    pub const fn watch(&self) -> &PrincipalWatch {
        &self.principal
    }

    async fn call<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<reqwest::Response, IdentityError> {
        let response = self
            .inner
            .client
            .post(format!("{}/{endpoint}", self.inner.base_url))
            .header("X-Goog-Api-Key", self.inner.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let code = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.error.message)
            .unwrap_or_else(|_| status.to_string());
        warn!(endpoint, %code, "Identity provider rejected request");
        Err(map_error_code(&code))
    }

    async fn exchange_password(
        &self,
        endpoint: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<Principal, IdentityError> {
        let request = PasswordRequest {
            email: email.as_str(),
            password: password.expose_secret(),
            return_secure_token: true,
        };
        let token: TokenResponse = self
            .call(endpoint, &request)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        let lifetime = token
            .expires_in
            .as_deref()
            .and_then(|secs| secs.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let email = token
            .email
            .and_then(|value| Email::parse(&value).ok())
            .unwrap_or_else(|| email.clone());

        let principal = Principal {
            uid: token.local_id,
            email,
            id_token: SecretString::from(token.id_token),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        };
        self.principal.publish(Some(principal.clone()));
        Ok(principal)
    }
}

impl IdentityProvider for IdentityToolkit {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &SecretString) -> Result<Principal, IdentityError> {
        let principal = self
            .exchange_password("accounts:signInWithPassword", email, password)
            .await?;
        info!(uid = %principal.uid, "Identity provider sign-in succeeded");
        Ok(principal)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn register(&self, email: &Email, password: &SecretString) -> Result<Principal, IdentityError> {
        let principal = self
            .exchange_password("accounts:signUp", email, password)
            .await?;
        info!(uid = %principal.uid, "Identity provider account created");
        Ok(principal)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn send_password_reset(&self, email: &Email) -> Result<(), IdentityError> {
        let request = OobCodeRequest {
            request_type: "PASSWORD_RESET",
            email: email.as_str(),
        };
        self.call("accounts:sendOobCode", &request).await?;
        info!("Password reset email requested");
        Ok(())
    }

    fn sign_out(&self) {
        self.principal.publish(None);
    }

    fn current(&self) -> Option<Principal> {
        self.principal.current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.principal.subscribe()
    }
}

/// Map a provider error code (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`).
fn map_error_code(code: &str) -> IdentityError {
    let (name, detail) = code
        .split_once(':')
        .map_or((code.trim(), ""), |(name, detail)| (name.trim(), detail.trim()));

    match name {
        "EMAIL_NOT_FOUND" => IdentityError::EmailNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            IdentityError::InvalidCredentials
        }
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "WEAK_PASSWORD" => IdentityError::WeakPassword(detail.to_string()),
        "USER_DISABLED" => IdentityError::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => IdentityError::TooManyAttempts,
        _ => IdentityError::Provider(code.to_string()),
    }
}
