//! Sign-in, registration and sign-out.
//!
//! [`AuthService`] owns the [`SessionContext`] and is the only code that
//! writes credentials. Sign-in is a chain: identity provider, then the legacy
//! backend (session token and sub-admin flag), then sub-admin permissions,
//! then the v2 backend token. The v2 step is best effort; the console stays
//! usable for legacy screens without it.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use chimax_core::{AdminProfile, Backend, Email, Permission, Session};

use crate::api::{ApiClient, ApiError};
use crate::identity::{IdentityProvider, Principal};
use crate::notify::Notifier;
use crate::session::{SessionContext, SessionReader};

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const LEGACY_LOGIN_PATH: &str = "/api/admin/auth/login";
pub const LEGACY_REGISTER_PATH: &str = "/api/admin/auth/register";
pub const PERMISSIONS_PATH: &str = "/api/admin/subadmin/permissions";
pub const PROFILE_PATH: &str = "/api/admin/profile";
pub const V2_LOGIN_PATH: &str = "/v1/auth/admin/login";

/// Legacy login/register payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyLogin {
    token: String,
    admin: AdminProfile,
    #[serde(default)]
    is_sub_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Login {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRequest<'a> {
    id_token: &'a str,
    uid: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Auth flow for one operator session.
#[derive(Debug)]
pub struct AuthService<P> {
    api: ApiClient,
    identity: P,
    context: SessionContext,
    notifier: Notifier,
}

impl<P: IdentityProvider> AuthService<P> {
    /// Bind the service to a session; the API client reads from it.
    #[must_use]
    pub fn new(api: &ApiClient, identity: P, context: SessionContext, notifier: Notifier) -> Self {
        Self {
            api: api.with_session(context.reader()),
            identity,
            context,
            notifier,
        }
    }

    #[must_use]
    pub fn reader(&self) -> SessionReader {
        self.context.reader()
    }

    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Give up the service and keep its credentials.
    #[must_use]
    pub fn into_context(self) -> SessionContext {
        self.context
    }

    #[must_use]
    pub const fn identity(&self) -> &P {
        &self.identity
    }

    /// API client bound to this session.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input, a provider rejection, or a
    /// legacy backend failure. The session is left cleared on error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let (email, password) = check_credentials(email, password)?;
        let result: Result<(), AuthError> = async {
            let principal = self.identity.sign_in(&email, password).await?;
            self.complete(&principal, LEGACY_LOGIN_PATH, None).await
        }
        .await;
        self.conclude(result, "Signed in")
    }

    /// Create an account, then sign in with it.
    ///
    /// # Errors
    ///
    /// See [`AuthService::login`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<(), AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let (email, password) = check_credentials(email, password)?;
        let result: Result<(), AuthError> = async {
            let principal = self.identity.register(&email, password).await?;
            self.complete(&principal, LEGACY_REGISTER_PATH, Some(name))
                .await
        }
        .await;
        self.conclude(result, "Account created")
    }

    /// Clear the session and sign out of the provider.
    pub fn logout(&self) {
        self.context.clear();
        self.identity.sign_out();
        self.notifier.info("Signed out");
        info!("Operator signed out");
    }

    /// Drop credentials after the backend rejected them.
    ///
    /// Silent: the guard's redirect is the only feedback.
    pub fn invalidate(&self) {
        self.context.clear();
        self.identity.sign_out();
        warn!("Session invalidated after backend rejected credentials");
    }

    /// Ask the provider to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed email or a provider failure.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        match self.identity.send_password_reset(&email).await {
            Ok(()) => {
                self.notifier
                    .success(format!("Password reset email sent to {email}"));
                Ok(())
            }
            Err(err) => {
                self.notifier.error(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Fetch the admin profile and report whether it is complete.
    ///
    /// # Errors
    ///
    /// Returns an error when signed out or when the backend call fails.
    #[instrument(skip(self))]
    pub async fn verify_profile(&self) -> Result<bool, AuthError> {
        if !self.context.reader().is_authenticated() {
            return Err(AuthError::NotSignedIn);
        }
        let profile: AdminProfile = self
            .api
            .get(Backend::Legacy, PROFILE_PATH, &[])
            .await?
            .require_data()
            .map_err(ApiError::from)?;

        let complete = profile_complete(&profile);
        self.context.set_profile(profile);
        Ok(complete)
    }

    async fn complete(
        &self,
        principal: &Principal,
        path: &str,
        name: Option<&str>,
    ) -> Result<(), AuthError> {
        let request = ExchangeRequest {
            id_token: principal.id_token.expose_secret(),
            uid: &principal.uid,
            email: principal.email.as_str(),
            name,
        };
        let login: LegacyLogin = self
            .api
            .post(Backend::Legacy, path, &request)
            .await?
            .require_data()
            .map_err(ApiError::from)?;

        let mut session = Session::new(
            SecretString::from(login.token),
            login.admin.id.clone(),
            login.is_sub_admin,
        );
        session.profile = Some(login.admin);
        self.context.establish(session);

        if login.is_sub_admin {
            self.load_permissions().await;
        }
        self.load_v2_token(principal).await;
        Ok(())
    }

    /// Sub-admin grants. On failure the operator keeps an empty grant list.
    async fn load_permissions(&self) {
        match self
            .api
            .get::<Vec<Permission>>(Backend::Legacy, PERMISSIONS_PATH, &[])
            .await
        {
            Ok(payload) => {
                let permissions = payload.data.unwrap_or_default();
                info!(count = permissions.len(), "Loaded sub-admin permissions");
                self.context.set_permissions(permissions);
            }
            Err(err) => warn!(error = %err, "Failed to load sub-admin permissions"),
        }
    }

    async fn load_v2_token(&self, principal: &Principal) {
        let body = json!({ "idToken": principal.id_token.expose_secret() });
        let result = self
            .api
            .post::<V2Login, _>(Backend::V2, V2_LOGIN_PATH, &body)
            .await
            .and_then(|payload| payload.require_data().map_err(Into::into));

        match result {
            Ok(login) => self
                .context
                .set_v2_token(SecretString::from(login.access_token)),
            Err(err) => warn!(error = %err, "v2 login failed; v2 screens will be unavailable"),
        }
    }

    fn conclude(&self, result: Result<(), AuthError>, success: &str) -> Result<(), AuthError> {
        match result {
            Ok(()) => {
                self.notifier.success(success);
                info!(uid = ?self.context.reader().user_id(), "Operator signed in");
                Ok(())
            }
            Err(err) => {
                self.context.clear();
                self.identity.sign_out();
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }
}

fn check_credentials<'a>(
    email: &str,
    password: &'a SecretString,
) -> Result<(Email, &'a SecretString), AuthError> {
    let email = Email::parse(email)?;
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort);
    }
    Ok((email, password))
}

/// A profile is complete once it carries a name and an email.
fn profile_complete(profile: &AdminProfile) -> bool {
    let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    filled(&profile.name) && filled(&profile.email)
}
