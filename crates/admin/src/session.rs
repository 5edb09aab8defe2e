//! Injected session context.
//!
//! [`SessionContext`] is the only writer of the operator's credentials and is
//! owned by the auth flow. Everything else (request construction, guards,
//! permission checks) receives a [`SessionReader`], which always observes the
//! latest value: a token replaced mid-session is visible on the next read.
//!
//! Between requests the credentials live in the per-browser tower-sessions
//! store under the keys in [`chimax_core::session_keys`].

use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use chimax_core::{Access, AdminId, AdminProfile, Permission, Session, session_keys};

type Slot = Arc<RwLock<Option<Session>>>;

/// Single writer of the session credentials.
///
/// Deliberately not `Clone`: hand out [`SessionReader`]s instead.
#[derive(Debug, Default)]
pub struct SessionContext {
    slot: Slot,
}

/// Read-only view of a [`SessionContext`].
#[derive(Debug, Clone, Default)]
pub struct SessionReader {
    slot: Slot,
}

impl SessionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context already holding a session.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(session))),
        }
    }

    /// Get a reader that follows every later write.
    #[must_use]
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Replace the held session.
    pub fn establish(&self, session: Session) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Apply a change to the held session; no-op when signed out.
    fn update(&self, apply: impl FnOnce(&mut Session)) {
        if let Some(session) = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            apply(session);
        }
    }

    /// Store the v2 backend token.
    pub fn set_v2_token(&self, token: SecretString) {
        self.update(|session| session.v2_access_token = Some(token));
    }

    /// Replace sub-admin permission grants.
    pub fn set_permissions(&self, permissions: Vec<Permission>) {
        self.update(|session| session.permissions = permissions);
    }

    /// Replace the cached admin profile.
    pub fn set_profile(&self, profile: AdminProfile) {
        self.update(|session| session.profile = Some(profile));
    }

    /// Drop every credential.
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Write the current credentials into the browser's session store.
    ///
    /// A cleared context removes every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn persist(
        &self,
        store: &tower_sessions::Session,
    ) -> Result<(), tower_sessions::session::Error> {
        let Some(session) = self.reader().snapshot() else {
            return Self::forget(store).await;
        };

        store
            .insert(
                session_keys::ADMIN_TOKEN,
                session.access_token.expose_secret(),
            )
            .await?;
        store
            .insert(session_keys::UID, session.user_id.as_str())
            .await?;
        store
            .insert(session_keys::IS_SUB_ADMIN, session.is_sub_admin)
            .await?;
        store
            .insert(session_keys::SUBADMIN, &session.permissions)
            .await?;
        match &session.profile {
            Some(profile) => store.insert(session_keys::USER, profile).await?,
            None => {
                store.remove_value(session_keys::USER).await?;
            }
        }
        match &session.v2_access_token {
            Some(token) => {
                store
                    .insert(session_keys::V2_ACCESS_TOKEN, token.expose_secret())
                    .await?;
            }
            None => {
                store.remove_value(session_keys::V2_ACCESS_TOKEN).await?;
            }
        }
        Ok(())
    }

    /// Remove every credential key from the browser's session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn forget(store: &tower_sessions::Session) -> Result<(), tower_sessions::session::Error> {
        for key in session_keys::ALL {
            store.remove_value(key).await?;
        }
        Ok(())
    }

    /// Rebuild a context from the browser's session store.
    ///
    /// Missing token or uid yields an empty context.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn restore(
        store: &tower_sessions::Session,
    ) -> Result<Self, tower_sessions::session::Error> {
        let token: Option<String> = store.get(session_keys::ADMIN_TOKEN).await?;
        let uid: Option<String> = store.get(session_keys::UID).await?;

        let (Some(token), Some(uid)) = (token, uid) else {
            return Ok(Self::new());
        };

        let is_sub_admin: bool = store
            .get(session_keys::IS_SUB_ADMIN)
            .await?
            .unwrap_or(false);
        let mut session = Session::new(SecretString::from(token), AdminId::new(uid), is_sub_admin);
        session.permissions = store.get(session_keys::SUBADMIN).await?.unwrap_or_default();
        session.profile = store.get::<AdminProfile>(session_keys::USER).await?;
        session.v2_access_token = store
            .get::<String>(session_keys::V2_ACCESS_TOKEN)
            .await?
            .map(SecretString::from);

        Ok(Self::with_session(session))
    }
}

impl SessionReader {
    /// A reader that will never see a session.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Session>) -> T) -> T {
        f(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref())
    }

    /// Clone of the current session, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Session> {
        self.read(|session| session.cloned())
    }

    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read(|session| session.map(|s| s.access_token.clone()))
    }

    #[must_use]
    pub fn v2_access_token(&self) -> Option<SecretString> {
        self.read(|session| session.and_then(|s| s.v2_access_token.clone()))
    }

    #[must_use]
    pub fn user_id(&self) -> Option<AdminId> {
        self.read(|session| session.map(|s| s.user_id.clone()))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read(|session| session.is_some())
    }

    /// Access to a console section; nothing when signed out.
    #[must_use]
    pub fn access(&self, section: &str) -> Access {
        self.read(|session| session.map_or(Access::NONE, |s| s.access(section)))
    }
}

#[derive(Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

/// Expiry of a JWT bearer token, read from its unverified payload.
///
/// Returns `None` for opaque tokens or tokens without an `exp` claim; the
/// backend remains the authority on validity.
#[must_use]
pub fn token_expiry(token: &SecretString) -> Option<DateTime<Utc>> {
    let payload = token.expose_secret().split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Whether a session's legacy token has a past `exp` claim.
#[must_use]
pub fn is_expired(session: &Session) -> bool {
    token_expiry(&session.access_token).is_some_and(|expiry| expiry <= Utc::now())
}
