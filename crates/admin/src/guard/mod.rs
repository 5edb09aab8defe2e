//! Auth guard.
//!
//! One guard implementation consults a [`RouteTable`] to decide whether a
//! path is public, auth-only, or protected, and which credentials prove
//! sign-in for it. [`AuthGuard`] is the per-mount state machine and
//! [`MountedGuard`] keeps one alive while its subtree renders; the axum
//! integration lives in [`crate::middleware::auth`].

mod mounted;
mod routes;
mod subscription;

pub use mounted::MountedGuard;
pub use routes::{CredentialSource, RouteClass, RouteTable};
pub use subscription::GuardSubscription;

use serde::Serialize;
use tracing::debug;

use chimax_core::Session;

use crate::identity::Principal;
use crate::session::is_expired;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Checking,
    Authenticated,
    Unauthenticated,
}

/// What the caller should do with the guarded subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(String),
    /// Do not render; a redirect was already issued for this mount.
    Withhold,
}

/// Everything the guard may consult, gathered by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evidence<'a> {
    pub session: Option<&'a Session>,
    pub principal: Option<&'a Principal>,
    /// Backend verdict on the admin profile; `None` when not checked.
    pub profile_complete: Option<bool>,
}

impl Evidence<'_> {
    fn session_valid(&self) -> bool {
        self.session.is_some_and(|session| !is_expired(session))
    }

    fn principal_active(&self) -> bool {
        self.principal.is_some_and(|principal| !principal.is_expired())
    }

    /// Whether these credentials satisfy `source`. Missing evidence fails.
    #[must_use]
    pub fn satisfies(&self, source: CredentialSource) -> bool {
        match source {
            CredentialSource::Session => self.session_valid(),
            CredentialSource::IdentityProvider => self.session_valid() && self.principal_active(),
            CredentialSource::IdentityProviderAndProfile => {
                self.session_valid()
                    && self.principal_active()
                    && self.profile_complete == Some(true)
            }
        }
    }
}

/// Guard for one mounted path.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    routes: RouteTable,
    state: GuardState,
    path: String,
    class: RouteClass,
    redirected: bool,
}

impl AuthGuard {
    #[must_use]
    pub const fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            state: GuardState::Checking,
            path: String::new(),
            class: RouteClass::Protected(CredentialSource::Session),
            redirected: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    #[must_use]
    pub const fn class(&self) -> RouteClass {
        self.class
    }

    /// Start guarding `path` and decide immediately.
    pub fn mount(&mut self, path: &str, evidence: &Evidence<'_>) -> GuardDecision {
        self.state = GuardState::Checking;
        self.redirected = false;
        self.path = path.to_string();
        self.class = self.routes.classify(path);
        self.evaluate(evidence)
    }

    /// Re-evaluate after the provider published a principal change.
    ///
    /// A transition out of `Authenticated` issues a fresh redirect.
    pub fn on_principal_change(&mut self, evidence: &Evidence<'_>) -> GuardDecision {
        let before = self.state;
        let decision = self.evaluate(evidence);
        if before != self.state && matches!(decision, GuardDecision::Withhold) {
            self.redirected = false;
            return self.evaluate(evidence);
        }
        decision
    }

    fn evaluate(&mut self, evidence: &Evidence<'_>) -> GuardDecision {
        let decision = match self.class {
            RouteClass::Public => {
                self.state = if evidence.satisfies(CredentialSource::Session) {
                    GuardState::Authenticated
                } else {
                    GuardState::Unauthenticated
                };
                GuardDecision::Render
            }
            RouteClass::AuthOnly => {
                if evidence.satisfies(CredentialSource::IdentityProvider) {
                    self.state = GuardState::Authenticated;
                    self.redirect(self.routes.home())
                } else {
                    self.state = GuardState::Unauthenticated;
                    GuardDecision::Render
                }
            }
            RouteClass::Protected(source) => {
                if evidence.satisfies(source) {
                    self.state = GuardState::Authenticated;
                    GuardDecision::Render
                } else {
                    self.state = GuardState::Unauthenticated;
                    self.redirect(self.routes.login_redirect(&self.path))
                }
            }
        };
        debug!(path = %self.path, state = ?self.state, decision = ?decision, "Guard evaluated");
        decision
    }

    fn redirect(&mut self, target: String) -> GuardDecision {
        if self.redirected {
            return GuardDecision::Withhold;
        }
        self.redirected = true;
        GuardDecision::Redirect(target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use secrecy::SecretString;

    use chimax_core::{AdminId, Email};

    use super::*;

    fn session() -> Session {
        Session::new(SecretString::from("opaque"), AdminId::new("a1"), false)
    }

    fn principal() -> Principal {
        Principal {
            uid: "fb-1".to_string(),
            email: Email::parse("ops@zeolive.app").unwrap(),
            id_token: SecretString::from("id"),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn guard() -> AuthGuard {
        AuthGuard::new(RouteTable::console_default())
    }

    #[test]
    fn test_no_credential_redirects_once_to_login() {
        let mut guard = guard();
        let evidence = Evidence::default();

        let first = guard.mount("/api/hosts", &evidence);
        assert_eq!(
            first,
            GuardDecision::Redirect("/login?return_to=%2Fapi%2Fhosts".to_string())
        );
        assert_eq!(guard.state(), GuardState::Unauthenticated);

        // Further evaluations of the same mount never redirect again.
        assert_eq!(
            guard.on_principal_change(&evidence),
            GuardDecision::Withhold
        );
    }

    #[test]
    fn test_session_renders_protected_route() {
        let session = session();
        let mut guard = guard();
        let evidence = Evidence {
            session: Some(&session),
            ..Evidence::default()
        };
        assert_eq!(guard.mount("/api/hashtags", &evidence), GuardDecision::Render);
        assert_eq!(guard.state(), GuardState::Authenticated);
    }

    #[test]
    fn test_auth_only_redirects_signed_in_operator_away() {
        let session = session();
        let principal = principal();
        let mut guard = guard();
        let evidence = Evidence {
            session: Some(&session),
            principal: Some(&principal),
            profile_complete: None,
        };
        assert_eq!(
            guard.mount("/login", &evidence),
            GuardDecision::Redirect("/".to_string())
        );
    }

    #[test]
    fn test_auth_only_renders_without_principal() {
        let session = session();
        let mut guard = guard();
        let evidence = Evidence {
            session: Some(&session),
            ..Evidence::default()
        };
        assert_eq!(guard.mount("/login", &evidence), GuardDecision::Render);
    }

    #[test]
    fn test_profile_zone_fails_closed() {
        let session = session();
        let principal = principal();
        let mut guard = guard();
        let unchecked = Evidence {
            session: Some(&session),
            principal: Some(&principal),
            profile_complete: None,
        };
        assert!(matches!(
            guard.mount("/api/transactions", &unchecked),
            GuardDecision::Redirect(_)
        ));

        let complete = Evidence {
            profile_complete: Some(true),
            ..unchecked
        };
        assert_eq!(
            guard.mount("/api/transactions", &complete),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_expired_token_is_unauthenticated() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1000}"#);
        let session = Session::new(
            SecretString::from(format!("h.{payload}.s")),
            AdminId::new("a1"),
            false,
        );
        let mut guard = guard();
        let evidence = Evidence {
            session: Some(&session),
            ..Evidence::default()
        };
        assert!(matches!(
            guard.mount("/api/hosts", &evidence),
            GuardDecision::Redirect(_)
        ));
    }

    #[test]
    fn test_sign_out_issues_fresh_redirect() {
        let session = session();
        let principal = principal();
        let mut guard = guard();
        let signed_in = Evidence {
            session: Some(&session),
            principal: Some(&principal),
            profile_complete: None,
        };
        assert_eq!(guard.mount("/api/tickets", &signed_in), GuardDecision::Render);

        let signed_out = Evidence {
            principal: None,
            ..signed_in
        };
        assert_eq!(
            guard.on_principal_change(&signed_out),
            GuardDecision::Redirect("/login?return_to=%2Fapi%2Ftickets".to_string())
        );
        assert_eq!(guard.state(), GuardState::Unauthenticated);
        assert_eq!(
            guard.on_principal_change(&signed_out),
            GuardDecision::Withhold
        );
    }
}
