//! Authentication route handlers.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use chimax_core::{Access, AdminId, AdminProfile, Email, Entity, Permission, ResourceConfig};
use chimax_core::entities::{
    Banner, CoinPlan, Commission, Gift, Hashtag, Host, HostApplication, ReferralTier,
    ReportReason, SubAdmin, Ticket, Transaction,
};

use super::{Console, ConsoleResponse};
use crate::auth::AuthError;
use crate::error::{AppError, auth_status};
use crate::identity::IdentityProvider;
use crate::middleware::RequireSession;
use crate::session::SessionReader;
use crate::state::AppState;

/// Every collection the console manages, in menu order.
pub const RESOURCES: [ResourceConfig; 12] = [
    Host::RESOURCE,
    HostApplication::RESOURCE,
    SubAdmin::RESOURCE,
    Ticket::RESOURCE,
    CoinPlan::RESOURCE,
    Commission::RESOURCE,
    ReferralTier::RESOURCE,
    Transaction::RESOURCE,
    Hashtag::RESOURCE,
    ReportReason::RESOURCE,
    Gift::RESOURCE,
    Banner::RESOURCE,
];

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// What the console knows about the signed-in operator.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user_id: AdminId,
    pub is_sub_admin: bool,
    pub permissions: Vec<Permission>,
    pub profile: Option<AdminProfile>,
    /// Whether v2 screens are usable.
    pub v2_enabled: bool,
    pub email: Option<Email>,
}

#[derive(Debug, Serialize)]
pub struct ResourceEntry {
    pub name: &'static str,
    pub label: &'static str,
    pub read_only: bool,
    pub access: Access,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/", get(dashboard))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/forgot-password", post(forgot_password))
        .route("/logout", post(logout))
        .route("/session", get(current_session))
}

/// Liveness health check.
///
/// GET /health
async fn health() -> &'static str {
    "ok"
}

fn session_view(console: &Console) -> Option<SessionView> {
    let session = console.auth().reader().snapshot()?;
    Some(SessionView {
        user_id: session.user_id,
        is_sub_admin: session.is_sub_admin,
        permissions: session.permissions,
        profile: session.profile,
        v2_enabled: session.v2_access_token.is_some(),
        email: console.auth().identity().current().map(|p| p.email),
    })
}

/// Persist the outcome of an auth flow and report it.
async fn conclude(
    mut console: Console,
    store: &Session,
    result: Result<(), AuthError>,
    success: StatusCode,
) -> Result<Response, AppError> {
    console.save(store).await?;
    let view = session_view(&console);
    let access = if view.is_some() {
        Access::FULL
    } else {
        Access::NONE
    };

    let status = match result {
        Ok(()) => success,
        Err(err) => auth_status(&err),
    };
    let body = ConsoleResponse {
        state: view,
        notifications: console.drain(),
        access,
        errors: None,
    };
    Ok((status, Json(body)).into_response())
}

/// Sign in with email and password.
///
/// POST /login
async fn login(
    console: Console,
    store: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let result = console.auth().login(&req.email, &req.password).await;
    if result.is_ok() {
        store.cycle_id().await?;
    }
    conclude(console, &store, result, StatusCode::OK).await
}

/// Create an operator account.
///
/// POST /register
async fn register(
    console: Console,
    store: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let result = console
        .auth()
        .register(&req.email, &req.password, &req.name)
        .await;
    if result.is_ok() {
        store.cycle_id().await?;
    }
    conclude(console, &store, result, StatusCode::CREATED).await
}

/// Email a password reset link.
///
/// POST /forgot-password
async fn forgot_password(
    console: Console,
    store: Session,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Response, AppError> {
    let result = console.auth().request_password_reset(&req.email).await;
    conclude(console, &store, result, StatusCode::OK).await
}

/// Sign out and clear the session.
///
/// POST /logout
async fn logout(console: Console, store: Session) -> Result<Response, AppError> {
    console.auth().logout();
    conclude(console, &store, Ok(()), StatusCode::OK).await
}

/// Current session.
///
/// GET /session
async fn current_session(
    RequireSession(_): RequireSession,
    console: Console,
    store: Session,
) -> Result<Response, AppError> {
    conclude(console, &store, Ok(()), StatusCode::OK).await
}

/// Resources the operator may see, with their access.
///
/// GET /
async fn dashboard(RequireSession(reader): RequireSession) -> Json<Vec<ResourceEntry>> {
    Json(visible_resources(&reader))
}

fn visible_resources(reader: &SessionReader) -> Vec<ResourceEntry> {
    RESOURCES
        .iter()
        .map(|config| ResourceEntry {
            name: config.name,
            label: config.label,
            read_only: config.read_only,
            access: reader.access(config.section),
        })
        .filter(|entry| entry.access.can_view)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chimax_core::Session as AdminSession;

    use crate::session::SessionContext;

    #[test]
    fn test_resource_names_are_unique() {
        let mut names: Vec<_> = RESOURCES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RESOURCES.len());
    }

    #[test]
    fn test_sub_admin_sees_only_granted_sections() {
        let mut session = AdminSession::new(SecretString::from("t"), AdminId::new("s1"), true);
        session.permissions = vec![Permission {
            section: "hashtags".to_string(),
            can_view: true,
            can_edit: false,
        }];
        let context = SessionContext::with_session(session);

        let visible = visible_resources(&context.reader());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "hashtags");
        assert!(!visible[0].access.can_edit);
    }

    #[test]
    fn test_super_admin_sees_everything() {
        let session = AdminSession::new(SecretString::from("t"), AdminId::new("a1"), false);
        let context = SessionContext::with_session(session);
        assert_eq!(visible_resources(&context.reader()).len(), RESOURCES.len());
    }
}
