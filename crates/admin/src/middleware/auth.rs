//! Auth guard middleware and extractors for the console.
//!
//! [`guard_middleware`] runs the [`AuthGuard`] for every request: it
//! restores the operator's credentials from the browser session, gathers
//! the evidence the route's credential source needs, and either lets the
//! request through with a [`SessionReader`] attached or answers with a
//! redirect (screens) or 401 (`/api/` paths).
//!
//! A rendered request keeps its guard mounted until the handler returns.
//! The handler's [`IdentityToolkit`] shares the guard's principal channel,
//! so a sign-out published mid-request clears the held credentials and
//! turns the response into the guard's redirect.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::auth::{AuthError, AuthService};
use crate::api::ApiError;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::guard::{AuthGuard, CredentialSource, Evidence, GuardDecision, MountedGuard, RouteClass};
use crate::identity::{IdentityToolkit, Principal};
use crate::notify::Notifier;
use crate::session::{SessionContext, SessionReader, is_expired};
use crate::state::AppState;

/// Error returned when the guard refuses a request.
#[derive(Debug)]
pub enum GuardRejection {
    /// Send the browser elsewhere (screens).
    Redirect(String),
    /// Unauthorized response (API requests), with the login target.
    Unauthorized(Option<String>),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(target) => Redirect::to(&target).into_response(),
            Self::Unauthorized(redirect) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Not signed in", "redirect": redirect })),
            )
                .into_response(),
        }
    }
}

fn is_api(path: &str) -> bool {
    path.starts_with("/api/")
}

fn reject(path: &str, target: String) -> Response {
    if is_api(path) {
        GuardRejection::Unauthorized(Some(target)).into_response()
    } else {
        GuardRejection::Redirect(target).into_response()
    }
}

/// Gate every request behind the route table.
///
/// # Errors
///
/// Returns `AppError::Session` if the browser session store fails.
pub async fn guard_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let class = state.routes().classify(&path);

    let context = SessionContext::restore(&session).await?;
    let principal = Principal::restore(&session).await?;

    // An expired backend token is as good as none; drop it.
    if context.reader().snapshot().is_some_and(|s| is_expired(&s)) {
        debug!("Clearing expired session token");
        context.clear();
        SessionContext::forget(&session).await?;
    }

    let identity = state.identity().for_principal(principal.clone());
    let auth = AuthService::new(
        state.api(),
        identity.clone(),
        context,
        Notifier::discard(),
    );

    let profile_complete = if class
        == RouteClass::Protected(CredentialSource::IdentityProviderAndProfile)
        && auth.reader().is_authenticated()
        && principal.is_some()
    {
        Some(check_profile(&auth, &session).await?)
    } else {
        None
    };

    let snapshot = auth.reader().snapshot();
    let evidence = Evidence {
        session: snapshot.as_ref(),
        principal: principal.as_ref(),
        profile_complete,
    };

    let mut guard = AuthGuard::new(state.routes().clone());
    match guard.mount(&path, &evidence) {
        GuardDecision::Render => {
            match &snapshot {
                Some(current) => set_sentry_user(&current.user_id, current.is_sub_admin),
                None => clear_sentry_user(),
            }
            let mounted =
                MountedGuard::mount(guard, auth.into_context(), profile_complete, identity.watch());
            request.extensions_mut().insert(mounted.reader());
            request.extensions_mut().insert(identity);

            let response = next.run(request).await;
            match mounted.unmount() {
                None => Ok(response),
                Some(target) => {
                    debug!(%path, %target, "Guard redirect after sign-out");
                    SessionContext::forget(&session).await?;
                    Principal::forget(&session).await?;
                    clear_sentry_user();
                    Ok(reject(&path, target))
                }
            }
        }
        GuardDecision::Redirect(target) => {
            debug!(%path, %target, "Guard redirect");
            Ok(reject(&path, target))
        }
        GuardDecision::Withhold => Ok(GuardRejection::Unauthorized(None).into_response()),
    }
}

/// Backend profile check; any failure counts as incomplete.
async fn check_profile<P: crate::identity::IdentityProvider>(
    auth: &AuthService<P>,
    session: &Session,
) -> Result<bool, AppError> {
    match auth.verify_profile().await {
        Ok(complete) => {
            auth.context().persist(session).await?;
            Ok(complete)
        }
        Err(AuthError::Api(ApiError::Unauthorized)) => {
            auth.invalidate();
            auth.context().persist(session).await?;
            Principal::forget(session).await?;
            Ok(false)
        }
        Err(err) => {
            warn!(error = %err, "Profile verification failed");
            Ok(false)
        }
    }
}

/// Extractor for the session the guard attached.
///
/// Only routes behind [`guard_middleware`] carry one; anywhere else this
/// rejects with 401.
pub struct RequireSession(pub SessionReader);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionReader>()
            .filter(|reader| reader.is_authenticated())
            .cloned()
            .map(Self)
            .ok_or(GuardRejection::Unauthorized(None))
    }
}
