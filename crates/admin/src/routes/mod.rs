//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check (public)
//! GET  /                             - Dashboard: resources and access
//!
//! # Auth
//! POST /login                        - Email/password sign-in (auth-only)
//! POST /register                     - Create account (auth-only)
//! POST /forgot-password              - Send reset email (auth-only)
//! POST /logout                       - Sign out
//! GET  /session                      - Current session
//!
//! # Resources (one generic router per entity)
//! GET    /api/{name}                 - Fetch a page
//! GET    /api/{name}/more            - Append the next page
//! POST   /api/{name}/retry           - Re-run the last fetch
//! POST   /api/{name}                 - Create
//! PATCH  /api/{name}/{id}            - Update
//! DELETE /api/{name}/{id}            - Delete
//! POST   /api/{name}/{id}/toggle/{field} - Flip a boolean
//! ```
//!
//! Every handler extracts the operator's [`Console`] from the browser
//! session, runs one operation, persists whatever changed, and returns the
//! toasts raised along the way.

pub mod auth;
pub mod resources;

use axum::{
    Router,
    extract::FromRequestParts,
    http::{Request, request::Parts},
    response::Response,
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::Session;
use tracing::Span;

use chimax_core::{Access, ValidationErrors};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::identity::{IdentityProvider, IdentityToolkit, Principal};
use crate::middleware::{create_session_layer, guard_middleware, request_id_middleware};
use crate::notify::{self, Notification, NotificationFeed, Notifier};
use crate::session::SessionContext;
use crate::state::AppState;

/// JSON body returned by console endpoints.
#[derive(Debug, Serialize)]
pub struct ConsoleResponse<T: Serialize> {
    pub state: T,
    pub notifications: Vec<Notification>,
    pub access: Access,
    /// Form errors; present only when client-side checks failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

/// One operator's console for the duration of a request.
pub struct Console {
    auth: AuthService<IdentityToolkit>,
    notifier: Notifier,
    feed: NotificationFeed,
}

impl Console {
    /// Restore credentials and principal from the browser session.
    ///
    /// `identity` is the provider the auth guard is watching; without one
    /// the console gets a private channel seeded from the stored principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn open(
        state: &AppState,
        store: &Session,
        identity: Option<IdentityToolkit>,
    ) -> Result<Self, AppError> {
        let context = SessionContext::restore(store).await?;
        let identity = match identity {
            Some(identity) => identity,
            None => state
                .identity()
                .for_principal(Principal::restore(store).await?),
        };
        let (notifier, feed) = notify::channel();
        let auth = AuthService::new(state.api(), identity, context, notifier.clone());
        Ok(Self {
            auth,
            notifier,
            feed,
        })
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthService<IdentityToolkit> {
        &self.auth
    }

    #[must_use]
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Write credentials and principal back to the browser session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn save(&self, store: &Session) -> Result<(), AppError> {
        self.auth.context().persist(store).await?;
        match self.auth.identity().current() {
            Some(principal) => principal.persist(store).await?,
            None => Principal::forget(store).await?,
        }
        Ok(())
    }

    /// Drop credentials after a backend 401 and persist the sign-out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn invalidate(&self, store: &Session) -> Result<(), AppError> {
        self.auth.invalidate();
        self.save(store).await
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.feed.drain()
    }
}

impl FromRequestParts<AppState> for Console {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let store = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;
        let identity = parts.extensions.get::<IdentityToolkit>().cloned();
        Self::open(state, &store, identity).await
    }
}

/// Build the console router with its full middleware stack.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let console = Router::new()
        .merge(auth::router())
        .merge(resources::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            guard_middleware,
        ))
        .layer(create_session_layer(state.config()))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state.clone());

    let base_path = &state.config().base_path;
    if base_path.is_empty() {
        console
    } else {
        Router::new().nest(base_path, console)
    }
}
