//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::AdminConfig;
use crate::guard::RouteTable;
use crate::identity::{IdentityError, IdentityToolkit};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build backend client: {0}")]
    Api(#[from] ApiError),
    #[error("Failed to build identity client: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// Holds only process-wide pieces; every operator's credentials live in
/// their own browser session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: ApiClient,
    identity: IdentityToolkit,
    routes: RouteTable,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("api", &self.inner.api)
            .field("identity", &self.inner.identity)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: AdminConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.api)?;
        let identity = IdentityToolkit::new(&config.identity, config.api.timeout)?;
        let routes = RouteTable::console_default().with_base_path(&config.base_path);
        Ok(Self::from_parts(config, api, identity, routes))
    }

    /// Assemble state from prebuilt parts.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        api: ApiClient,
        identity: IdentityToolkit,
        routes: RouteTable,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                identity,
                routes,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Backend client with no session bound.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Identity client with no principal bound.
    #[must_use]
    pub fn identity(&self) -> &IdentityToolkit {
        &self.inner.identity
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }
}
