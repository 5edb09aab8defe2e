//! Integration tests for the ChimaX admin console.
//!
//! Every test runs against a [`wiremock`] server standing in for the legacy
//! admin API, the v2 API and the identity provider at once; their paths do
//! not overlap (`/api/admin/...`, `/v1/...`, `/accounts:...`).
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p chimax-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `resource_collections` - List state and CRUD against the backend
//! - `request_headers` - Credentials attached to outbound requests
//! - `console_routes` - The HTTP console end to end, cookies included

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::time::Duration;

use chimax_admin::api::ApiClient;
use chimax_admin::config::{AdminConfig, ApiConfig, IdentityConfig};
use chimax_admin::notify::{self, NotificationFeed, Notifier};
use chimax_admin::routes;
use chimax_admin::session::SessionContext;
use chimax_admin::state::AppState;
use chimax_core::{AdminId, Session};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_KEY: &str = "tenant-key";
pub const IDENTITY_API_KEY: &str = "identity-key";
pub const OPERATOR_EMAIL: &str = "ops@zeolive.app";

/// Console configuration pointing every backend at `backend_uri`.
#[must_use]
pub fn test_config(backend_uri: &str) -> AdminConfig {
    AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_path: String::new(),
        public_url: "http://127.0.0.1".to_string(),
        api: ApiConfig {
            legacy_base_url: backend_uri.to_string(),
            v2_base_url: backend_uri.to_string(),
            tenant_key: SecretString::from(TENANT_KEY),
            timeout: Duration::from_secs(5),
        },
        identity: IdentityConfig {
            base_url: backend_uri.to_string(),
            api_key: SecretString::from(IDENTITY_API_KEY),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A signed-in operator talking to the mocked backend without HTTP in between.
pub struct Operator {
    pub context: SessionContext,
    pub api: ApiClient,
    pub notifier: Notifier,
    pub feed: NotificationFeed,
}

impl Operator {
    /// Super admin holding `token`.
    #[must_use]
    pub fn signed_in(backend: &MockServer, token: &str) -> Self {
        let context = SessionContext::with_session(Session::new(
            SecretString::from(token.to_string()),
            AdminId::new("admin-1"),
            false,
        ));
        let api = ApiClient::new(&test_config(&backend.uri()).api)
            .unwrap()
            .with_session(context.reader());
        let (notifier, feed) = notify::channel();
        Self {
            context,
            api,
            notifier,
            feed,
        }
    }
}

/// The console served on an ephemeral port, with a cookie-keeping client.
pub struct TestConsole {
    pub backend: MockServer,
    pub client: reqwest::Client,
    addr: SocketAddr,
}

impl TestConsole {
    pub async fn start() -> Self {
        let backend = MockServer::start().await;
        let state = AppState::new(test_config(&backend.uri())).unwrap();
        let app = routes::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            backend,
            client,
            addr,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Mount the full sign-in exchange: identity provider, legacy login,
    /// sub-admin permissions and the v2 token.
    pub async fn mount_sign_in(&self, is_sub_admin: bool, permissions: Value) {
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": "fb-1",
                "email": OPERATOR_EMAIL,
                "idToken": "id-token",
                "expiresIn": "3600"
            })))
            .mount(&self.backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/admin/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": {
                    "token": "legacy-token",
                    "admin": {"_id": "admin-1", "name": "Ops", "email": OPERATOR_EMAIL},
                    "isSubAdmin": is_sub_admin
                }
            })))
            .mount(&self.backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/admin/subadmin/permissions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": true, "data": permissions})),
            )
            .mount(&self.backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/admin/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"accessToken": "v2-token"}
            })))
            .mount(&self.backend)
            .await;
    }

    /// Sign in through `POST /login`; the client keeps the session cookie.
    pub async fn sign_in(&self) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({"email": OPERATOR_EMAIL, "password": "hunter22"}))
            .send()
            .await
            .unwrap()
    }
}
