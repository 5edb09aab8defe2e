//! HTTP request layer for both backend generations.
//!
//! Every call reads credentials from the injected [`SessionReader`] at the
//! moment the request is built, so a token replaced mid-session is used by
//! the very next request. Responses are parsed into the backend envelope
//! exactly once and surfaced as `Result<Payload<T>, ApiError>`.

mod error;

pub use error::ApiError;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};
use url::Url;

use chimax_core::{Backend, Envelope, Payload};

use crate::config::ApiConfig;
use crate::session::SessionReader;

/// Header carrying the tenant key on legacy requests.
pub const TENANT_KEY_HEADER: &str = "key";

/// Header carrying the acting admin's id on legacy requests.
pub const ADMIN_UID_HEADER: &str = "x-admin-uid";

/// Message used when a failed response carries no readable explanation.
const GENERIC_STATUS_MESSAGE: &str = "Request failed, please try again";

/// Client for the legacy (`/api/admin/...`) and v2 (`/v1/...`) backends.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    session: SessionReader,
}

struct ApiClientInner {
    client: reqwest::Client,
    legacy_base_url: String,
    v2_base_url: String,
    tenant_key: SecretString,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("legacy_base_url", &self.inner.legacy_base_url)
            .field("v2_base_url", &self.inner.v2_base_url)
            .field("tenant_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Body shape of non-2xx responses; either field may carry the reason.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiClient {
    /// Create a client with no session bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                legacy_base_url: config.legacy_base_url.clone(),
                v2_base_url: config.v2_base_url.clone(),
                tenant_key: config.tenant_key.clone(),
            }),
            session: SessionReader::detached(),
        })
    }

    /// Same client, reading credentials from another session.
    #[must_use]
    pub fn with_session(&self, session: SessionReader) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            session,
        }
    }

    /// The session this client reads credentials from.
    #[must_use]
    pub const fn session(&self) -> &SessionReader {
        &self.session
    }

    /// Build the auth headers for a request, reading the session now.
    ///
    /// Missing credentials omit their header rather than failing.
    #[must_use]
    pub fn headers(&self, backend: Backend) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match backend {
            Backend::Legacy => {
                if let Some(token) = self.session.access_token() {
                    insert_header(&mut headers, AUTHORIZATION, &bearer(&token));
                }
                insert_header(
                    &mut headers,
                    HeaderName::from_static(TENANT_KEY_HEADER),
                    self.inner.tenant_key.expose_secret(),
                );
                if let Some(uid) = self.session.user_id() {
                    insert_header(
                        &mut headers,
                        HeaderName::from_static(ADMIN_UID_HEADER),
                        uid.as_str(),
                    );
                }
            }
            Backend::V2 => {
                if let Some(token) = self.session.v2_access_token() {
                    insert_header(&mut headers, AUTHORIZATION, &bearer(&token));
                }
            }
        }

        headers
    }

    /// Resolve a backend path (and optional query) to a full URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not parse.
    pub fn url(
        &self,
        backend: Backend,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, ApiError> {
        let base = match backend {
            Backend::Legacy => &self.inner.legacy_base_url,
            Backend::V2 => &self.inner.v2_base_url,
        };
        let mut url =
            Url::parse(&format!("{base}{path}")).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// `GET` a backend path.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, logical
    /// failure, or an undecodable body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Payload<T>, ApiError> {
        self.send(backend, Method::GET, path, query, None::<&()>)
            .await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<T, B>(&self, backend: Backend, path: &str, body: &B) -> Result<Payload<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(backend, Method::POST, path, &[], Some(body)).await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<T, B>(&self, backend: Backend, path: &str, body: &B) -> Result<Payload<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(backend, Method::PATCH, path, &[], Some(body)).await
    }

    /// `DELETE` a backend path.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
    ) -> Result<Payload<T>, ApiError> {
        self.send(backend, Method::DELETE, path, &[], None::<&()>)
            .await
    }

    #[instrument(skip(self, query, body), fields(backend = ?backend, method = %method))]
    async fn send<T, B>(
        &self,
        backend: Backend,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Payload<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(backend, path, query)?;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .headers(self.headers(backend));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(path, "Backend rejected credentials");
            return Err(ApiError::Unauthorized);
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message.or(body.error))
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| GENERIC_STATUS_MESSAGE.to_string());
            warn!(path, status = status.as_u16(), %message, "Backend request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let payload = envelope.into_result::<T>()?;

        debug!(path, total = ?payload.total, "Backend request succeeded");
        Ok(payload)
    }
}

fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, "Skipping header with invalid characters"),
    }
}
