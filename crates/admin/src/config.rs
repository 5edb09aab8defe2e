//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TENANT_API_KEY` - Shared tenant key sent to the legacy backend (`key` header)
//! - `IDENTITY_API_KEY` - Identity provider project API key
//!
//! ## Optional
//! - `CONSOLE_HOST` - Bind address (default: 127.0.0.1)
//! - `CONSOLE_PORT` - Listen port (default: 3001)
//! - `CONSOLE_BASE_PATH` - Prefix when served behind a reverse proxy (default: none)
//! - `CONSOLE_PUBLIC_URL` - Public URL, decides secure cookies (default: `http://127.0.0.1:3001`)
//! - `LEGACY_API_URL` - Legacy admin backend (default: `http://localhost:5000`)
//! - `V2_API_URL` - v2 backend (default: `http://localhost:8000`)
//! - `IDENTITY_API_URL` - Identity provider REST base (default: Identity Toolkit v1)
//! - `REQUEST_TIMEOUT_SECS` - Outbound request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - 0.0 to 1.0 (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_LEGACY_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_V2_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_IDENTITY_API_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Values that show up when an `.env` template was never filled in.
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx", "todo"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Reverse-proxy prefix, empty or `/segment` without trailing slash
    pub base_path: String,
    /// Public URL of the console
    pub public_url: String,
    /// Backend endpoints and tenant credentials
    pub api: ApiConfig,
    /// Identity provider settings
    pub identity: IdentityConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Backend configuration shared by every outbound request.
///
/// Implements `Debug` manually to redact the tenant key.
#[derive(Clone)]
pub struct ApiConfig {
    /// Legacy admin API base (serves `/api/admin/...`)
    pub legacy_base_url: String,
    /// v2 API base (serves `/v1/...`)
    pub v2_base_url: String,
    /// Shared tenant key for the legacy API
    pub tenant_key: SecretString,
    /// Client-side timeout for every request
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("legacy_base_url", &self.legacy_base_url)
            .field("v2_base_url", &self.v2_base_url)
            .field("tenant_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// REST base of the provider (`.../v1`)
    pub base_url: String,
    /// Project API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, URLs or
    /// numbers fail to parse, or a secret is still a template placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CONSOLE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONSOLE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CONSOLE_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONSOLE_PORT".to_string(), e.to_string()))?;
        let base_path = normalize_base_path(&get_env_or_default("CONSOLE_BASE_PATH", ""))?;
        let public_url = validated_url(
            "CONSOLE_PUBLIC_URL",
            &get_env_or_default("CONSOLE_PUBLIC_URL", "http://127.0.0.1:3001"),
        )?;

        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_path,
            public_url,
            api: ApiConfig::from_env()?,
            identity: IdentityConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default(
            "REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            legacy_base_url: validated_url(
                "LEGACY_API_URL",
                &get_env_or_default("LEGACY_API_URL", DEFAULT_LEGACY_API_URL),
            )?,
            v2_base_url: validated_url(
                "V2_API_URL",
                &get_env_or_default("V2_API_URL", DEFAULT_V2_API_URL),
            )?,
            tenant_key: get_validated_secret("TENANT_API_KEY")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: validated_url(
                "IDENTITY_API_URL",
                &get_env_or_default("IDENTITY_API_URL", DEFAULT_IDENTITY_API_URL),
            )?,
            api_key: get_validated_secret("IDENTITY_API_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a base URL and return it without a trailing slash.
fn validated_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Normalize a reverse-proxy prefix to `""` or `/segment[/segment]`.
fn normalize_base_path(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(char::is_whitespace) || trimmed.contains("//") {
        return Err(ConfigError::InvalidEnvVar(
            "CONSOLE_BASE_PATH".to_string(),
            format!("'{raw}' is not a valid path prefix"),
        ));
    }
    Ok(format!("/{trimmed}"))
}

/// Reject secrets that are still template placeholders.
fn validate_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "is empty".to_string(),
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret(&value, key)?;
    Ok(SecretString::from(value))
}
