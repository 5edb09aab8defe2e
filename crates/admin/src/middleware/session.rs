//! Session middleware configuration for the console.
//!
//! Credentials live in an in-process store keyed by a browser cookie. They
//! are lost on restart, which signs every operator out; nothing else
//! persists them.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name for the console.
pub const SESSION_COOKIE_NAME: &str = "chimax_admin_session";

/// Inactivity expiry in seconds (12 hours).
const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    let cookie_path = if config.base_path.is_empty() {
        "/".to_string()
    } else {
        config.base_path.clone()
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path(cookie_path)
}
