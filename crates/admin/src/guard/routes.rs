//! Declarative route classification.

use serde::Serialize;

/// Where a protected route takes its proof of sign-in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// A held session token is enough.
    Session,
    /// Session token plus an active identity-provider principal.
    IdentityProvider,
    /// As above, plus a complete admin profile on the backend.
    IdentityProviderAndProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "source")]
pub enum RouteClass {
    /// Rendered for everyone.
    Public,
    /// Sign-in screens; signed-in operators are sent away.
    AuthOnly,
    /// Requires sign-in through the given source.
    Protected(CredentialSource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    /// Matches the prefix itself and anything below it.
    Prefix(String),
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        pattern.strip_suffix("/*").map_or_else(
            || Self::Exact(pattern.to_string()),
            |prefix| Self::Prefix(prefix.to_string()),
        )
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// Ordered route patterns; the first match wins.
///
/// Unmatched paths are `Protected(Session)`, so a forgotten entry fails
/// closed.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(Pattern, RouteClass)>,
    base_path: String,
    login_path: String,
    home_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            base_path: String::new(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}

impl RouteTable {
    /// The console's zones.
    ///
    /// Finance screens additionally require a complete admin profile; the
    /// v2-backed support desk requires a live provider principal.
    #[must_use]
    pub fn console_default() -> Self {
        Self::default()
            .route("/login", RouteClass::AuthOnly)
            .route("/register", RouteClass::AuthOnly)
            .route("/forgot-password", RouteClass::AuthOnly)
            .route("/reset-password", RouteClass::AuthOnly)
            .route("/health", RouteClass::Public)
            .route("/health/*", RouteClass::Public)
            .route(
                "/api/transactions/*",
                RouteClass::Protected(CredentialSource::IdentityProviderAndProfile),
            )
            .route(
                "/api/commissions/*",
                RouteClass::Protected(CredentialSource::IdentityProviderAndProfile),
            )
            .route(
                "/api/tickets/*",
                RouteClass::Protected(CredentialSource::IdentityProvider),
            )
            .route("/*", RouteClass::Protected(CredentialSource::Session))
    }

    /// Append a pattern: exact (`/login`) or prefix (`/api/hosts/*`).
    #[must_use]
    pub fn route(mut self, pattern: &str, class: RouteClass) -> Self {
        self.entries.push((Pattern::parse(pattern), class));
        self
    }

    /// Prefix redirect targets with the path the console is mounted under.
    #[must_use]
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map_or(
                RouteClass::Protected(CredentialSource::Session),
                |(_, class)| *class,
            )
    }

    /// Login URL carrying the originally requested path.
    #[must_use]
    pub fn login_redirect(&self, return_to: &str) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
        format!("{}{}?return_to={encoded}", self.base_path, self.login_path)
    }

    /// Where signed-in operators land.
    #[must_use]
    pub fn home(&self) -> String {
        format!("{}{}", self.base_path, self.home_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_zones() {
        let table = RouteTable::console_default();
        assert_eq!(table.classify("/login"), RouteClass::AuthOnly);
        assert_eq!(table.classify("/reset-password"), RouteClass::AuthOnly);
        assert_eq!(table.classify("/health"), RouteClass::Public);
        assert_eq!(table.classify("/health/ready"), RouteClass::Public);
        assert_eq!(
            table.classify("/api/transactions"),
            RouteClass::Protected(CredentialSource::IdentityProviderAndProfile)
        );
        assert_eq!(
            table.classify("/api/tickets/t1/toggle/isEscalated"),
            RouteClass::Protected(CredentialSource::IdentityProvider)
        );
        assert_eq!(
            table.classify("/api/hashtags"),
            RouteClass::Protected(CredentialSource::Session)
        );
    }

    #[test]
    fn test_prefix_does_not_match_sibling() {
        let table = RouteTable::default().route("/health/*", RouteClass::Public);
        assert_eq!(table.classify("/health"), RouteClass::Public);
        assert_eq!(
            table.classify("/healthy"),
            RouteClass::Protected(CredentialSource::Session)
        );
    }

    #[test]
    fn test_first_match_wins() {
        let table = RouteTable::default()
            .route("/api/*", RouteClass::Public)
            .route("/api/secret", RouteClass::AuthOnly);
        assert_eq!(table.classify("/api/secret"), RouteClass::Public);
    }

    #[test]
    fn test_unmatched_is_protected() {
        assert_eq!(
            RouteTable::default().classify("/anything"),
            RouteClass::Protected(CredentialSource::Session)
        );
    }

    #[test]
    fn test_redirect_targets() {
        let table = RouteTable::console_default().with_base_path("/admin/");
        assert_eq!(
            table.login_redirect("/api/hosts?page=2"),
            "/admin/login?return_to=%2Fapi%2Fhosts%3Fpage%3D2"
        );
        assert_eq!(table.home(), "/admin/");
    }
}
