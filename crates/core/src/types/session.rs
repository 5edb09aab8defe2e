//! Session and permission model.
//!
//! A [`Session`] is created by a successful login or registration and is the
//! only source of the credentials attached to outbound backend requests.
//! [`Permission`] entries are fetched for sub-admins during session bootstrap
//! and only decide what the console exposes; the backend enforces access.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::id::AdminId;

/// Per-section access grant for a sub-admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Console section the grant applies to (e.g. `coin-plans`).
    pub section: String,
    /// Whether the section may be listed.
    #[serde(default)]
    pub can_view: bool,
    /// Whether the section may be mutated.
    #[serde(default)]
    pub can_edit: bool,
}

/// Resolved access for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Access {
    pub can_view: bool,
    pub can_edit: bool,
}

impl Access {
    /// Full access, as granted to super admins.
    pub const FULL: Self = Self {
        can_view: true,
        can_edit: true,
    };

    /// No access.
    pub const NONE: Self = Self {
        can_view: false,
        can_edit: false,
    };
}

/// Admin profile returned by the backend at login (the `user` storage key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    #[serde(rename = "_id")]
    pub id: AdminId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Credentials held for the signed-in operator.
///
/// Implements `Debug` manually to redact both bearer tokens.
#[derive(Clone)]
pub struct Session {
    /// Legacy backend bearer token (`admin_token`).
    pub access_token: SecretString,
    /// Actor identifier sent with legacy requests (`uid`).
    pub user_id: AdminId,
    /// Whether the operator is a sub-admin (`isSubAdmin`).
    pub is_sub_admin: bool,
    /// Section grants; empty and ignored for super admins (`subadmin`).
    pub permissions: Vec<Permission>,
    /// Profile payload from login (`user`).
    pub profile: Option<AdminProfile>,
    /// Bearer token for the v2 backend (`v2_access_token`).
    pub v2_access_token: Option<SecretString>,
}

impl Session {
    /// Create a session with no permissions, profile or v2 token.
    #[must_use]
    pub const fn new(access_token: SecretString, user_id: AdminId, is_sub_admin: bool) -> Self {
        Self {
            access_token,
            user_id,
            is_sub_admin,
            permissions: Vec::new(),
            profile: None,
            v2_access_token: None,
        }
    }

    /// Resolve access to a console section.
    ///
    /// Super admins can view and edit everything. Sub-admins get exactly what
    /// their grant for the section says, and nothing when there is no grant.
    #[must_use]
    pub fn access(&self, section: &str) -> Access {
        if !self.is_sub_admin {
            return Access::FULL;
        }

        self.permissions
            .iter()
            .find(|permission| permission.section == section)
            .map_or(Access::NONE, |permission| Access {
                can_view: permission.can_view || permission.can_edit,
                can_edit: permission.can_edit,
            })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("is_sub_admin", &self.is_sub_admin)
            .field("permissions", &self.permissions)
            .field("profile", &self.profile)
            .field(
                "v2_access_token",
                &self.v2_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Keys used in the per-browser session store.
pub mod keys {
    /// Legacy backend bearer token.
    pub const ADMIN_TOKEN: &str = "admin_token";

    /// Actor identifier for legacy requests.
    pub const UID: &str = "uid";

    /// Sub-admin flag.
    pub const IS_SUB_ADMIN: &str = "isSubAdmin";

    /// Serialized admin profile.
    pub const USER: &str = "user";

    /// Serialized sub-admin permission grants.
    pub const SUBADMIN: &str = "subadmin";

    /// Bearer token for the v2 backend.
    pub const V2_ACCESS_TOKEN: &str = "v2_access_token";

    /// Every key above, in the order they are cleared on logout.
    pub const ALL: [&str; 6] = [ADMIN_TOKEN, UID, IS_SUB_ADMIN, USER, SUBADMIN, V2_ACCESS_TOKEN];
}
