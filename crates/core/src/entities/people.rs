//! People-facing collections: hosts, host applications, sub-admins, tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Passthrough;
use crate::impl_entity;
use crate::resource::{Backend, Endpoints, InsertPosition, ResourceConfig};
use crate::types::{EntityId, Permission};
use crate::validation::{FieldRule, Rule};

/// Live-streaming host account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub agency_id: Option<EntityId>,
    #[serde(default)]
    pub is_block: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const HOSTS: ResourceConfig = ResourceConfig {
    name: "hosts",
    label: "Host",
    section: "hosts",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/host",
        "/api/admin/host/{id}",
        Some("/api/admin/host/{id}/toggle/{field}"),
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[
        FieldRule {
            field: "name",
            rules: &[Rule::Required, Rule::MaxLength(80)],
        },
        FieldRule {
            field: "agencyId",
            rules: &[Rule::Required],
        },
    ],
};

impl_entity!(Host, HOSTS, flags: [
    is_block => "isBlock",
    is_verified => "isVerified",
]);

/// Request from a user to become a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostApplication {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    /// `pending`, `accepted` or `declined`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const HOST_APPLICATIONS: ResourceConfig = ResourceConfig {
    name: "host-applications",
    label: "Host application",
    section: "hosts",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/hostRequest",
        "/api/admin/hostRequest/{id}",
        None,
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[
        FieldRule {
            field: "status",
            rules: &[Rule::Required],
        },
        FieldRule {
            field: "reason",
            rules: &[Rule::MaxLength(500)],
        },
    ],
};

impl_entity!(HostApplication, HOST_APPLICATIONS);

/// Operator with section-scoped permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAdmin {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const SUB_ADMINS: ResourceConfig = ResourceConfig {
    name: "sub-admins",
    label: "Sub-admin",
    section: "sub-admins",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/subadmin",
        "/api/admin/subadmin/{id}",
        Some("/api/admin/subadmin/{id}/toggle/{field}"),
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[
        FieldRule {
            field: "name",
            rules: &[Rule::Required, Rule::MaxLength(80)],
        },
        FieldRule {
            field: "email",
            rules: &[Rule::Required],
        },
        FieldRule {
            field: "permissions",
            rules: &[Rule::Json],
        },
    ],
};

impl_entity!(SubAdmin, SUB_ADMINS, flags: [is_active => "isActive"]);

/// Support ticket (v2 backend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub subject: String,
    /// `open`, `pending` or `closed`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub is_escalated: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const TICKETS: ResourceConfig = ResourceConfig {
    name: "tickets",
    label: "Ticket",
    section: "support",
    backend: Backend::V2,
    endpoints: Endpoints::rest(
        "/v1/support/tickets",
        "/v1/support/tickets/{id}",
        Some("/v1/support/tickets/{id}/{field}"),
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[
        FieldRule {
            field: "subject",
            rules: &[Rule::Required, Rule::MaxLength(150)],
        },
        FieldRule {
            field: "status",
            rules: &[Rule::Required],
        },
    ],
};

impl_entity!(Ticket, TICKETS, flags: [is_escalated => "isEscalated"]);
