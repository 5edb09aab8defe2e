//! Content collections: hashtags, report reasons, gifts, banners.

use serde::{Deserialize, Serialize};

use super::Passthrough;
use crate::impl_entity;
use crate::resource::{Backend, Endpoints, InsertPosition, ResourceConfig};
use crate::types::EntityId;
use crate::validation::{FieldRule, Rule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_trending: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const HASHTAGS: ResourceConfig = ResourceConfig {
    name: "hashtags",
    label: "Hashtag",
    section: "hashtags",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/hashtag",
        "/api/admin/hashtag/{id}",
        Some("/api/admin/hashtag/{id}/toggle/{field}"),
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[FieldRule {
        field: "tag",
        rules: &[Rule::Required, Rule::MaxLength(50)],
    }],
};

impl_entity!(Hashtag, HASHTAGS, flags: [is_trending => "isTrending"]);

/// Reason offered to users when reporting content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportReason {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const REPORT_REASONS: ResourceConfig = ResourceConfig {
    name: "report-reasons",
    label: "Report reason",
    section: "reports",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/reportReason",
        "/api/admin/reportReason/{id}",
        None,
    ),
    insert: InsertPosition::Append,
    read_only: false,
    schema: &[FieldRule {
        field: "title",
        rules: &[Rule::Required, Rule::MaxLength(200)],
    }],
};

impl_entity!(ReportReason, REPORT_REASONS);

/// Virtual gift sent during live streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gift {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub coin: u64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<EntityId>,
    #[serde(default)]
    pub is_svga: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const GIFTS: ResourceConfig = ResourceConfig {
    name: "gifts",
    label: "Gift",
    section: "gifts",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/gift",
        "/api/admin/gift/{id}",
        Some("/api/admin/gift/{id}/toggle/{field}"),
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[
        FieldRule {
            field: "coin",
            rules: &[Rule::Required, Rule::Numeric],
        },
        FieldRule {
            field: "image",
            rules: &[Rule::Required],
        },
        FieldRule {
            field: "categoryId",
            rules: &[Rule::Required],
        },
    ],
};

impl_entity!(Gift, GIFTS, flags: [is_active => "isActive"]);

/// Home-screen banner. `action` is free-form JSON interpreted by the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub action: Option<serde_json::Value>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const BANNERS: ResourceConfig = ResourceConfig {
    name: "banners",
    label: "Banner",
    section: "banners",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/banner",
        "/api/admin/banner/{id}",
        Some("/api/admin/banner/{id}/toggle/{field}"),
    ),
    insert: InsertPosition::Prepend,
    read_only: false,
    schema: &[
        FieldRule {
            field: "image",
            rules: &[Rule::Required],
        },
        FieldRule {
            field: "action",
            rules: &[Rule::Json],
        },
    ],
};

impl_entity!(Banner, BANNERS, flags: [is_active => "isActive"]);
