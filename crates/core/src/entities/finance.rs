//! Finance collections: coin plans, commissions, referral tiers, transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Passthrough;
use crate::impl_entity;
use crate::resource::{Backend, Endpoints, InsertPosition, ResourceConfig};
use crate::types::EntityId;
use crate::validation::{FieldRule, Rule};

/// Purchasable coin bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPlan {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub coin: u64,
    #[serde(default)]
    pub extra_coin: u64,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub product_key: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const COIN_PLANS: ResourceConfig = ResourceConfig {
    name: "coin-plans",
    label: "Coin plan",
    section: "coin-plans",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/coinplan",
        "/api/admin/coinplan/{id}",
        Some("/api/admin/coinplan/{id}/toggle/{field}"),
    ),
    insert: InsertPosition::Append,
    read_only: false,
    schema: &[
        FieldRule {
            field: "coin",
            rules: &[Rule::Required, Rule::Numeric],
        },
        FieldRule {
            field: "extraCoin",
            rules: &[Rule::Numeric],
        },
        FieldRule {
            field: "amount",
            rules: &[Rule::Required, Rule::Numeric],
        },
        FieldRule {
            field: "productKey",
            rules: &[Rule::Required, Rule::MaxLength(120)],
        },
    ],
};

impl_entity!(CoinPlan, COIN_PLANS, flags: [
    is_active => "isActive",
    is_popular => "isPopular",
]);

/// Agency commission bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub agency_id: Option<EntityId>,
    #[serde(default)]
    pub amount_percentage: Decimal,
    #[serde(default)]
    pub upper_limit: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const COMMISSIONS: ResourceConfig = ResourceConfig {
    name: "commissions",
    label: "Commission",
    section: "commissions",
    backend: Backend::Legacy,
    endpoints: Endpoints::rest(
        "/api/admin/commission",
        "/api/admin/commission/{id}",
        None,
    ),
    insert: InsertPosition::Append,
    read_only: false,
    schema: &[
        FieldRule {
            field: "amountPercentage",
            rules: &[Rule::Required, Rule::Numeric],
        },
        FieldRule {
            field: "upperLimit",
            rules: &[Rule::Numeric],
        },
    ],
};

impl_entity!(Commission, COMMISSIONS);

/// Reward level of the referral program (v2 backend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralTier {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_referrals: u32,
    #[serde(default)]
    pub reward_coins: u64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const REFERRAL_TIERS: ResourceConfig = ResourceConfig {
    name: "referral-tiers",
    label: "Referral tier",
    section: "referrals",
    backend: Backend::V2,
    endpoints: Endpoints::rest(
        "/v1/referral/tiers",
        "/v1/referral/tiers/{id}",
        Some("/v1/referral/tiers/{id}/{field}"),
    ),
    insert: InsertPosition::Append,
    read_only: false,
    schema: &[
        FieldRule {
            field: "name",
            rules: &[Rule::Required, Rule::MaxLength(60)],
        },
        FieldRule {
            field: "minReferrals",
            rules: &[Rule::Required, Rule::Numeric],
        },
        FieldRule {
            field: "rewardCoins",
            rules: &[Rule::Required, Rule::Numeric],
        },
    ],
};

impl_entity!(ReferralTier, REFERRAL_TIERS, flags: [is_active => "isActive"]);

/// Wallet ledger entry (v2 backend, list only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

pub const TRANSACTIONS: ResourceConfig = ResourceConfig {
    name: "transactions",
    label: "Transaction",
    section: "transactions",
    backend: Backend::V2,
    endpoints: Endpoints::rest("/v1/wallet/transactions", "/v1/wallet/transactions/{id}", None),
    insert: InsertPosition::Prepend,
    read_only: true,
    schema: &[],
};

impl_entity!(Transaction, TRANSACTIONS);
