//! Backend collections managed by the console.
//!
//! Each entity names its identifier and toggleable flags and carries its
//! [`ResourceConfig`](crate::ResourceConfig). Fields the console does not
//! interpret are kept in `extra` so updates round-trip the backend payload.

pub mod content;
pub mod finance;
pub mod people;

pub use content::{Banner, Gift, Hashtag, ReportReason};
pub use finance::{CoinPlan, Commission, ReferralTier, Transaction};
pub use people::{Host, HostApplication, SubAdmin, Ticket};

/// Extra payload fields passed through untouched.
pub type Passthrough = serde_json::Map<String, serde_json::Value>;
