//! Price resolution: chain inference, provider fan-out, freshness-aware cache.

pub mod providers;
pub mod tracker;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::chain::{Chain, SpecificChain};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResult {
    pub token: String,
    pub chain: Chain,
    pub specific_chain: SpecificChain,
    pub price_usd: Decimal,
    pub fetched_at: DateTime<Utc>,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token: String,
    pub chain: Chain,
    pub specific_chain: SpecificChain,
    pub price_usd: Option<Decimal>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}
