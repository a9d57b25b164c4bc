//! Portfolio snapshot entities.

pub mod scheduler;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::chain::SpecificChain;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTokenValue {
    pub token_address: String,
    pub specific_chain: SpecificChain,
    pub amount: Decimal,
    pub price_usd: Decimal,
    pub value_usd: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: Uuid,
    pub team_id: Uuid,
    pub competition_id: Uuid,
    pub total_value_usd: Decimal,
    pub timestamp: DateTime<Utc>,
    pub token_values: Vec<PortfolioTokenValue>,
}
