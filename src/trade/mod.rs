//! Trade entity.

pub mod simulator;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::chain::{Chain, SpecificChain};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Uuid,
    pub team_id: Uuid,
    pub competition_id: Uuid,
    pub from_token: String,
    pub to_token: String,
    pub from_chain: Chain,
    pub to_chain: Chain,
    pub from_specific_chain: Option<SpecificChain>,
    pub to_specific_chain: Option<SpecificChain>,
    pub from_amount: Decimal,
    pub to_amount: Option<Decimal>,
    pub price: Option<Decimal>,
    pub success: bool,
    pub error: Option<String>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
