//! Team entity and registry.

pub mod manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A registered participant or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_person: String,
    pub wallet_address: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub is_admin: bool,
    pub active: bool,
    pub deactivation_reason: Option<String>,
    pub deactivation_date: Option<DateTime<Utc>>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// True EVM wallet address syntax check, used at public registration.
    pub fn is_valid_wallet_address(address: &str) -> bool {
        crate::chain::is_evm_address(address)
    }
}
