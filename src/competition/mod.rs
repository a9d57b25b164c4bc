//! Competition lifecycle entities.

pub mod manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompetitionStatus {
    Pending,
    Active,
    Completed,
}

impl CompetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionStatus::Pending => "PENDING",
            CompetitionStatus::Active => "ACTIVE",
            CompetitionStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(CompetitionStatus::Pending),
            "ACTIVE" => Some(CompetitionStatus::Active),
            "COMPLETED" => Some(CompetitionStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: CompetitionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cross_chain_trading_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub team_id: Uuid,
    pub team_name: String,
    pub total_value_usd: rust_decimal::Decimal,
    pub active: bool,
    pub deactivation_reason: Option<String>,
    pub snapshot_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub competition_id: Uuid,
    pub entries: Vec<LeaderboardEntry>,
    pub has_inactive_teams: bool,
}
