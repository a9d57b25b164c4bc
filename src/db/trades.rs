use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::chain::{Chain, SpecificChain};
use crate::db::Database;
use crate::trade::Trade;

fn row_to_trade(row: &Row) -> rusqlite::Result<Trade> {
    let id: String = row.get("id")?;
    let team_id: String = row.get("team_id")?;
    let competition_id: String = row.get("competition_id")?;
    let from_chain: String = row.get("from_chain")?;
    let to_chain: String = row.get("to_chain")?;
    let from_specific_chain: Option<String> = row.get("from_specific_chain")?;
    let to_specific_chain: Option<String> = row.get("to_specific_chain")?;
    let from_amount: String = row.get("from_amount")?;
    let to_amount: Option<String> = row.get("to_amount")?;
    let price: Option<String> = row.get("price")?;
    let timestamp: String = row.get("timestamp")?;

    Ok(Trade {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        team_id: Uuid::parse_str(&team_id).unwrap_or_default(),
        competition_id: Uuid::parse_str(&competition_id).unwrap_or_default(),
        from_token: row.get("from_token")?,
        to_token: row.get("to_token")?,
        from_chain: Chain::from_str_opt(&from_chain).unwrap_or(Chain::Evm),
        to_chain: Chain::from_str_opt(&to_chain).unwrap_or(Chain::Evm),
        from_specific_chain: from_specific_chain.and_then(|s| SpecificChain::from_str_opt(&s)),
        to_specific_chain: to_specific_chain.and_then(|s| SpecificChain::from_str_opt(&s)),
        from_amount: Decimal::from_str(&from_amount).unwrap_or(Decimal::ZERO),
        to_amount: to_amount.and_then(|a| Decimal::from_str(&a).ok()),
        price: price.and_then(|p| Decimal::from_str(&p).ok()),
        success: row.get::<_, i64>("success")? != 0,
        error: row.get("error")?,
        reason: row.get("reason")?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

const COLUMNS: &str = "id, team_id, competition_id, from_token, to_token, from_chain, to_chain, \
    from_specific_chain, to_specific_chain, from_amount, to_amount, price, success, error, reason, timestamp";

/// Append-only ledger of executed trades.
///
/// Grounded on the teacher's `vault/trade_log.rs`, which records every
/// simulated fill for later audit. Here `TradeSimulator::execute_trade`
/// inserts a row only once a trade clears every pre-execution check; a
/// rejected trade returns an error before reaching `insert` and writes
/// nothing, so this ledger holds executed trades only, not attempts.
pub struct TradeRepository {
    db: Database,
}

impl TradeRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, trade: Trade) -> rusqlite::Result<Trade> {
        self.db
            .call(move |conn: &Connection| {
                conn.execute(
                    &format!(
                        "INSERT INTO trades ({COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)"
                    ),
                    params![
                        trade.id.to_string(),
                        trade.team_id.to_string(),
                        trade.competition_id.to_string(),
                        trade.from_token,
                        trade.to_token,
                        trade.from_chain.as_str(),
                        trade.to_chain.as_str(),
                        trade.from_specific_chain.map(|c| c.as_str()),
                        trade.to_specific_chain.map(|c| c.as_str()),
                        trade.from_amount.to_string(),
                        trade.to_amount.map(|a| a.to_string()),
                        trade.price.map(|p| p.to_string()),
                        trade.success as i64,
                        trade.error,
                        trade.reason,
                        trade.timestamp.to_rfc3339(),
                    ],
                )?;
                Ok(trade)
            })
            .await
    }

    /// A team's full trade history across every competition it has ever
    /// participated in, newest first.
    pub async fn by_team(&self, team_id: Uuid) -> rusqlite::Result<Vec<Trade>> {
        self.db
            .call(move |conn: &Connection| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM trades WHERE team_id = ?1 ORDER BY timestamp DESC"
                ))?;
                let rows = stmt.query_map(params![team_id.to_string()], row_to_trade)?;
                rows.collect()
            })
            .await
    }
}
