use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::chain::SpecificChain;
use crate::db::Database;
use crate::snapshot::{PortfolioSnapshot, PortfolioTokenValue};

fn row_to_token_value(row: &Row) -> rusqlite::Result<PortfolioTokenValue> {
    let specific_chain: String = row.get("specific_chain")?;
    let amount: String = row.get("amount")?;
    let price_usd: String = row.get("price_usd")?;
    let value_usd: String = row.get("value_usd")?;
    Ok(PortfolioTokenValue {
        token_address: row.get("token_address")?,
        specific_chain: SpecificChain::from_str_opt(&specific_chain).unwrap_or(SpecificChain::Eth),
        amount: Decimal::from_str(&amount).unwrap_or(Decimal::ZERO),
        price_usd: Decimal::from_str(&price_usd).unwrap_or(Decimal::ZERO),
        value_usd: Decimal::from_str(&value_usd).unwrap_or(Decimal::ZERO),
    })
}

/// Stores one row per team per scheduler tick (`portfolio_snapshots`) plus
/// the per-token valuation breakdown (`portfolio_token_values`) that the
/// snapshot was computed from.
///
/// Grounded on the teacher's `performance/pnl_snapshot.rs`, which persists a
/// mark-to-market valuation alongside its constituent position values for
/// later reconstruction; here the constituents back the leaderboard and any
/// per-team portfolio breakdown endpoint.
pub struct SnapshotRepository {
    db: Database,
}

impl SnapshotRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, snapshot: PortfolioSnapshot) -> rusqlite::Result<PortfolioSnapshot> {
        self.db
            .transaction(move |tx| {
                tx.execute(
                    "INSERT INTO portfolio_snapshots (id, team_id, competition_id, total_value_usd, timestamp) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        snapshot.id.to_string(),
                        snapshot.team_id.to_string(),
                        snapshot.competition_id.to_string(),
                        snapshot.total_value_usd.to_string(),
                        snapshot.timestamp.to_rfc3339(),
                    ],
                )?;
                for tv in &snapshot.token_values {
                    tx.execute(
                        "INSERT INTO portfolio_token_values \
                         (id, snapshot_id, token_address, specific_chain, amount, price_usd, value_usd) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            Uuid::new_v4().to_string(),
                            snapshot.id.to_string(),
                            tv.token_address,
                            tv.specific_chain.as_str(),
                            tv.amount.to_string(),
                            tv.price_usd.to_string(),
                            tv.value_usd.to_string(),
                        ],
                    )?;
                }
                Ok(snapshot)
            })
            .await
    }

    async fn token_values_for(&self, snapshot_id: Uuid) -> rusqlite::Result<Vec<PortfolioTokenValue>> {
        self.db
            .call(move |conn: &Connection| {
                let mut stmt = conn.prepare(
                    "SELECT token_address, specific_chain, amount, price_usd, value_usd \
                     FROM portfolio_token_values WHERE snapshot_id = ?1",
                )?;
                let rows = stmt.query_map(params![snapshot_id.to_string()], row_to_token_value)?;
                rows.collect()
            })
            .await
    }

    /// Latest snapshot per team for a competition, used to build the
    /// leaderboard. Does not include token breakdowns (callers fetch those
    /// separately if needed).
    pub async fn latest_per_team(&self, competition_id: Uuid) -> rusqlite::Result<Vec<PortfolioSnapshot>> {
        let rows = self
            .db
            .call(move |conn: &Connection| {
                let mut stmt = conn.prepare(
                    "SELECT id, team_id, competition_id, total_value_usd, timestamp FROM portfolio_snapshots \
                     WHERE competition_id = ?1 AND timestamp = (\
                       SELECT MAX(timestamp) FROM portfolio_snapshots s2 \
                       WHERE s2.team_id = portfolio_snapshots.team_id AND s2.competition_id = ?1\
                     )",
                )?;
                let rows = stmt.query_map(params![competition_id.to_string()], |row: &Row| {
                    let id: String = row.get("id")?;
                    let team_id: String = row.get("team_id")?;
                    let competition_id: String = row.get("competition_id")?;
                    let total_value_usd: String = row.get("total_value_usd")?;
                    let timestamp: String = row.get("timestamp")?;
                    Ok((id, team_id, competition_id, total_value_usd, timestamp))
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, team_id, competition_id, total_value_usd, timestamp)| {
                Some(PortfolioSnapshot {
                    id: Uuid::parse_str(&id).ok()?,
                    team_id: Uuid::parse_str(&team_id).ok()?,
                    competition_id: Uuid::parse_str(&competition_id).ok()?,
                    total_value_usd: Decimal::from_str(&total_value_usd).ok()?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .ok()?
                        .with_timezone(&Utc),
                    token_values: Vec::new(),
                })
            })
            .collect())
    }

    pub async fn history_for_team(
        &self,
        team_id: Uuid,
        competition_id: Uuid,
    ) -> rusqlite::Result<Vec<PortfolioSnapshot>> {
        let rows = self
            .db
            .call(move |conn: &Connection| {
                let mut stmt = conn.prepare(
                    "SELECT id, team_id, competition_id, total_value_usd, timestamp FROM portfolio_snapshots \
                     WHERE team_id = ?1 AND competition_id = ?2 ORDER BY timestamp ASC",
                )?;
                let rows = stmt.query_map(
                    params![team_id.to_string(), competition_id.to_string()],
                    |row: &Row| {
                        let id: String = row.get("id")?;
                        let total_value_usd: String = row.get("total_value_usd")?;
                        let timestamp: String = row.get("timestamp")?;
                        Ok((id, total_value_usd, timestamp))
                    },
                )?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        let mut out = Vec::new();
        for (id, total_value_usd, timestamp) in rows {
            let Some(parsed_id) = Uuid::parse_str(&id).ok() else { continue };
            let token_values = self.token_values_for(parsed_id).await?;
            out.push(PortfolioSnapshot {
                id: parsed_id,
                team_id,
                competition_id,
                total_value_usd: Decimal::from_str(&total_value_usd).unwrap_or(Decimal::ZERO),
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                token_values,
            });
        }
        Ok(out)
    }
}
