//! Per-(team, token, chain) balance store.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::chain::{Chain, SpecificChain};
use crate::db::Database;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub team_id: Uuid,
    pub token: String,
    pub chain: Chain,
    pub specific_chain: SpecificChain,
    pub amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Manages balance rows and enforces the non-negativity invariant.
///
/// Grounded on the teacher's `vault/paper_ledger.rs`, which keeps one ledger
/// per vault with `cash_usdc`/positions mutated by `apply_buy`/`apply_sell`;
/// here the ledger is per-(team, token, specificChain) and persisted, with
/// every mutation routed through a single `apply_delta` so the
/// non-negative invariant has one enforcement point.
pub struct BalanceManager {
    db: Database,
}

impl BalanceManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_balances(&self, team_id: Uuid) -> AppResult<Vec<Balance>> {
        let rows = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT token, chain, specific_chain, amount, updated_at FROM balances WHERE team_id = ?1",
                )?;
                let rows = stmt.query_map(rusqlite::params![team_id.to_string()], |row| {
                    let token: String = row.get(0)?;
                    let chain: String = row.get(1)?;
                    let specific_chain: String = row.get(2)?;
                    let amount: String = row.get(3)?;
                    let updated_at: String = row.get(4)?;
                    Ok((token, chain, specific_chain, amount, updated_at))
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(token, chain, specific_chain, amount, updated_at)| {
                Some(Balance {
                    team_id,
                    token,
                    chain: Chain::from_str_opt(&chain)?,
                    specific_chain: SpecificChain::from_str_opt(&specific_chain)?,
                    amount: amount.parse().ok()?,
                    updated_at: DateTime::parse_from_rfc3339(&updated_at)
                        .map(|d| d.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })
            .collect())
    }

    pub async fn get_balance(
        &self,
        team_id: Uuid,
        token: &str,
        specific_chain: SpecificChain,
    ) -> AppResult<Decimal> {
        let token = token.to_string();
        let amount: Option<String> = self
            .db
            .call(move |conn| {
                conn.query_row(
                    "SELECT amount FROM balances WHERE team_id = ?1 AND token = ?2 AND specific_chain = ?3",
                    rusqlite::params![team_id.to_string(), token, specific_chain.as_str()],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;
        Ok(amount.and_then(|a| a.parse().ok()).unwrap_or(Decimal::ZERO))
    }

    /// Apply a delta inside an already-open transaction. Rejects any delta
    /// that would drive the balance negative.
    pub fn apply_delta_tx(
        tx: &rusqlite::Transaction<'_>,
        team_id: Uuid,
        token: &str,
        chain: Chain,
        specific_chain: SpecificChain,
        delta: Decimal,
    ) -> rusqlite::Result<()> {
        let current: Option<String> = tx
            .query_row(
                "SELECT amount FROM balances WHERE team_id = ?1 AND token = ?2 AND specific_chain = ?3",
                rusqlite::params![team_id.to_string(), token, specific_chain.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let current_amount: Decimal = current.and_then(|a| a.parse().ok()).unwrap_or(Decimal::ZERO);
        let new_amount = current_amount + delta;
        if new_amount < Decimal::ZERO {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
                Some("balance would go negative".to_string()),
            ));
        }

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO balances (id, team_id, token, chain, specific_chain, amount, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(team_id, token, specific_chain) DO UPDATE SET amount = ?6, updated_at = ?7",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                team_id.to_string(),
                token,
                chain.as_str(),
                specific_chain.as_str(),
                new_amount.to_string(),
                now,
            ],
        )?;
        Ok(())
    }

    /// Seed a team's balances at competition START from the configured
    /// initial-allocation table (one row per specific chain).
    pub async fn seed_initial_balances(
        &self,
        team_id: Uuid,
        usdc_token_by_chain: Vec<(SpecificChain, String, Decimal)>,
    ) -> AppResult<()> {
        self.db
            .transaction(move |tx| {
                for (specific_chain, token, amount) in usdc_token_by_chain {
                    Self::apply_delta_tx(tx, team_id, &token, specific_chain.chain(), specific_chain, amount)?;
                }
                Ok(())
            })
            .await
            .map_err(|e| AppError::Internal(format!("failed to seed balances: {e}")))
    }

    pub async fn has_at_least(
        &self,
        team_id: Uuid,
        token: &str,
        specific_chain: SpecificChain,
        amount: Decimal,
    ) -> AppResult<bool> {
        Ok(self.get_balance(team_id, token, specific_chain).await? >= amount)
    }
}
