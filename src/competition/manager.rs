//! Competition lifecycle state machine, snapshot orchestration, leaderboard.
//!
//! Grounded on the teacher's `backtest_v2` run-state machine (PENDING →
//! RUNNING → COMPLETE, with a single in-flight run enforced by a guard
//! check) generalized to PENDING → ACTIVE → COMPLETED with team membership
//! and balance seeding folded into `start`.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;
use uuid::Uuid;

use crate::balance::BalanceManager;
use crate::chain::SpecificChain;
use crate::competition::{Competition, CompetitionStatus, Leaderboard, LeaderboardEntry};
use crate::config::Config;
use crate::db::competitions::CompetitionRepository;
use crate::db::snapshots::SnapshotRepository;
use crate::error::{AppError, AppResult};
use crate::price::tracker::PriceTracker;
use crate::snapshot::{PortfolioSnapshot, PortfolioTokenValue};
use crate::team::manager::TeamManager;

pub struct CompetitionManager {
    repo: CompetitionRepository,
    snapshots: SnapshotRepository,
    balances: Arc<BalanceManager>,
    teams: Arc<TeamManager>,
    prices: Arc<PriceTracker>,
    config: Arc<Config>,
    /// One entry per competition currently being snapshotted, so snapshots
    /// for the same competition never overlap.
    snapshot_locks: AsyncMutex<HashSet<Uuid>>,
}

impl CompetitionManager {
    pub fn new(
        repo: CompetitionRepository,
        snapshots: SnapshotRepository,
        balances: Arc<BalanceManager>,
        teams: Arc<TeamManager>,
        prices: Arc<PriceTracker>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            repo,
            snapshots,
            balances,
            teams,
            prices,
            config,
            snapshot_locks: AsyncMutex::new(HashSet::new()),
        }
    }

    pub async fn create(&self, name: String, description: String) -> AppResult<Competition> {
        let now = Utc::now();
        let competition = Competition {
            id: Uuid::new_v4(),
            name,
            description,
            status: CompetitionStatus::Pending,
            start_date: None,
            end_date: None,
            cross_chain_trading_enabled: self.config.allow_cross_chain_trading,
            created_at: now,
            updated_at: now,
        };
        Ok(self.repo.insert(competition).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Competition> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("competition not found".to_string()))
    }

    pub async fn get_active_competition(&self) -> AppResult<Option<Competition>> {
        Ok(self.repo.get_active().await?)
    }

    pub async fn list_active(&self) -> AppResult<Vec<Competition>> {
        Ok(self.repo.list_active().await?)
    }

    pub async fn is_member(&self, competition_id: Uuid, team_id: Uuid) -> AppResult<bool> {
        Ok(self.repo.is_member(competition_id, team_id).await?)
    }

    /// Start a PENDING competition: materialise membership, seed balances,
    /// mark each listed team active, and take the opening snapshot.
    pub async fn start(&self, competition_id: Uuid, team_ids: Vec<Uuid>) -> AppResult<Competition> {
        let competition = self.get(competition_id).await?;
        if competition.status != CompetitionStatus::Pending {
            return Err(AppError::Conflict(
                "competition is not PENDING; cannot start".to_string(),
            ));
        }
        if self.get_active_competition().await?.is_some() {
            return Err(AppError::Conflict(
                "another competition is already ACTIVE".to_string(),
            ));
        }

        let now = Utc::now();
        self.repo
            .set_status(competition_id, CompetitionStatus::Active, Some(now), None)
            .await?;

        let initial_balances: Vec<(SpecificChain, String, Decimal)> = self
            .config
            .initial_balances
            .iter()
            .map(|(chain, amount)| (*chain, usdc_address_for(*chain), *amount))
            .collect();

        for team_id in &team_ids {
            self.repo.add_member(competition_id, *team_id).await?;
            self.teams.reactivate_team(*team_id).await?;
            self.teams.clear_inactive_cache_entry(*team_id);
            self.balances.seed_initial_balances(*team_id, initial_balances.clone()).await?;
        }

        let started = self.get(competition_id).await?;
        self.take_portfolio_snapshots(competition_id).await?;
        Ok(started)
    }

    /// End an ACTIVE competition: deactivate every member and take the
    /// closing snapshot.
    pub async fn end(&self, competition_id: Uuid) -> AppResult<Competition> {
        let competition = self.get(competition_id).await?;
        if competition.status != CompetitionStatus::Active {
            return Err(AppError::Conflict(
                "competition is not ACTIVE; cannot end".to_string(),
            ));
        }

        self.take_portfolio_snapshots(competition_id).await?;

        let now = Utc::now();
        self.repo
            .set_status(competition_id, CompetitionStatus::Completed, None, Some(now))
            .await?;

        for team_id in self.repo.members(competition_id).await? {
            self.teams
                .deactivate_team(team_id, format!("Competition {} has ended", competition.name))
                .await?;
        }

        self.get(competition_id).await
    }

    /// Valuate every member team's current holdings and persist one
    /// snapshot per team. Serialised per competition.
    pub async fn take_portfolio_snapshots(&self, competition_id: Uuid) -> AppResult<()> {
        {
            let mut locks = self.snapshot_locks.lock().await;
            if !locks.insert(competition_id) {
                return Err(AppError::Conflict(
                    "a snapshot is already in progress for this competition".to_string(),
                ));
            }
        }

        let result = self.take_portfolio_snapshots_inner(competition_id).await;

        self.snapshot_locks.lock().await.remove(&competition_id);
        result
    }

    async fn take_portfolio_snapshots_inner(&self, competition_id: Uuid) -> AppResult<()> {
        let member_ids = self.repo.members(competition_id).await?;
        let mut db_hits = 0usize;
        let mut total_lookups = 0usize;

        for team_id in member_ids {
            let balances = self.balances.get_balances(team_id).await?;
            let mut token_values = Vec::new();
            let mut total_value_usd = Decimal::ZERO;

            for balance in balances {
                total_lookups += 1;
                let Some(price) = self
                    .prices
                    .get_price(&balance.token, Some(balance.chain), Some(balance.specific_chain))
                    .await?
                else {
                    continue;
                };
                db_hits += 1;
                let value_usd = balance.amount * price.price_usd;
                total_value_usd += value_usd;
                token_values.push(PortfolioTokenValue {
                    token_address: balance.token,
                    specific_chain: balance.specific_chain,
                    amount: balance.amount,
                    price_usd: price.price_usd,
                    value_usd,
                });
            }

            let snapshot = PortfolioSnapshot {
                id: Uuid::new_v4(),
                team_id,
                competition_id,
                total_value_usd,
                timestamp: Utc::now(),
                token_values,
            };
            self.snapshots.insert(snapshot).await?;
        }

        let reuse_pct = if total_lookups > 0 { (db_hits * 100) / total_lookups } else { 0 };
        info!(
            competition_id = %competition_id,
            db_hits,
            total_lookups,
            "Price lookup stats: Reused existing prices: {} ({}%)",
            db_hits,
            reuse_pct,
        );
        Ok(())
    }

    pub async fn get_leaderboard(&self, competition_id: Uuid) -> AppResult<Leaderboard> {
        let snapshots = self.snapshots.latest_per_team(competition_id).await?;
        let mut rows = Vec::new();
        let mut has_inactive_teams = false;

        for snapshot in snapshots {
            let team = self.teams.get_team(snapshot.team_id).await?;
            if !team.active {
                has_inactive_teams = true;
            }
            rows.push((snapshot, team));
        }

        rows.sort_by(|(sa, ta), (sb, tb)| {
            sb.total_value_usd
                .cmp(&sa.total_value_usd)
                .then_with(|| sa.timestamp.cmp(&sb.timestamp))
                .then_with(|| ta.id.to_string().cmp(&tb.id.to_string()))
        });

        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (snapshot, team))| LeaderboardEntry {
                rank: (idx + 1) as u32,
                team_id: team.id,
                team_name: team.name,
                total_value_usd: snapshot.total_value_usd,
                active: team.active,
                deactivation_reason: team.deactivation_reason,
                snapshot_timestamp: snapshot.timestamp,
            })
            .collect();

        Ok(Leaderboard { competition_id, entries, has_inactive_teams })
    }

    pub async fn latest_snapshots(&self, competition_id: Uuid) -> AppResult<Vec<PortfolioSnapshot>> {
        Ok(self.snapshots.latest_per_team(competition_id).await?)
    }

    pub async fn snapshot_history_for_team(
        &self,
        team_id: Uuid,
        competition_id: Uuid,
    ) -> AppResult<Vec<PortfolioSnapshot>> {
        Ok(self.snapshots.history_for_team(team_id, competition_id).await?)
    }
}

/// Placeholder USDC address seeded per specific chain at competition start.
/// Real deployments configure these explicitly; this keeps balance seeding
/// self-contained without requiring a separate token registry.
fn usdc_address_for(specific_chain: SpecificChain) -> String {
    match specific_chain {
        SpecificChain::Svm => "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        _ => "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
    }
}
