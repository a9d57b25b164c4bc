//! Trade execution: validation pipeline + atomic balance mutation.
//!
//! Grounded on the teacher's `vault/paper_ledger.rs` (`apply_buy`/`apply_sell`
//! inside one sqlite transaction, priced from the latest feed tick) and
//! `risk.rs` (ordered pre-trade checks, first failure wins) — generalized to
//! the 7-step validation pipeline below and multi-chain balances.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::balance::BalanceManager;
use crate::chain::{is_evm_address, is_svm_address, Chain, SpecificChain};
use crate::competition::manager::CompetitionManager;
use crate::config::Config;
use crate::db::trades::TradeRepository;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::price::tracker::PriceTracker;
use crate::team::Team;
use crate::trade::Trade;

/// Coefficient applied to trade-size-as-percent-of-portfolio to derive
/// slippage, in basis points per percentage point of portfolio consumed.
/// A trade sized at 1% of the portfolio incurs 5 bps of slippage; one sized
/// at `maxTradePercentage` (25% by default) incurs 125 bps, short of the cap.
const SLIPPAGE_BPS_PER_PERCENT: i64 = 5;
/// Slippage never exceeds this, regardless of trade size.
const MAX_SLIPPAGE_BPS: i64 = 500;

fn compute_slippage(trade_size_pct: Decimal) -> Decimal {
    let bps = (trade_size_pct * Decimal::from(SLIPPAGE_BPS_PER_PERCENT)).min(Decimal::from(MAX_SLIPPAGE_BPS));
    bps / Decimal::from(10_000)
}

pub struct TradeRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: Decimal,
    pub from_chain: Chain,
    pub to_chain: Chain,
    pub from_specific_chain: Option<SpecificChain>,
    pub to_specific_chain: Option<SpecificChain>,
    pub reason: String,
}

pub struct TradeSimulator {
    db: Database,
    competitions: Arc<CompetitionManager>,
    balances: Arc<BalanceManager>,
    prices: Arc<PriceTracker>,
    trades: TradeRepository,
    config: Arc<Config>,
}

impl TradeSimulator {
    pub fn new(
        db: Database,
        competitions: Arc<CompetitionManager>,
        balances: Arc<BalanceManager>,
        prices: Arc<PriceTracker>,
        trades: TradeRepository,
        config: Arc<Config>,
    ) -> Self {
        Self { db, competitions, balances, prices, trades, config }
    }

    pub async fn execute_trade(&self, team: &Team, req: TradeRequest) -> AppResult<Trade> {
        if req.reason.trim().is_empty() {
            return Err(AppError::Validation("reason is required".to_string()));
        }
        if req.amount <= Decimal::ZERO {
            return Err(AppError::Validation("amount must be positive".to_string()));
        }

        // 1. team active and a member of the ACTIVE competition.
        let competition = self
            .competitions
            .get_active_competition()
            .await?
            .ok_or_else(|| AppError::BusinessRule("no active competition".to_string()))?;
        if !team.active {
            return Err(AppError::Authorization(format!(
                "team is deactivated: {}",
                team.deactivation_reason.clone().unwrap_or_default()
            )));
        }
        if !self.competitions.is_member(competition.id, team.id).await? {
            return Err(AppError::Authorization(
                "your team is not participating in this competition".to_string(),
            ));
        }

        // 2. token syntax valid for the declared chain.
        let from_valid = match req.from_chain {
            Chain::Evm => is_evm_address(&req.from_token),
            Chain::Svm => is_svm_address(&req.from_token),
        };
        let to_valid = match req.to_chain {
            Chain::Evm => is_evm_address(&req.to_token),
            Chain::Svm => is_svm_address(&req.to_token),
        };
        if !from_valid || !to_valid {
            return Err(AppError::Validation("token address is not valid for its declared chain".to_string()));
        }

        // 3. distinct tokens.
        if req.from_token == req.to_token {
            return Err(AppError::BusinessRule(
                "Cannot trade between identical tokens".to_string(),
            ));
        }

        // 4. cross-chain gate.
        if req.from_chain != req.to_chain
            && !(self.config.allow_cross_chain_trading && competition.cross_chain_trading_enabled)
        {
            return Err(AppError::BusinessRule(
                "Cross-chain trading is disabled".to_string(),
            ));
        }

        // 5. both prices resolvable.
        let from_price_result = self
            .prices
            .get_price(&req.from_token, Some(req.from_chain), req.from_specific_chain)
            .await?;
        let Some(from_price_result) = from_price_result else {
            return Err(AppError::BusinessRule(format!(
                "Unable to determine price for token {}",
                req.from_token
            )));
        };
        let to_price_result = self
            .prices
            .get_price(&req.to_token, Some(req.to_chain), req.to_specific_chain)
            .await?;
        let Some(to_price_result) = to_price_result else {
            return Err(AppError::BusinessRule(format!(
                "Unable to determine price for token {}",
                req.to_token
            )));
        };

        let from_specific_chain = from_price_result.specific_chain;
        let to_specific_chain = to_price_result.specific_chain;

        // 6. sufficient balance.
        if !self
            .balances
            .has_at_least(team.id, &req.from_token, from_specific_chain, req.amount)
            .await?
        {
            return Err(AppError::BusinessRule("Insufficient balance".to_string()));
        }

        // 7. trade size within the configured ceiling.
        let portfolio_value = self.portfolio_value_usd(team.id).await?;
        if portfolio_value > Decimal::ZERO {
            let trade_size_pct = (req.amount * from_price_result.price_usd) / portfolio_value * Decimal::from(100);
            if trade_size_pct > self.config.max_trade_percentage {
                return Err(AppError::BusinessRule(
                    "trade exceeds maximum size".to_string(),
                ));
            }
        }

        let from_value_usd = req.amount * from_price_result.price_usd;
        let slippage = compute_slippage(
            if portfolio_value > Decimal::ZERO {
                (req.amount * from_price_result.price_usd) / portfolio_value * Decimal::from(100)
            } else {
                Decimal::ZERO
            },
        );
        let effective_price = to_price_result.price_usd * (Decimal::ONE + slippage);
        let to_amount = from_value_usd / effective_price;

        let trade = Trade {
            id: Uuid::new_v4(),
            team_id: team.id,
            competition_id: competition.id,
            from_token: req.from_token.clone(),
            to_token: req.to_token.clone(),
            from_chain: req.from_chain,
            to_chain: req.to_chain,
            from_specific_chain: Some(from_specific_chain),
            to_specific_chain: Some(to_specific_chain),
            from_amount: req.amount,
            to_amount: Some(to_amount),
            price: Some(effective_price),
            success: true,
            error: None,
            reason: req.reason,
            timestamp: Utc::now(),
        };

        let team_id = team.id;
        let from_token = req.from_token;
        let to_token = req.to_token;
        let amount = req.amount;
        let from_chain = req.from_chain;
        let to_chain = req.to_chain;
        self.db
            .transaction(move |tx| {
                BalanceManager::apply_delta_tx(tx, team_id, &from_token, from_chain, from_specific_chain, -amount)?;
                BalanceManager::apply_delta_tx(tx, team_id, &to_token, to_chain, to_specific_chain, to_amount)?;
                Ok(())
            })
            .await
            .map_err(|e| AppError::Internal(format!("trade execution failed: {e}")))?;

        self.trades.insert(trade).await.map_err(AppError::from)
    }

    pub async fn history_for_team(&self, team_id: Uuid) -> AppResult<Vec<Trade>> {
        Ok(self.trades.by_team(team_id).await?)
    }

    async fn portfolio_value_usd(&self, team_id: Uuid) -> AppResult<Decimal> {
        let balances = self.balances.get_balances(team_id).await?;
        let mut total = Decimal::ZERO;
        for balance in balances {
            if let Some(price) = self
                .prices
                .get_price(&balance.token, Some(balance.chain), Some(balance.specific_chain))
                .await?
            {
                total += balance.amount * price.price_usd;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slippage_grows_with_trade_size_and_is_capped() {
        let small = compute_slippage(Decimal::from(1));
        let large = compute_slippage(Decimal::from(1000));
        assert!(small > Decimal::ZERO);
        assert!(large > small);
        assert_eq!(large, Decimal::from(MAX_SLIPPAGE_BPS) / Decimal::from(10_000));
    }
}
