//! Shared application state, assembled once at startup and cloned (cheaply,
//! via `Arc` fields) into every handler.
//!
//! Grounded on the teacher's `AppState` in `main.rs`, which aggregates the
//! scraper registry, auth store, and rate limiter behind one struct passed
//! to `Router::with_state`.

use std::sync::Arc;

use crate::balance::BalanceManager;
use crate::competition::manager::CompetitionManager;
use crate::config::Config;
use crate::price::tracker::PriceTracker;
use crate::rate_limit::RateLimiter;
use crate::snapshot::scheduler::SnapshotScheduler;
use crate::team::manager::TeamManager;
use crate::trade::simulator::TradeSimulator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub teams: Arc<TeamManager>,
    pub competitions: Arc<CompetitionManager>,
    pub balances: Arc<BalanceManager>,
    pub prices: Arc<PriceTracker>,
    pub trades: Arc<TradeSimulator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub scheduler: Arc<SnapshotScheduler>,
}
