//! Application configuration.
//!
//! All settings are loaded from the environment, mirroring the teacher's
//! `Config::from_env` convention: a `dotenv().ok()` then a sequence of
//! `env::var(...).unwrap_or_else(...)` parses with sane defaults.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use crate::chain::SpecificChain;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    pub test_mode: bool,

    pub allow_cross_chain_trading: bool,
    pub disable_participant_leaderboard_access: bool,

    pub noves_api_key: Option<String>,

    pub initial_balances: HashMap<SpecificChain, Decimal>,

    pub price_freshness_ms: i64,
    pub max_trade_percentage: Decimal,

    pub rate_limit_account_per_min: u32,
    pub rate_limit_trade_per_min: u32,
    pub rate_limit_price_per_min: u32,

    pub snapshot_interval_ms: u64,
    pub api_key_prefix: String,
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "on" | "yes"))
        .unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_decimal(key: &str, default: &str) -> Decimal {
    env::var(key)
        .ok()
        .and_then(|v| Decimal::from_str(&v).ok())
        .unwrap_or_else(|| Decimal::from_str(default).unwrap())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./arena.db".to_string());
        let port = env_parse("PORT", 8080u16);
        let test_mode = env_bool("TEST_MODE", false);

        let allow_cross_chain_trading = env_bool("ALLOW_CROSS_CHAIN_TRADING", true);
        let disable_participant_leaderboard_access =
            env_bool("DISABLE_PARTICIPANT_LEADERBOARD_ACCESS", false);

        let noves_api_key = env::var("NOVES_API_KEY").ok();

        let base_usdc = env_decimal("INITIAL_BASE_USDC_BALANCE", "10000");
        let mut initial_balances = HashMap::new();
        initial_balances.insert(SpecificChain::Svm, base_usdc);
        initial_balances.insert(SpecificChain::Eth, env_decimal("INITIAL_ETH_USDC_BALANCE", "10000"));
        initial_balances.insert(
            SpecificChain::Base,
            env_decimal("INITIAL_BASE_CHAIN_USDC_BALANCE", "10000"),
        );
        initial_balances.insert(
            SpecificChain::Polygon,
            env_decimal("INITIAL_POLYGON_USDC_BALANCE", "10000"),
        );
        initial_balances.insert(
            SpecificChain::Arbitrum,
            env_decimal("INITIAL_ARBITRUM_USDC_BALANCE", "10000"),
        );

        let price_freshness_ms = env_parse("PRICE_FRESHNESS_MS", 60_000i64);
        let max_trade_percentage = env_decimal("MAX_TRADE_PERCENTAGE", "25");

        let rate_limit_account_per_min = env_parse("RATE_LIMIT_ACCOUNT_PER_MIN", 30u32);
        let rate_limit_trade_per_min = env_parse("RATE_LIMIT_TRADE_PER_MIN", 10u32);
        let rate_limit_price_per_min = env_parse("RATE_LIMIT_PRICE_PER_MIN", 300u32);

        let snapshot_interval_ms = env_parse("SNAPSHOT_INTERVAL_MS", 2 * 60 * 60 * 1000u64);
        let api_key_prefix = env::var("API_KEY_PREFIX").unwrap_or_else(|_| "ts_live_".to_string());

        Ok(Self {
            database_path,
            port,
            test_mode,
            allow_cross_chain_trading,
            disable_participant_leaderboard_access,
            noves_api_key,
            initial_balances,
            price_freshness_ms,
            max_trade_percentage,
            rate_limit_account_per_min,
            rate_limit_trade_per_min,
            rate_limit_price_per_min,
            snapshot_interval_ms,
            api_key_prefix,
        })
    }

    /// Configuration appropriate for tests: in-memory DB, test mode on.
    ///
    /// Not `#[cfg(test)]`: integration tests under `tests/` compile this
    /// crate as an ordinary dependency, so a `cfg(test)` helper would be
    /// invisible to them.
    pub fn test_default() -> Self {
        let mut initial_balances = HashMap::new();
        initial_balances.insert(SpecificChain::Svm, Decimal::from_str("10000").unwrap());
        initial_balances.insert(SpecificChain::Eth, Decimal::from_str("10000").unwrap());

        Self {
            database_path: ":memory:".to_string(),
            port: 0,
            test_mode: true,
            allow_cross_chain_trading: true,
            disable_participant_leaderboard_access: false,
            noves_api_key: None,
            initial_balances,
            price_freshness_ms: 60_000,
            max_trade_percentage: Decimal::from_str("25").unwrap(),
            rate_limit_account_per_min: 30,
            rate_limit_trade_per_min: 10,
            rate_limit_price_per_min: 300,
            snapshot_interval_ms: 3_600_000,
            api_key_prefix: "ts_live_".to_string(),
        }
    }
}
