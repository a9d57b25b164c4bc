//! Per-(identity, route-class) token-bucket rate limiting.
//!
//! Grounded on the teacher's `middleware/rate_limit.rs`, which keys a
//! per-IP fixed-window counter off a `DashMap`-style guarded table; here the
//! key is (team id or source IP, route class) so one team's bucket never
//! drains another's, per the isolation rule in the concurrency model.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Account,
    Trade,
    Price,
    Health,
    Other,
}

impl RouteClass {
    pub fn from_path(path: &str) -> Self {
        if path.starts_with("/health") {
            RouteClass::Health
        } else if path.starts_with("/api/trade") {
            RouteClass::Trade
        } else if path.starts_with("/api/price") {
            RouteClass::Price
        } else if path.starts_with("/api/account") {
            RouteClass::Account
        } else {
            RouteClass::Other
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Account => "account",
            RouteClass::Trade => "trade",
            RouteClass::Price => "price",
            RouteClass::Health => "health",
            RouteClass::Other => "other",
        }
    }
}

struct Window {
    start_ms: i64,
    count: u32,
}

const WINDOW_MS: i64 = 60_000;

pub struct RateLimiterConfig {
    pub account_per_min: u32,
    pub trade_per_min: u32,
    pub price_per_min: u32,
}

pub struct RateLimiter {
    config: RateLimiterConfig,
    buckets: RwLock<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self { config, buckets: RwLock::new(HashMap::new()) }
    }

    fn limit_for(&self, class: RouteClass) -> Option<u32> {
        match class {
            RouteClass::Account => Some(self.config.account_per_min),
            RouteClass::Trade => Some(self.config.trade_per_min),
            RouteClass::Price => Some(self.config.price_per_min),
            RouteClass::Health => None,
            RouteClass::Other => Some(self.config.account_per_min),
        }
    }

    /// `identity` is the team id for authenticated callers, or the source
    /// IP for anonymous ones.
    pub fn check(&self, identity: &str, class: RouteClass) -> Result<(), AppError> {
        let Some(limit) = self.limit_for(class) else {
            return Ok(());
        };

        let key = format!("{identity}:{}", class.as_str());
        let now_ms = Utc::now().timestamp_millis();

        let mut buckets = self.buckets.write();
        let window = buckets.entry(key).or_insert(Window { start_ms: now_ms, count: 0 });
        if now_ms - window.start_ms >= WINDOW_MS {
            window.start_ms = now_ms;
            window.count = 0;
        }
        window.count += 1;

        if window.count > limit {
            let reset_at_ms = window.start_ms + WINDOW_MS;
            let retry_after_secs = ((reset_at_ms - now_ms).max(1_000) / 1_000) as u64;
            return Err(AppError::RateLimited {
                message: format!("Rate limit exceeded: {} requests per minute for {}", limit, class.as_str()),
                retry_after_secs,
                reset_at_ms: reset_at_ms as u64,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig { account_per_min: 2, trade_per_min: 1, price_per_min: 300 })
    }

    #[test]
    fn isolates_buckets_per_team() {
        let rl = limiter();
        assert!(rl.check("team-a", RouteClass::Trade).is_ok());
        assert!(rl.check("team-a", RouteClass::Trade).is_err());
        assert!(rl.check("team-b", RouteClass::Trade).is_ok());
    }

    #[test]
    fn health_is_exempt() {
        let rl = limiter();
        for _ in 0..50 {
            assert!(rl.check("anyone", RouteClass::Health).is_ok());
        }
    }

    #[test]
    fn exceeding_limit_reports_retry_after() {
        let rl = limiter();
        rl.check("team-a", RouteClass::Account).unwrap();
        rl.check("team-a", RouteClass::Account).unwrap();
        let err = rl.check("team-a", RouteClass::Account).unwrap_err();
        match err {
            AppError::RateLimited { retry_after_secs, .. } => assert!(retry_after_secs >= 1),
            _ => panic!("expected RateLimited"),
        }
    }
}
