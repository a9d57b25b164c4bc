//! Price tracker: cache-first resolution with provider fan-out and fallback.
//!
//! Grounded on the teacher's scraper-orchestration style in `main.rs`
//! (multiple feeds registered against `AppState`, tried/consulted in a
//! fixed declared order) generalized into an explicit, testable component
//! per the re-architecture guidance in spec.md §9: no hidden global
//! singleton, fan-out is bounded and explicit, first positive result wins.

use chrono::Utc;
use parking_lot::Mutex as SyncMutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::chain::{determine_chain, Chain, SpecificChain, EVM_SPECIFIC_CHAIN_CANDIDATES};
use crate::db::prices::PriceRepository;
use crate::error::{AppError, AppResult};
use crate::price::providers::PriceProvider;
use crate::price::{PriceResult, TokenInfo};

type FetchKey = (String, SpecificChain);

pub struct PriceTracker {
    repo: PriceRepository,
    evm_providers: Vec<Arc<dyn PriceProvider>>,
    svm_providers: Vec<Arc<dyn PriceProvider>>,
    freshness_ms: i64,
    /// Per-(token, specificChain) fetch locks: the first caller for a key
    /// performs the upstream fetch while concurrent callers await the same
    /// lock, then re-read the now-fresh cache instead of double-fetching.
    fetch_locks: SyncMutex<HashMap<FetchKey, Arc<AsyncMutex<()>>>>,
}

impl PriceTracker {
    pub fn new(
        repo: PriceRepository,
        evm_providers: Vec<Arc<dyn PriceProvider>>,
        svm_providers: Vec<Arc<dyn PriceProvider>>,
        freshness_ms: i64,
    ) -> Self {
        Self {
            repo,
            evm_providers,
            svm_providers,
            freshness_ms,
            fetch_locks: SyncMutex::new(HashMap::new()),
        }
    }

    fn providers_for(&self, chain: Chain) -> &[Arc<dyn PriceProvider>] {
        match chain {
            Chain::Evm => &self.evm_providers,
            Chain::Svm => &self.svm_providers,
        }
    }

    fn fetch_lock(&self, key: FetchKey) -> Arc<AsyncMutex<()>> {
        self.fetch_locks
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn cached_if_fresh(&self, token: &str, specific_chain: SpecificChain) -> Option<PriceResult> {
        let cached = self.repo.get(token.to_string(), specific_chain).await.ok()??;
        let age_ms = (Utc::now() - cached.fetched_at).num_milliseconds();
        if age_ms <= self.freshness_ms {
            debug!(token, specific_chain = %specific_chain, "Using fresh price for token from DB");
            Some(PriceResult {
                token: token.to_string(),
                chain: specific_chain.chain(),
                specific_chain,
                price_usd: cached.price_usd,
                fetched_at: cached.fetched_at,
                provider: cached.provider,
            })
        } else {
            None
        }
    }

    async fn fetch_from_providers(
        &self,
        token: &str,
        specific_chain: SpecificChain,
    ) -> Option<PriceResult> {
        let key = (token.to_string(), specific_chain);
        let lock = self.fetch_lock(key.clone());
        let _guard = lock.lock().await;

        // Another caller may have populated the cache while we waited.
        if let Some(fresh) = self.cached_if_fresh(token, specific_chain).await {
            return Some(fresh);
        }

        for provider in self.providers_for(specific_chain.chain()) {
            if !provider.supports(specific_chain) {
                continue;
            }
            if let Some(price) = provider.get_price(token, specific_chain).await {
                if price > Decimal::ZERO {
                    let _ = self
                        .repo
                        .upsert(token.to_string(), specific_chain, price, provider.name().to_string())
                        .await;
                    return Some(PriceResult {
                        token: token.to_string(),
                        chain: specific_chain.chain(),
                        specific_chain,
                        price_usd: price,
                        fetched_at: Utc::now(),
                        provider: provider.name().to_string(),
                    });
                }
            }
        }
        None
    }

    /// Resolve a token's price. If `specific_chain_hint` is absent and the
    /// token is EVM, candidate specific-chains are tried in the declared
    /// order (`EVM_SPECIFIC_CHAIN_CANDIDATES`) until one yields a price,
    /// learning the specific chain.
    pub async fn get_price(
        &self,
        token: &str,
        chain_hint: Option<Chain>,
        specific_chain_hint: Option<SpecificChain>,
    ) -> AppResult<Option<PriceResult>> {
        let chain = specific_chain_hint
            .map(|sc| sc.chain())
            .or(chain_hint)
            .or_else(|| determine_chain(token))
            .ok_or_else(|| AppError::Validation(format!("cannot determine chain for token {token}")))?;

        if let Some(specific_chain) = specific_chain_hint {
            if let Some(fresh) = self.cached_if_fresh(token, specific_chain).await {
                return Ok(Some(fresh));
            }
            return Ok(self.fetch_from_providers(token, specific_chain).await);
        }

        match chain {
            Chain::Svm => {
                if let Some(fresh) = self.cached_if_fresh(token, SpecificChain::Svm).await {
                    return Ok(Some(fresh));
                }
                Ok(self.fetch_from_providers(token, SpecificChain::Svm).await)
            }
            Chain::Evm => {
                for candidate in EVM_SPECIFIC_CHAIN_CANDIDATES {
                    if let Some(fresh) = self.cached_if_fresh(token, *candidate).await {
                        return Ok(Some(fresh));
                    }
                }
                for candidate in EVM_SPECIFIC_CHAIN_CANDIDATES {
                    if let Some(result) = self.fetch_from_providers(token, *candidate).await {
                        return Ok(Some(result));
                    }
                }
                Ok(None)
            }
        }
    }

    pub async fn get_token_info(
        &self,
        token: &str,
        chain_hint: Option<Chain>,
        specific_chain_hint: Option<SpecificChain>,
    ) -> AppResult<TokenInfo> {
        let price = self.get_price(token, chain_hint, specific_chain_hint).await?;
        let chain = specific_chain_hint
            .map(|sc| sc.chain())
            .or(chain_hint)
            .or_else(|| determine_chain(token))
            .ok_or_else(|| AppError::Validation(format!("cannot determine chain for token {token}")))?;
        let specific_chain = price
            .as_ref()
            .map(|p| p.specific_chain)
            .or(specific_chain_hint)
            .unwrap_or(match chain {
                Chain::Svm => SpecificChain::Svm,
                Chain::Evm => SpecificChain::Eth,
            });

        Ok(TokenInfo {
            token: token.to_string(),
            chain,
            specific_chain,
            price_usd: price.map(|p| p.price_usd),
            symbol: None,
            name: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use async_trait::async_trait;

    struct AlwaysPrice(Decimal);

    #[async_trait]
    impl PriceProvider for AlwaysPrice {
        fn name(&self) -> &'static str {
            "test-provider"
        }
        fn supports(&self, _specific_chain: SpecificChain) -> bool {
            true
        }
        async fn get_price(&self, _token: &str, _specific_chain: SpecificChain) -> Option<Decimal> {
            Some(self.0)
        }
    }

    struct NeverPrice;

    #[async_trait]
    impl PriceProvider for NeverPrice {
        fn name(&self) -> &'static str {
            "never"
        }
        fn supports(&self, _specific_chain: SpecificChain) -> bool {
            true
        }
        async fn get_price(&self, _token: &str, _specific_chain: SpecificChain) -> Option<Decimal> {
            None
        }
    }

    fn test_tracker(db: Database) -> PriceTracker {
        PriceTracker::new(
            PriceRepository::new(db),
            vec![Arc::new(NeverPrice), Arc::new(AlwaysPrice(Decimal::new(150, 2)))],
            vec![Arc::new(AlwaysPrice(Decimal::new(2000, 2)))],
            60_000,
        )
    }

    #[tokio::test]
    async fn falls_back_to_second_provider() {
        let db = Database::open(":memory:").unwrap();
        let tracker = test_tracker(db);
        let result = tracker
            .get_price(
                "0x1234567890123456789012345678901234567890",
                None,
                Some(SpecificChain::Eth),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.provider, "test-provider");
        assert_eq!(result.price_usd, Decimal::new(150, 2));
    }

    #[tokio::test]
    async fn caches_subsequent_lookups() {
        let db = Database::open(":memory:").unwrap();
        let tracker = test_tracker(db);
        let token = "0x1234567890123456789012345678901234567890";
        let first = tracker.get_price(token, None, Some(SpecificChain::Eth)).await.unwrap().unwrap();
        let second = tracker.get_price(token, None, Some(SpecificChain::Eth)).await.unwrap().unwrap();
        assert_eq!(first.price_usd, second.price_usd);
        assert_eq!(second.provider, "test-provider");
    }

    #[tokio::test]
    async fn svm_token_uses_svm_providers() {
        let db = Database::open(":memory:").unwrap();
        let tracker = test_tracker(db);
        let result = tracker
            .get_price("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.specific_chain, SpecificChain::Svm);
        assert_eq!(result.price_usd, Decimal::new(2000, 2));
    }
}
