//! External price providers.
//!
//! Grounded on the teacher's `scrapers/chainlink_feed.rs` and
//! `scrapers/binance_price_feed.rs`: a `reqwest::Client` built once with a
//! bounded timeout, a narrow typed response struct, and warn-and-skip
//! handling on failure rather than propagating the error to the caller.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::chain::SpecificChain;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Chains this provider is able to serve.
    fn supports(&self, specific_chain: SpecificChain) -> bool;

    /// Fetch a positive USD price for `token` on `specific_chain`, or `None`
    /// if the provider has no data / errors / times out. Never propagates
    /// an error to the caller; failures are logged and treated as a miss so
    /// the tracker can fall through to the next provider.
    async fn get_price(&self, token: &str, specific_chain: SpecificChain) -> Option<Decimal>;
}

fn dexscreener_chain_id(specific_chain: SpecificChain) -> &'static str {
    use SpecificChain::*;
    match specific_chain {
        Eth => "ethereum",
        Base => "base",
        Polygon => "polygon",
        Arbitrum => "arbitrum",
        Optimism => "optimism",
        Bsc => "bsc",
        Avalanche => "avalanche",
        Linea => "linea",
        Zksync => "zksync",
        Scroll => "scroll",
        Mantle => "mantle",
        Svm => "solana",
    }
}

#[derive(Debug, Deserialize)]
struct DexScreenerResponse {
    #[serde(default)]
    pairs: Vec<DexScreenerPair>,
}

#[derive(Debug, Deserialize)]
struct DexScreenerPair {
    #[serde(rename = "chainId")]
    chain_id: String,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
}

/// Aggregator covering every EVM specific-chain and Solana via a single
/// multi-chain token-pairs endpoint (one provider, many chains — mirrors
/// `dome.rs`'s role as the teacher's cross-venue aggregator).
pub struct DexScreenerProvider {
    client: reqwest::Client,
}

impl DexScreenerProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(PROVIDER_TIMEOUT)
                .build()
                .expect("failed to build reqwest client"),
        }
    }
}

impl Default for DexScreenerProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for DexScreenerProvider {
    fn name(&self) -> &'static str {
        "dexscreener"
    }

    fn supports(&self, _specific_chain: SpecificChain) -> bool {
        true
    }

    async fn get_price(&self, token: &str, specific_chain: SpecificChain) -> Option<Decimal> {
        let url = format!("https://api.dexscreener.com/latest/dex/tokens/{token}");
        let wanted_chain = dexscreener_chain_id(specific_chain);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(provider = "dexscreener", error = %e, "provider request failed");
                return None;
            }
        };

        let parsed: DexScreenerResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(provider = "dexscreener", error = %e, "provider response parse failed");
                return None;
            }
        };

        parsed
            .pairs
            .into_iter()
            .find(|p| p.chain_id == wanted_chain)
            .and_then(|p| p.price_usd)
            .and_then(|p| Decimal::from_str(&p).ok())
            .filter(|p| *p > Decimal::ZERO)
    }
}

#[derive(Debug, Deserialize)]
struct JupiterResponse {
    data: std::collections::HashMap<String, JupiterPriceEntry>,
}

#[derive(Debug, Deserialize)]
struct JupiterPriceEntry {
    price: String,
}

/// Solana-only aggregator (Jupiter's price API), analogous to the teacher's
/// `scrapers/polymarket_api.rs` venue-specific REST client.
pub struct JupiterProvider {
    client: reqwest::Client,
}

impl JupiterProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(PROVIDER_TIMEOUT)
                .build()
                .expect("failed to build reqwest client"),
        }
    }
}

impl Default for JupiterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for JupiterProvider {
    fn name(&self) -> &'static str {
        "jupiter"
    }

    fn supports(&self, specific_chain: SpecificChain) -> bool {
        specific_chain == SpecificChain::Svm
    }

    async fn get_price(&self, token: &str, specific_chain: SpecificChain) -> Option<Decimal> {
        if specific_chain != SpecificChain::Svm {
            return None;
        }
        let url = format!("https://price.jup.ag/v4/price?ids={token}");
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(provider = "jupiter", error = %e, "provider request failed");
                return None;
            }
        };
        let parsed: JupiterResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(provider = "jupiter", error = %e, "provider response parse failed");
                return None;
            }
        };
        parsed
            .data
            .get(token)
            .and_then(|entry| Decimal::from_str(&entry.price).ok())
            .filter(|p| *p > Decimal::ZERO)
    }
}

/// Noves-backed EVM provider, gated on `NOVES_API_KEY` being configured.
/// Mirrors the teacher's pattern of a provider that only activates when its
/// API key is present (see `hashdive_api.rs`/`HASHDIVE_API_KEY`).
pub struct NovesProvider {
    client: reqwest::Client,
    api_key: String,
}

impl NovesProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(PROVIDER_TIMEOUT)
                .build()
                .expect("failed to build reqwest client"),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NovesPriceResponse {
    #[serde(rename = "priceUsd")]
    price_usd: Option<f64>,
}

#[async_trait]
impl PriceProvider for NovesProvider {
    fn name(&self) -> &'static str {
        "noves"
    }

    fn supports(&self, _specific_chain: SpecificChain) -> bool {
        true
    }

    async fn get_price(&self, token: &str, specific_chain: SpecificChain) -> Option<Decimal> {
        let url = format!(
            "https://pricing.noves.fi/{}/price/{token}",
            dexscreener_chain_id(specific_chain)
        );
        let response = match self
            .client
            .get(&url)
            .header("apiKey", &self.api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(provider = "noves", error = %e, "provider request failed");
                return None;
            }
        };
        let parsed: NovesPriceResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                debug!(provider = "noves", error = %e, "provider response parse failed");
                return None;
            }
        };
        parsed
            .price_usd
            .and_then(|p| Decimal::from_str(&p.to_string()).ok())
            .filter(|p| *p > Decimal::ZERO)
    }
}
