use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::chain::SpecificChain;
use crate::db::Database;

pub struct CachedPrice {
    pub price_usd: Decimal,
    pub fetched_at: DateTime<Utc>,
    pub provider: String,
}

pub struct PriceRepository {
    db: Database,
}

impl PriceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(
        &self,
        token: String,
        specific_chain: SpecificChain,
    ) -> rusqlite::Result<Option<CachedPrice>> {
        let specific_chain_str = specific_chain.as_str();
        self.db
            .call(move |conn: &Connection| {
                conn.query_row(
                    "SELECT price_usd, fetched_at, provider FROM prices WHERE token = ?1 AND specific_chain = ?2",
                    params![token, specific_chain_str],
                    |row| {
                        let price_usd: String = row.get(0)?;
                        let fetched_at: String = row.get(1)?;
                        let provider: String = row.get(2)?;
                        Ok((price_usd, fetched_at, provider))
                    },
                )
                .optional()
                .map(|opt| {
                    opt.and_then(|(price_usd, fetched_at, provider)| {
                        Some(CachedPrice {
                            price_usd: Decimal::from_str(&price_usd).ok()?,
                            fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
                                .ok()?
                                .with_timezone(&Utc),
                            provider,
                        })
                    })
                })
            })
            .await
    }

    pub async fn upsert(
        &self,
        token: String,
        specific_chain: SpecificChain,
        price_usd: Decimal,
        provider: String,
    ) -> rusqlite::Result<()> {
        let specific_chain_str = specific_chain.as_str();
        self.db
            .call(move |conn: &Connection| {
                conn.execute(
                    "INSERT INTO prices (token, specific_chain, price_usd, fetched_at, provider) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(token, specific_chain) DO UPDATE SET \
                       price_usd = ?3, fetched_at = ?4, provider = ?5",
                    params![
                        token,
                        specific_chain_str,
                        price_usd.to_string(),
                        Utc::now().to_rfc3339(),
                        provider,
                    ],
                )?;
                Ok(())
            })
            .await
    }
}
