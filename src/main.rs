//! Competition server entry point: load config, open the database, build
//! every manager, and serve.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_backend::balance::BalanceManager;
use arena_backend::competition::manager::CompetitionManager;
use arena_backend::config::Config;
use arena_backend::db::competitions::CompetitionRepository;
use arena_backend::db::prices::PriceRepository;
use arena_backend::db::snapshots::SnapshotRepository;
use arena_backend::db::teams::TeamRepository;
use arena_backend::db::trades::TradeRepository;
use arena_backend::db::Database;
use arena_backend::price::providers::{DexScreenerProvider, JupiterProvider, NovesProvider, PriceProvider};
use arena_backend::price::tracker::PriceTracker;
use arena_backend::rate_limit::{RateLimiter, RateLimiterConfig};
use arena_backend::snapshot::scheduler::SnapshotScheduler;
use arena_backend::state::AppState;
use arena_backend::team::manager::TeamManager;
use arena_backend::trade::simulator::TradeSimulator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(Config::from_env()?);
    info!(port = config.port, test_mode = config.test_mode, "starting competition server");

    let db = Database::open(&config.database_path)?;

    let teams = Arc::new(TeamManager::new(TeamRepository::new(db.clone()), config.api_key_prefix.clone()));
    let balances = Arc::new(BalanceManager::new(db.clone()));

    let mut evm_providers: Vec<Arc<dyn PriceProvider>> = vec![Arc::new(DexScreenerProvider::new())];
    if let Some(key) = config.noves_api_key.clone() {
        evm_providers.push(Arc::new(NovesProvider::new(key)));
    }
    let svm_providers: Vec<Arc<dyn PriceProvider>> =
        vec![Arc::new(JupiterProvider::new()), Arc::new(DexScreenerProvider::new())];

    let prices = Arc::new(PriceTracker::new(
        PriceRepository::new(db.clone()),
        evm_providers,
        svm_providers,
        config.price_freshness_ms,
    ));

    let competitions = Arc::new(CompetitionManager::new(
        CompetitionRepository::new(db.clone()),
        SnapshotRepository::new(db.clone()),
        balances.clone(),
        teams.clone(),
        prices.clone(),
        config.clone(),
    ));

    let trades = Arc::new(TradeSimulator::new(
        db.clone(),
        competitions.clone(),
        balances.clone(),
        prices.clone(),
        TradeRepository::new(db.clone()),
        config.clone(),
    ));

    let rate_limiter = Arc::new(RateLimiter::new(RateLimiterConfig {
        account_per_min: config.rate_limit_account_per_min,
        trade_per_min: config.rate_limit_trade_per_min,
        price_per_min: config.rate_limit_price_per_min,
    }));

    let scheduler = Arc::new(SnapshotScheduler::new(competitions.clone(), config.snapshot_interval_ms));
    if !config.test_mode {
        scheduler.start();
        info!(interval_ms = config.snapshot_interval_ms, "portfolio snapshot scheduler started");
    } else {
        info!("TEST_MODE set; snapshot scheduler not auto-started");
    }

    let state = AppState {
        config: config.clone(),
        teams,
        competitions,
        balances,
        prices,
        trades,
        rate_limiter,
        scheduler,
    };

    let app = arena_backend::api::router(state);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "competition server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
