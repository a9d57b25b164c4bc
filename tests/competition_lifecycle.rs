//! End-to-end competition lifecycle: bootstrap an admin, register a team,
//! create and start a competition, execute a trade, force a snapshot, and
//! read the leaderboard back, all through the real HTTP router.
//!
//! Grounded on the teacher's `tests/backtest_run_integration.rs` style of
//! driving real components directly rather than mocking them; since this
//! crate's "component" is an HTTP service, the entry point is
//! `tower::ServiceExt::oneshot` against the in-memory `axum::Router` instead
//! of a CLI subprocess.

use std::net::SocketAddr;
use std::sync::Arc;

use arena_backend::api;
use arena_backend::balance::BalanceManager;
use arena_backend::chain::SpecificChain;
use arena_backend::competition::manager::CompetitionManager;
use arena_backend::config::Config;
use arena_backend::db::competitions::CompetitionRepository;
use arena_backend::db::prices::PriceRepository;
use arena_backend::db::snapshots::SnapshotRepository;
use arena_backend::db::teams::TeamRepository;
use arena_backend::db::trades::TradeRepository;
use arena_backend::db::Database;
use arena_backend::price::providers::PriceProvider;
use arena_backend::price::tracker::PriceTracker;
use arena_backend::rate_limit::{RateLimiter, RateLimiterConfig};
use arena_backend::snapshot::scheduler::SnapshotScheduler;
use arena_backend::state::AppState;
use arena_backend::team::manager::TeamManager;
use arena_backend::trade::simulator::TradeSimulator;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Returns a fixed USD price for any token on any chain, so trades and
/// snapshots can be valued without a network call.
struct FixedPrice(Decimal);

#[async_trait]
impl PriceProvider for FixedPrice {
    fn name(&self) -> &'static str {
        "fixed-test-price"
    }

    fn supports(&self, _specific_chain: SpecificChain) -> bool {
        true
    }

    async fn get_price(&self, _token: &str, _specific_chain: SpecificChain) -> Option<Decimal> {
        Some(self.0)
    }
}

fn test_app() -> axum::Router {
    let config = Arc::new(Config::test_default());
    let db = Database::open(":memory:").expect("open in-memory db");

    let teams = Arc::new(TeamManager::new(TeamRepository::new(db.clone()), config.api_key_prefix.clone()));
    let balances = Arc::new(BalanceManager::new(db.clone()));

    let prices = Arc::new(PriceTracker::new(
        PriceRepository::new(db.clone()),
        vec![Arc::new(FixedPrice(Decimal::new(100, 2)))],
        vec![Arc::new(FixedPrice(Decimal::new(100, 2)))],
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

    // Never started: test_mode is on and nothing in this test awaits a tick.
    let scheduler = Arc::new(SnapshotScheduler::new(competitions.clone(), config.snapshot_interval_ms));

    let state = AppState { config, teams, competitions, balances, prices, trades, rate_limiter, scheduler };
    api::router(state)
}

/// `ConnectInfo` is normally populated by `into_make_service_with_connect_info`;
/// `oneshot` bypasses that, so tests insert it as a request extension instead.
fn request(method: &str, path: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 0))));
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn full_competition_lifecycle() {
    let app = test_app();

    // 1. bootstrap the first admin.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/setup",
            None,
            Some(json!({ "username": "root-admin", "password": "correct horse battery staple", "email": "admin@example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    let admin_key = body["admin"]["apiKey"].as_str().unwrap().to_string();

    // a second bootstrap attempt is rejected.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/setup",
            None,
            Some(json!({ "username": "again", "password": "whatever whatever whatever", "email": "again@example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 2. register a participant team.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/teams/register",
            Some(&admin_key),
            Some(json!({ "teamName": "Team Rocket", "email": "team@example.com", "contactPerson": "Jessie" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let team_id = body["team"]["id"].as_str().unwrap().to_string();
    let team_key = body["team"]["apiKey"].as_str().unwrap().to_string();

    // 3. create and start a competition seeding the new team's balances.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/competition/create",
            Some(&admin_key),
            Some(json!({ "name": "Spring Invitational" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let competition_id = body["competition"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/competition/start",
            Some(&admin_key),
            Some(json!({ "competitionId": competition_id, "teamIds": [team_id] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["competition"]["status"], json!("ACTIVE"));

    // 4. the team can see its seeded balances.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/account/balances", Some(&team_key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let balances = body["balances"].as_array().unwrap();
    assert!(!balances.is_empty(), "competition start should seed at least one chain's balance");

    // 5. execute a trade between the two seeded USDC addresses.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/trade/execute",
            Some(&team_key),
            Some(json!({
                "fromToken": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                "toToken": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "amount": "100",
                "fromChain": "evm",
                "toChain": "svm",
                "fromSpecificChain": "eth",
                "toSpecificChain": "svm",
                "reason": "integration test trade",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["transaction"]["success"], json!(true));

    // 6. an admin can force a snapshot, and the leaderboard reflects it.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/admin/competition/{competition_id}/snapshot"),
            Some(&admin_key),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/competition/leaderboard", Some(&team_key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let entries = body["leaderboard"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["teamId"], json!(team_id));

    // 7. ending the competition deactivates the team.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/competition/end",
            Some(&admin_key),
            Some(json!({ "competitionId": competition_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/account/balances", Some(&team_key), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unauthenticated_request_is_rejected() {
    let app = test_app();
    let response = app.oneshot(request("GET", "/api/account/profile", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_does_not_require_auth() {
    let app = test_app();
    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
