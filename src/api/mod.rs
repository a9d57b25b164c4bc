//! HTTP surface: router assembly.
//!
//! Grounded on the teacher's `main.rs` router construction — nested route
//! groups, a shared `AppState`, and `tower_http`'s `TraceLayer`/`CorsLayer`
//! wrapping everything.

pub mod account;
pub mod admin;
pub mod competition;
pub mod health;
pub mod price;
pub mod trade;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/setup", post(admin::setup))
        .route("/admin/teams/register", post(admin::register_team))
        .route("/admin/teams", get(admin::list_teams))
        .route("/admin/teams/:id", delete(admin::delete_team))
        .route("/admin/teams/:id/deactivate", post(admin::deactivate_team))
        .route("/admin/teams/:id/reactivate", post(admin::reactivate_team))
        .route("/admin/teams/:id/key", get(admin::reveal_key))
        .route("/admin/competition/create", post(admin::create_competition))
        .route("/admin/competition/start", post(admin::start_competition))
        .route("/admin/competition/end", post(admin::end_competition))
        .route("/admin/competition/:id/snapshot", post(admin::force_snapshot))
        .route("/admin/competition/:id/snapshots", get(admin::list_snapshots));

    let public_routes = Router::new().route("/public/teams/register", post(admin::public_register_team));

    let account_routes = Router::new()
        .route("/account/profile", get(account::get_profile))
        .route("/account/profile", put(account::update_profile))
        .route("/account/balances", get(account::get_balances))
        .route("/account/portfolio", get(account::get_portfolio))
        .route("/account/trades", get(account::get_trades));

    let trade_routes = Router::new().route("/trade/execute", post(trade::execute));

    let price_routes = Router::new()
        .route("/price", get(price::get_price))
        .route("/price/token-info", get(price::get_token_info));

    let competition_routes = Router::new()
        .route("/competition/status", get(competition::status))
        .route("/competition/leaderboard", get(competition::leaderboard))
        .route("/competition/rules", get(competition::rules));

    let api_routes = Router::new()
        .merge(admin_routes)
        .merge(public_routes)
        .merge(account_routes)
        .merge(trade_routes)
        .merge(price_routes)
        .merge(competition_routes);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn_with_state(state.clone(), crate::middleware::rate_limit))
        .layer(axum::middleware::from_fn(crate::middleware::request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
