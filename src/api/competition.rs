use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::CurrentTeam;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn status(CurrentTeam(team): CurrentTeam, State(state): State<AppState>) -> AppResult<Json<Value>> {
    let Some(competition) = state.competitions.get_active_competition().await? else {
        return Ok(Json(json!({ "success": true, "competition": null })));
    };

    if team.is_admin || state.competitions.is_member(competition.id, team.id).await? {
        Ok(Json(json!({ "success": true, "competition": competition, "participating": true })))
    } else {
        Ok(Json(json!({
            "success": true,
            "competition": { "id": competition.id, "name": competition.name, "status": competition.status },
            "message": "Your team is not participating in this competition",
        })))
    }
}

pub async fn leaderboard(
    CurrentTeam(team): CurrentTeam,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    if state.config.disable_participant_leaderboard_access && !team.is_admin {
        return Err(AppError::Authorization(
            "leaderboard access is restricted to administrators".to_string(),
        ));
    }

    let competition = state
        .competitions
        .get_active_competition()
        .await?
        .ok_or_else(|| AppError::NotFound("no active competition".to_string()))?;

    let leaderboard = state.competitions.get_leaderboard(competition.id).await?;
    Ok(Json(json!({ "success": true, "leaderboard": leaderboard })))
}

/// The slippage model and other trading parameters, published so clients
/// can reason about expected fills. Not part of the core engine; exists so
/// `/api/competition/rules` has a body to return.
pub async fn rules() -> Json<Value> {
    Json(json!({
        "success": true,
        "rules": {
            "slippageFormula": "slippage_bps = min(500, trade_size_pct_of_portfolio * 5); effectivePrice = toPriceUsd * (1 + slippage_bps / 10000)",
            "maxTradePercentage": "configured via MAX_TRADE_PERCENTAGE, applied against current portfolio value",
            "crossChainTrading": "gated by both the competition's crossChainTradingEnabled flag and ALLOW_CROSS_CHAIN_TRADING",
        }
    }))
}
