use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentTeam;
use crate::error::AppResult;
use crate::state::AppState;

fn team_json(team: &crate::team::Team) -> Value {
    serde_json::to_value(team).expect("Team always serializes")
}

pub async fn get_profile(CurrentTeam(team): CurrentTeam) -> Json<Value> {
    Json(json!({ "success": true, "team": team_json(&team) }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

pub async fn update_profile(
    CurrentTeam(team): CurrentTeam,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<Value>> {
    let team = state
        .teams
        .update_profile(team.id, req.contact_person, req.metadata)
        .await?;
    Ok(Json(json!({ "success": true, "team": team_json(&team) })))
}

pub async fn get_balances(
    CurrentTeam(team): CurrentTeam,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let balances = state.balances.get_balances(team.id).await?;
    Ok(Json(json!({ "success": true, "balances": balances })))
}

pub async fn get_portfolio(
    CurrentTeam(team): CurrentTeam,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let balances = state.balances.get_balances(team.id).await?;
    let mut total = rust_decimal::Decimal::ZERO;
    let mut holdings = Vec::new();
    for balance in balances {
        if let Some(price) = state
            .prices
            .get_price(&balance.token, Some(balance.chain), Some(balance.specific_chain))
            .await?
        {
            let value_usd = balance.amount * price.price_usd;
            total += value_usd;
            holdings.push(json!({
                "token": balance.token,
                "specificChain": balance.specific_chain,
                "amount": balance.amount,
                "priceUsd": price.price_usd,
                "valueUsd": value_usd,
            }));
        }
    }
    Ok(Json(json!({ "success": true, "totalValueUsd": total, "holdings": holdings })))
}

pub async fn get_trades(
    CurrentTeam(team): CurrentTeam,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let trades = state.trades.history_for_team(team.id).await?;
    Ok(Json(json!({ "success": true, "trades": trades })))
}
