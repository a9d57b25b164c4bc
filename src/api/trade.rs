use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;

use crate::auth::CurrentTeam;
use crate::chain::{Chain, SpecificChain};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::trade::simulator::TradeRequest;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteTradeRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub from_chain: String,
    pub to_chain: String,
    #[serde(default)]
    pub from_specific_chain: Option<String>,
    #[serde(default)]
    pub to_specific_chain: Option<String>,
    pub reason: String,
}

pub async fn execute(
    CurrentTeam(team): CurrentTeam,
    State(state): State<AppState>,
    Json(req): Json<ExecuteTradeRequest>,
) -> AppResult<Json<Value>> {
    let amount = Decimal::from_str(&req.amount)
        .map_err(|_| AppError::Validation("amount must be a valid decimal string".to_string()))?;
    let from_chain = Chain::from_str_opt(&req.from_chain)
        .ok_or_else(|| AppError::Validation("fromChain must be \"evm\" or \"svm\"".to_string()))?;
    let to_chain = Chain::from_str_opt(&req.to_chain)
        .ok_or_else(|| AppError::Validation("toChain must be \"evm\" or \"svm\"".to_string()))?;
    let from_specific_chain = req
        .from_specific_chain
        .as_deref()
        .and_then(SpecificChain::from_str_opt);
    let to_specific_chain = req.to_specific_chain.as_deref().and_then(SpecificChain::from_str_opt);

    let trade = state
        .trades
        .execute_trade(
            &team,
            TradeRequest {
                from_token: req.from_token,
                to_token: req.to_token,
                amount,
                from_chain,
                to_chain,
                from_specific_chain,
                to_specific_chain,
                reason: req.reason,
            },
        )
        .await?;

    Ok(Json(json!({ "success": true, "transaction": trade })))
}
