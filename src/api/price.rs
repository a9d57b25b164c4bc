use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentTeam;
use crate::chain::{Chain, SpecificChain};
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    pub token: String,
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub specific_chain: Option<String>,
}

pub async fn get_price(
    _team: CurrentTeam,
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> AppResult<Json<Value>> {
    let chain_hint = query.chain.as_deref().and_then(Chain::from_str_opt);
    let specific_chain_hint = query.specific_chain.as_deref().and_then(SpecificChain::from_str_opt);

    let price = state.prices.get_price(&query.token, chain_hint, specific_chain_hint).await?;
    match price {
        Some(p) => Ok(Json(json!({ "success": true, "price": p }))),
        None => Ok(Json(json!({ "success": true, "price": null }))),
    }
}

pub async fn get_token_info(
    _team: CurrentTeam,
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> AppResult<Json<Value>> {
    let chain_hint = query.chain.as_deref().and_then(Chain::from_str_opt);
    let specific_chain_hint = query.specific_chain.as_deref().and_then(SpecificChain::from_str_opt);

    let info = state
        .prices
        .get_token_info(&query.token, chain_hint, specific_chain_hint)
        .await?;
    Ok(Json(json!({ "success": true, "tokenInfo": info })))
}
