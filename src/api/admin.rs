//! Admin-only and public-bootstrap endpoints: team registry management and
//! the competition lifecycle.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::AdminTeam;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::team::Team;

fn team_json(team: &Team, include_key: bool) -> Value {
    let mut value = serde_json::to_value(team).expect("Team always serializes");
    if include_key {
        value["apiKey"] = json!(team.api_key);
    }
    value
}

#[derive(Deserialize)]
pub struct SetupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// One-time bootstrap of the first admin team. Not part of the core
/// trading/competition engine; exists purely so a freshly-deployed server
/// has an admin to call the rest of the admin API with.
///
/// `password` is accepted and validated for non-emptiness but never stored:
/// every request after this one authenticates with the bearer API key
/// returned below, so there is nothing to hash a password against.
pub async fn setup(State(state): State<AppState>, Json(req): Json<SetupRequest>) -> AppResult<Json<Value>> {
    if state.teams.any_admin_exists().await? {
        return Err(AppError::Conflict("an admin has already been bootstrapped".to_string()));
    }
    if req.password.trim().is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let team = state
        .teams
        .register_team(req.username, req.email, "admin".to_string(), true)
        .await?;

    Ok(Json(json!({ "success": true, "admin": team_json(&team, true) })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeamRequest {
    pub team_name: String,
    pub email: String,
    pub contact_person: String,
}

pub async fn register_team(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Json(req): Json<RegisterTeamRequest>,
) -> AppResult<Json<Value>> {
    let team = state
        .teams
        .register_team(req.team_name, req.email, req.contact_person, false)
        .await?;
    Ok(Json(json!({ "success": true, "team": team_json(&team, true) })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRegisterTeamRequest {
    pub team_name: String,
    pub email: String,
    pub contact_person: String,
    pub wallet_address: String,
}

pub async fn public_register_team(
    State(state): State<AppState>,
    Json(req): Json<PublicRegisterTeamRequest>,
) -> AppResult<Json<Value>> {
    let team = state
        .teams
        .public_register_team(req.team_name, req.email, req.contact_person, req.wallet_address)
        .await?;
    Ok(Json(json!({ "success": true, "team": team_json(&team, true) })))
}

pub async fn list_teams(_admin: AdminTeam, State(state): State<AppState>) -> AppResult<Json<Value>> {
    let teams = state.teams.list_teams().await?;
    let teams: Vec<Value> = teams.iter().map(|t| team_json(t, false)).collect();
    Ok(Json(json!({ "success": true, "teams": teams })))
}

pub async fn delete_team(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.teams.delete_team(id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct DeactivateRequest {
    pub reason: String,
}

pub async fn deactivate_team(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DeactivateRequest>,
) -> AppResult<Json<Value>> {
    let team = state.teams.deactivate_team(id, req.reason).await?;
    Ok(Json(json!({ "success": true, "team": team_json(&team, false) })))
}

pub async fn reactivate_team(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let team = state.teams.reactivate_team(id).await?;
    Ok(Json(json!({ "success": true, "team": team_json(&team, false) })))
}

pub async fn reveal_key(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let api_key = state.teams.get_team_api_key(id).await?;
    Ok(Json(json!({ "success": true, "apiKey": api_key })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompetitionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create_competition(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Json(req): Json<CreateCompetitionRequest>,
) -> AppResult<Json<Value>> {
    let competition = state.competitions.create(req.name, req.description).await?;
    Ok(Json(json!({ "success": true, "competition": competition })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCompetitionRequest {
    pub competition_id: Uuid,
    pub team_ids: Vec<Uuid>,
}

pub async fn start_competition(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Json(req): Json<StartCompetitionRequest>,
) -> AppResult<Json<Value>> {
    let competition = state.competitions.start(req.competition_id, req.team_ids).await?;
    Ok(Json(json!({ "success": true, "competition": competition })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndCompetitionRequest {
    pub competition_id: Uuid,
}

pub async fn end_competition(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Json(req): Json<EndCompetitionRequest>,
) -> AppResult<Json<Value>> {
    let competition = state.competitions.end(req.competition_id).await?;
    Ok(Json(json!({ "success": true, "competition": competition })))
}

pub async fn force_snapshot(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.competitions.take_portfolio_snapshots(id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_snapshots(
    _admin: AdminTeam,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    // validate the competition exists so an unknown id surfaces as 404
    // rather than an empty snapshot list.
    state.competitions.get(id).await?;

    let snapshots = if let Some(team_id) = params.get("teamId").and_then(|s| Uuid::parse_str(s).ok()) {
        state
            .competitions
            .snapshot_history_for_team(team_id, id)
            .await?
    } else {
        state.competitions.latest_snapshots(id).await?
    };

    Ok(Json(json!({ "success": true, "snapshots": snapshots })))
}
