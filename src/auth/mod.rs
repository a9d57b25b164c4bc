//! Bearer-token authentication and role extractors.
//!
//! Grounded on the teacher's `auth/middleware.rs`, which implements
//! `FromRequestParts` for a `CurrentUser` extractor backed by a JWT; here
//! the token is an opaque bearer API key resolved through `TeamManager`'s
//! cache, and a second extractor narrows to admin-only routes.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::error::AppError;
use crate::state::AppState;
use crate::team::Team;

/// An authenticated, active team. Rejects anonymous callers and callers
/// whose team has been deactivated.
pub struct CurrentTeam(pub Team);

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeam {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("missing or invalid bearer token".to_string()))?;

        let team = state
            .teams
            .get_team_by_api_key(bearer.token())
            .await?
            .ok_or_else(|| AppError::Authentication("invalid API key".to_string()))?;

        if !team.active {
            return Err(AppError::Authorization(format!(
                "team is deactivated: {}",
                team.deactivation_reason.clone().unwrap_or_default()
            )));
        }

        Ok(CurrentTeam(team))
    }
}

/// An authenticated team with `isAdmin = true`. Deliberately does not
/// require `active`: an admin disabling their own account is not a
/// supported flow, but we do not want a stray deactivation to lock out the
/// only admin either.
pub struct AdminTeam(pub Team);

#[async_trait]
impl FromRequestParts<AppState> for AdminTeam {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("missing or invalid bearer token".to_string()))?;

        let team = state
            .teams
            .get_team_by_api_key(bearer.token())
            .await?
            .ok_or_else(|| AppError::Authentication("invalid API key".to_string()))?;

        if !team.is_admin {
            return Err(AppError::Authorization("admin access required".to_string()));
        }

        Ok(AdminTeam(team))
    }
}
