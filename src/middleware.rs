//! Request-level middleware: rate limiting and request logging ahead of
//! every handler.
//!
//! Grounded on the teacher's `middleware/rate_limit.rs` tower layer style,
//! rewritten as an `axum::middleware::from_fn_with_state` function since
//! the bucket key now depends on the resolved team identity, not just the
//! connection's source address.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::AppError;
use crate::rate_limit::RouteClass;
use crate::state::AppState;

/// Logs method, path, status, and latency for every request except `/health`.
///
/// Mirrors the teacher's `middleware/logging.rs::request_logging`, minus the
/// per-span `Empty` fields, since this crate's `TraceLayer` already opens a
/// span per request; this just adds the summary log line at the end.
pub async fn request_logging(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if path == "/health" {
        return next.run(req).await;
    }

    let start = Instant::now();
    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    if status >= 500 {
        warn!(%method, %path, status, latency_ms, client_ip = %addr.ip(), "request failed");
    } else {
        info!(%method, %path, status, latency_ms, "request completed");
    }

    response
}

pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let class = RouteClass::from_path(req.uri().path());

    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let identity = match bearer {
        Some(token) => match state.teams.get_team_by_api_key(token).await? {
            Some(team) => team.id.to_string(),
            None => addr.ip().to_string(),
        },
        None => addr.ip().to_string(),
    };

    state.rate_limiter.check(&identity, class)?;
    Ok(next.run(req).await)
}
