//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::SwapError;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    /// Bearer token for clients that cannot set headers (browsers).
    pub token: Option<String>,
}

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// The caller is identified by `Authorization: Bearer <token>` or, failing
/// that, a `token` query parameter.
///
/// # Errors
///
/// Returns [`SwapError::Unauthenticated`] before upgrading if no valid
/// token is supplied.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsAuthQuery>,
) -> Result<impl IntoResponse, SwapError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .or(query.token)
        .ok_or_else(|| SwapError::Unauthenticated("missing bearer token".into()))?;
    let user = state.auth.authenticate(token.trim())?;

    let event_rx = state.event_bus.subscribe();
    tracing::debug!(%user, "ws upgrade accepted");
    Ok(ws.on_upgrade(move |socket| run_connection(socket, user, event_rx)))
}
