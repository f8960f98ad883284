//! `/ws`: real-time notifications for connected staff sessions.
//!
//! A session authenticates once at upgrade time (Authorization header or `?token=`), joins
//! the topic for its role and then receives every event published there as a JSON text frame
//! `{ "event": ..., "payload": ... }`. Client frames other than close are ignored.

use crate::{ApiError, AppState};
use api_shared::AuthError;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::Response;
use medairon_core::{Caller, CoreError, Topic, TopicRegistry};
use medairon_types::Role;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// The topic a caller's sessions join.
fn session_topic(caller: &Caller) -> Result<Topic, ApiError> {
    match caller.role {
        Role::Admin => Ok(Topic::admins()),
        role => Topic::personal(role, caller.id).ok_or_else(|| {
            ApiError::Core(CoreError::Forbidden(format!(
                "role {role} has no notification topic"
            )))
        }),
    }
}

pub(crate) async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let caller = match (header, query.token.as_deref()) {
        (Some(header), _) => state.auth.authenticate_header(Some(header))?,
        (None, Some(token)) => state.auth.authenticate_token(token)?,
        (None, None) => return Err(AuthError::MissingToken.into()),
    };
    let topic = session_topic(&caller)?;

    let registry = state.registry.clone();
    Ok(ws.on_upgrade(move |socket| session(socket, registry, caller, topic)))
}

async fn session(mut socket: WebSocket, registry: Arc<TopicRegistry>, caller: Caller, topic: Topic) {
    let (connection, mut events) = registry.connect();
    if let Err(e) = registry.subscribe(connection, topic.clone()) {
        tracing::warn!(connection = %connection, "could not join {}: {}", topic, e);
        registry.disconnect(connection);
        return;
    }
    tracing::info!(connection = %connection, caller = %caller.id, topic = %topic, "session connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(connection = %connection, "dropping unencodable event: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.disconnect(connection);
    tracing::info!(connection = %connection, topic = %topic, "session closed");
}
