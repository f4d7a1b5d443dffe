//! WebSocket connection handling
//!
//! A client identifies itself with headers on the upgrade request:
//!
//! | Header        | Required | Meaning                              |
//! |---------------|----------|--------------------------------------|
//! | `User-Id`     | yes      | Id of the bot user                   |
//! | `Client-Name` | no       | Free-form client identifier          |
//! | `Session-Id`  | no       | Session to resume instead of opening |
//!
//! A resume that cannot be honoured falls back to a fresh session; the
//! `ready` message tells the client which one it got.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::StreamExt;
use tracing::{debug, info, warn};

use cadence_core::{SessionContext, Transport};
use cadence_plugin_api::{ContextError, SessionId, UserId};

use super::transport::WsTransport;
use crate::AppState;
use crate::error::ServerError;

/// Identity a client presents when connecting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub user_id: UserId,
    pub client_name: Option<String>,
    pub session_id: Option<SessionId>,
}

impl Handshake {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServerError> {
        let user_id = header(headers, "user-id")
            .ok_or_else(|| ServerError::BadRequest("missing User-Id header".to_string()))?;
        let user_id = UserId::from_str(user_id)
            .map_err(|_| ServerError::BadRequest(format!("invalid User-Id header: {user_id}")))?;

        let session_id = match header(headers, "session-id") {
            Some(value) => Some(SessionId::from_str(value).map_err(|_| {
                ServerError::BadRequest(format!("invalid Session-Id header: {value}"))
            })?),
            None => None,
        };

        Ok(Self {
            user_id,
            client_name: header(headers, "client-name").map(str::to_string),
            session_id,
        })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ServerError> {
    let handshake = Handshake::from_headers(&headers)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, handshake)))
}

/// Drive one WebSocket until the client goes away
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, handshake: Handshake) {
    let (sink, mut stream) = socket.split();
    let transport: Arc<dyn Transport> = Arc::new(WsTransport::new(sink));

    let session = match open_or_resume(&state, handshake, transport).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Failed to set up session for WebSocket");
            return;
        }
    };
    let session_id = session.session_id();
    let Some(attachment) = session.attachment() else {
        return;
    };

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                state.controller.on_transport_message(session_id, &text);
            }
            Ok(Message::Close(frame)) => {
                debug!(session_id = %session_id, ?frame, "Client closed WebSocket");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state
        .controller
        .on_transport_closed(session_id, attachment)
        .await;
}

async fn open_or_resume(
    state: &AppState,
    handshake: Handshake,
    transport: Arc<dyn Transport>,
) -> Result<Arc<SessionContext>, ContextError> {
    if let Some(session_id) = handshake.session_id {
        match state
            .controller
            .resume(session_id, Arc::clone(&transport))
            .await
        {
            Ok(session) => return Ok(session),
            Err(e) => {
                info!(session_id = %session_id, reason = %e, "Resume refused, opening new session");
            }
        }
    }

    state
        .controller
        .open(handshake.user_id, handshake.client_name, transport)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn handshake_reads_all_headers() {
        let handshake = Handshake::from_headers(&headers(&[
            ("user-id", "42"),
            ("client-name", "bot/1.0"),
            ("session-id", "99"),
        ]))
        .unwrap();

        assert_eq!(
            handshake,
            Handshake {
                user_id: UserId(42),
                client_name: Some("bot/1.0".to_string()),
                session_id: Some(SessionId(99)),
            }
        );
    }

    #[test]
    fn handshake_requires_user_id() {
        let err = Handshake::from_headers(&headers(&[("client-name", "bot")])).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));

        let err = Handshake::from_headers(&headers(&[("user-id", "not-a-number")])).unwrap_err();
        assert!(err.to_string().contains("invalid User-Id"));
    }

    #[test]
    fn handshake_rejects_bad_session_id() {
        let err = Handshake::from_headers(&headers(&[("user-id", "1"), ("session-id", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn blank_optional_headers_are_ignored() {
        let handshake =
            Handshake::from_headers(&headers(&[("user-id", "1"), ("client-name", "  ")])).unwrap();
        assert_eq!(handshake.client_name, None);
        assert_eq!(handshake.session_id, None);
    }
}
