//! Server error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cadence_plugin_api::ContextError;

/// Errors that can occur in the cadence server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The request was malformed
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A session operation failed
    #[error(transparent)]
    Session(#[from] ContextError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Session(err) => match err {
                ContextError::SessionNotFound(_) | ContextError::SessionDestroyed(_) => {
                    StatusCode::NOT_FOUND
                }
                ContextError::DuplicateSession(_)
                | ContextError::InvalidTransition { .. }
                | ContextError::NotConnected { .. } => StatusCode::CONFLICT,
                ContextError::OutboundQueueFull { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ContextError::PlayerConstruction { .. } | ContextError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::Bind { .. } | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_plugin_api::{GuildId, PlayerError, SessionId};

    #[test]
    fn gone_sessions_map_to_not_found() {
        let err = ServerError::from(ContextError::SessionNotFound(SessionId(1)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ServerError::from(ContextError::SessionDestroyed(SessionId(1)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn player_construction_maps_to_internal_error() {
        let err = ServerError::from(ContextError::PlayerConstruction {
            guild_id: GuildId(3),
            source: PlayerError::custom("no voice server"),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("guild 3"));
    }

    #[test]
    fn bad_request_status() {
        let err = ServerError::BadRequest("missing User-Id header".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "bad request: missing User-Id header");
    }
}
