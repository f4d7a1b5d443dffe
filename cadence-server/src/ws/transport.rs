//! WebSocket sink adapted to the core [`Transport`] trait

use async_trait::async_trait;
use axum::extract::ws::{self, Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;
use tokio::sync::Mutex;

use cadence_core::{Transport, TransportError};
use cadence_plugin_api::CloseFrame;

/// Write half of an upgraded WebSocket
pub struct WsTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsTransport {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn write(&self, payload: String) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        // A failed send leaves the socket unusable
        sink.send(Message::Text(payload)).await.map_err(|e| {
            tracing::debug!(error = %e, "WebSocket send failed");
            TransportError::Closed
        })
    }

    async fn close(&self, frame: Option<CloseFrame>) -> Result<(), TransportError> {
        let frame = frame.map(|frame| ws::CloseFrame {
            code: frame.code,
            reason: frame.reason.into(),
        });

        let mut sink = self.sink.lock().await;
        sink.send(Message::Close(frame))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        sink.close()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
