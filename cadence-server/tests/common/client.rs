//! WebSocket test client for session protocol testing
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use cadence_plugin_api::SessionId;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect with the given handshake headers
    pub async fn try_connect(
        addr: SocketAddr,
        headers: &[(&'static str, String)],
    ) -> Result<Self, Error> {
        let mut request = format!("ws://{}/v4/websocket", addr)
            .into_client_request()
            .unwrap();
        for (name, value) in headers {
            request
                .headers_mut()
                .insert(*name, value.parse().unwrap());
        }

        let (ws, _) = tokio_tungstenite::connect_async(request).await?;
        let (sink, stream) = ws.split();
        Ok(Self { sink, stream })
    }

    /// Connect as a user, optionally resuming a session
    pub async fn connect(addr: SocketAddr, user_id: u64, resume: Option<SessionId>) -> Self {
        let mut headers = vec![
            ("user-id", user_id.to_string()),
            ("client-name", "cadence-tests".to_string()),
        ];
        if let Some(session_id) = resume {
            headers.push(("session-id", session_id.to_string()));
        }
        Self::try_connect(addr, &headers)
            .await
            .expect("Failed to connect")
    }

    /// Send raw text message
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Receive raw text message
    pub async fn recv_raw(&mut self) -> String {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(Message::Close(frame))) => panic!("WebSocket closed: {:?}", frame),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("WebSocket error: {}", e),
                None => panic!("WebSocket closed"),
            }
        }
    }

    /// Receive and deserialize JSON message
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> T {
        let text = tokio::time::timeout(Duration::from_secs(2), self.recv_raw())
            .await
            .expect("timed out waiting for message");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Wait for the server to close the socket; returns its close code
    #[allow(dead_code)]
    pub async fn recv_close(&mut self) -> Option<u16> {
        loop {
            match tokio::time::timeout(Duration::from_secs(2), self.stream.next()).await {
                Ok(Some(Ok(Message::Close(frame)))) => return frame.map(|f| u16::from(f.code)),
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(_))) | Ok(None) => return None,
                Err(_) => panic!("timed out waiting for close"),
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) {
        let _ = self
            .sink
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "bye".into(),
            })))
            .await;
        // Drain until the server acknowledges
        while let Some(Ok(_)) = self.stream.next().await {}
    }
}

/// Connect and consume the `ready` message, returning it
#[allow(dead_code)]
pub async fn connect_ready(
    addr: SocketAddr,
    user_id: u64,
    resume: Option<SessionId>,
) -> (WsConnection, serde_json::Value) {
    let mut conn = WsConnection::connect(addr, user_id, resume).await;
    let ready: serde_json::Value = conn.recv_json().await;
    assert_eq!(ready["op"], "ready", "Expected ready but got: {}", ready);
    (conn, ready)
}

/// Session id announced in a `ready` message
#[allow(dead_code)]
pub fn session_id(ready: &serde_json::Value) -> SessionId {
    SessionId(ready["sessionId"].as_u64().expect("sessionId should be a number"))
}
