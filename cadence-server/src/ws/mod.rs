//! WebSocket module for client sessions

mod connection;
mod transport;

pub use connection::{Handshake, websocket_handler};
pub use transport::WsTransport;
