//! Transport boundary
//!
//! The host owns the actual socket. The core only writes text payloads to it
//! and asks it to close; inbound frames and socket loss are reported back
//! through [`LifecycleController`](crate::session::LifecycleController).

use async_trait::async_trait;
use thiserror::Error;

pub use cadence_plugin_api::CloseFrame;

/// Errors raised by a transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// The underlying socket is already closed
    #[error("transport closed")]
    Closed,

    #[error("transport I/O error: {0}")]
    Io(String),
}

/// A bidirectional message channel to one client
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one text payload
    async fn write(&self, payload: String) -> Result<(), TransportError>;

    /// Close the channel, sending the frame if one is given
    async fn close(&self, frame: Option<CloseFrame>) -> Result<(), TransportError>;
}
