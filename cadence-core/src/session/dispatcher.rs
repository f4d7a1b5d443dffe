//! MessageDispatcher - ordered, non-blocking delivery to a session's transport
//!
//! Each attached transport gets a bounded queue and a single writer task, so
//! payloads reach the transport in submission order and a slow client only
//! ever stalls its own writer. When the queue is full the newest message is
//! rejected with [`ContextError::OutboundQueueFull`]; `send` never waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use cadence_plugin_api::{CloseFrame, ContextError, ContextState, SessionId};

use crate::transport::{Transport, TransportError};

enum Outbound {
    Text(String),
    Close(Option<CloseFrame>),
}

/// One attachment of a transport to a session
pub struct TransportLink {
    session_id: SessionId,
    attachment: u64,
    tx: mpsc::Sender<Outbound>,
    transport: Arc<dyn Transport>,
    writer: JoinHandle<()>,
}

impl TransportLink {
    pub fn attachment(&self) -> u64 {
        self.attachment
    }

    /// Queue a close behind pending messages.
    ///
    /// If the queue is jammed the writer is abandoned and the transport is
    /// closed directly in the background. Errors are only logged.
    pub fn close(&self, frame: Option<CloseFrame>) {
        if let Ok(permit) = self.tx.try_reserve() {
            permit.send(Outbound::Close(frame));
            return;
        }

        self.writer.abort();
        let transport = Arc::clone(&self.transport);
        let session_id = self.session_id;
        tokio::spawn(async move {
            if let Err(e) = transport.close(frame).await {
                tracing::warn!(session_id = %session_id, error = %e, "Transport close failed");
            }
        });
    }

    /// Stop writing immediately; the remote end is gone
    pub fn abort(&self) {
        self.writer.abort();
    }
}

/// Serializes outbound messages onto the current transport
pub struct MessageDispatcher {
    session_id: SessionId,
    capacity: usize,
    state: watch::Receiver<ContextState>,
    link: ArcSwapOption<TransportLink>,
    next_attachment: AtomicU64,
}

impl MessageDispatcher {
    pub fn new(session_id: SessionId, capacity: usize, state: watch::Receiver<ContextState>) -> Self {
        Self {
            session_id,
            capacity: capacity.max(1),
            state,
            link: ArcSwapOption::empty(),
            next_attachment: AtomicU64::new(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Attach a transport and start its writer. Returns the attachment id.
    ///
    /// A previously attached transport is abandoned.
    pub fn attach(&self, transport: Arc<dyn Transport>) -> u64 {
        let attachment = self.next_attachment.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        let writer = tokio::spawn(write_loop(
            self.session_id,
            attachment,
            Arc::clone(&transport),
            rx,
        ));

        let link = Arc::new(TransportLink {
            session_id: self.session_id,
            attachment,
            tx,
            transport,
            writer,
        });

        if let Some(previous) = self.link.swap(Some(link)) {
            previous.abort();
        }

        tracing::debug!(session_id = %self.session_id, attachment, "Transport attached");
        attachment
    }

    /// Take the current transport off the session; later sends fail
    pub fn detach(&self) -> Option<Arc<TransportLink>> {
        let link = self.link.swap(None);
        if let Some(link) = &link {
            tracing::debug!(
                session_id = %self.session_id,
                attachment = link.attachment,
                "Transport detached"
            );
        }
        link
    }

    /// Id of the currently attached transport
    pub fn attachment(&self) -> Option<u64> {
        self.link.load_full().map(|link| link.attachment)
    }

    /// Serialize and queue a message. Returns the queued payload.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<String, ContextError> {
        let state = *self.state.borrow();
        if state != ContextState::Open {
            return Err(ContextError::NotConnected {
                session_id: self.session_id,
                state,
            });
        }

        let guard = self.link.load();
        let Some(link) = &*guard else {
            return Err(ContextError::NotConnected {
                session_id: self.session_id,
                state,
            });
        };

        let payload = serde_json::to_string(message)?;
        match link.tx.try_send(Outbound::Text(payload.clone())) {
            Ok(()) => Ok(payload),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    capacity = self.capacity,
                    "Outbound queue full, dropping message"
                );
                Err(ContextError::OutboundQueueFull {
                    session_id: self.session_id,
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ContextError::NotConnected {
                session_id: self.session_id,
                state,
            }),
        }
    }

    /// Detach the transport and ask it to close after pending messages.
    ///
    /// Returns the attachment that was closed, if any.
    pub fn close_transport(&self, frame: Option<CloseFrame>) -> Option<u64> {
        let link = self.detach()?;
        link.close(frame);
        Some(link.attachment)
    }
}

async fn write_loop(
    session_id: SessionId,
    attachment: u64,
    transport: Arc<dyn Transport>,
    mut rx: mpsc::Receiver<Outbound>,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Text(payload) => match transport.write(payload).await {
                Ok(()) => {
                    tracing::trace!(session_id = %session_id, attachment, "Sent payload");
                }
                Err(TransportError::Closed) => {
                    tracing::debug!(session_id = %session_id, attachment, "Transport closed under writer");
                    break;
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, attachment, error = %e, "Failed to write payload");
                }
            },
            Outbound::Close(frame) => {
                if let Err(e) = transport.close(frame).await {
                    tracing::warn!(session_id = %session_id, attachment, error = %e, "Transport close failed");
                }
                break;
            }
        }
    }
}
