//! cadence-core: Session core of the cadence media node
//!
//! This crate tracks every client connected to the node and everything that
//! hangs off it:
//!
//! - **Registry** - [`ConnectionRegistry`] maps session ids to live sessions
//! - **Sessions** - [`SessionContext`] implements the plugin-facing
//!   [`SocketContext`](cadence_plugin_api::SocketContext)
//! - **Players** - [`PlayerDirectory`] builds at most one player per guild
//! - **Outbound** - [`MessageDispatcher`] delivers messages in order without
//!   ever blocking the caller
//! - **Lifecycle** - [`LifecycleController`] pauses, resumes and destroys
//!   sessions
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cadence_core::mock::{MockPlayerFactory, MockTransport};
//! use cadence_core::{ConnectionRegistry, EventEmitter, LifecycleController, SessionConfig};
//! use cadence_plugin_api::{GuildId, SocketContext, UserId};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = LifecycleController::new(
//!         Arc::new(ConnectionRegistry::new()),
//!         Arc::new(MockPlayerFactory::new()),
//!         EventEmitter::default(),
//!         SessionConfig::default(),
//!     );
//!
//!     let session = controller
//!         .open(UserId(42), None, Arc::new(MockTransport::new()))
//!         .await?;
//!     let player = session.player(GuildId(7)).await?;
//!     println!("Player {} ready", player.guild_id());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │             LifecycleController              │
//! │  ┌────────────────────────────────────────┐  │
//! │  │          ConnectionRegistry            │  │
//! │  │  ┌──────────────────────────────────┐  │  │
//! │  │  │          SessionContext          │  │  │
//! │  │  │  ┌─────────────┐ ┌────────────┐  │  │  │
//! │  │  │  │   Player    │ │  Message   │  │  │  │
//! │  │  │  │  Directory  │ │ Dispatcher │  │  │  │
//! │  │  │  └─────────────┘ └────────────┘  │  │  │
//! │  │  └──────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod mock;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export main types at crate root
pub use config::{ResumePolicy, SessionConfig};
pub use error::{CadenceError, ConfigError};
pub use events::EventEmitter;
pub use protocol::{NodeStats, ServerMessage};
pub use session::{
    ConnectionRegistry, LifecycleController, MessageDispatcher, PlayerDirectory, SessionContext,
};
pub use transport::{Transport, TransportError};
