//! cadence-plugin-api - Plugin API for the cadence media node
//!
//! This crate holds the contracts shared by the node and its plugins:
//!
//! - [`SocketContext`] - one client connection, its players and its socket
//! - [`Player`] / [`PlayerFactory`] - the boundary to the audio pipeline
//! - [`SessionEventHandler`] - lifecycle hooks
//!
//! # Example
//!
//! ```ignore
//! use cadence_plugin_api::{PlayerHandle, SessionEventHandler, SocketContext, SocketContextExt};
//!
//! struct Announcer;
//!
//! impl SessionEventHandler for Announcer {
//!     fn on_new_player(&self, ctx: &dyn SocketContext, player: &PlayerHandle) {
//!         let _ = ctx.send(&serde_json::json!({
//!             "op": "event",
//!             "type": "PlayerCreated",
//!             "guildId": player.guild_id(),
//!         }));
//!     }
//! }
//! ```

pub mod context;
pub mod error;
pub mod event;
pub mod player;
pub mod types;

pub use context::{SocketContext, SocketContextExt};
pub use error::ContextError;
pub use event::SessionEventHandler;
pub use player::{Player, PlayerError, PlayerFactory, PlayerHandle};
pub use types::*;

/// Current plugin API version
pub const API_VERSION: u32 = 1;
