//! Session management

pub mod context;
pub mod dispatcher;
pub mod lifecycle;
pub mod players;
pub mod registry;

// Re-export key types for convenience
pub use context::SessionContext;
pub use dispatcher::{MessageDispatcher, TransportLink};
pub use lifecycle::LifecycleController;
pub use players::PlayerDirectory;
pub use registry::ConnectionRegistry;
