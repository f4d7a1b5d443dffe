//! Identifiers and lifecycle types shared between the node and its plugins

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw 64-bit value
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Identity of a client connection (session), stable across resumes
    SessionId
);
id_type!(
    /// External grouping a player is scoped under
    GuildId
);
id_type!(
    /// The user the connecting client acts for
    UserId
);

/// State of a socket context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextState {
    /// The context has an open WebSocket
    Open,
    /// The context has no open WebSocket, but can later be resumed
    Resumable,
    /// The WebSocket has closed and this context will never be used again
    Destroyed,
}

impl ContextState {
    pub fn is_destroyed(self) -> bool {
        matches!(self, ContextState::Destroyed)
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Open => "OPEN",
            ContextState::Resumable => "RESUMABLE",
            ContextState::Destroyed => "DESTROYED",
        };
        f.write_str(name)
    }
}

/// WebSocket close code and reason sent to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseFrame {
    pub code: u16,
    pub reason: String,
}

impl CloseFrame {
    /// Normal closure (1000)
    pub const NORMAL: u16 = 1000;

    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Close with a code and no reason
    pub fn code(code: u16) -> Self {
        Self::new(code, String::new())
    }
}
