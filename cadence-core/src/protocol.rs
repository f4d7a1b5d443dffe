//! Messages the node sends to its clients
//!
//! Every frame is a JSON object tagged by `op`.

use serde::{Deserialize, Serialize};

use cadence_plugin_api::{GuildId, SessionId};

/// Messages sent from the node to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First message on every attached WebSocket
    #[serde(rename_all = "camelCase")]
    Ready { resumed: bool, session_id: SessionId },

    /// Current state of one player
    #[serde(rename_all = "camelCase")]
    PlayerUpdate { guild_id: GuildId, playing: bool },

    /// Node-wide counters
    Stats(NodeStats),
}

/// Counters over every session on the node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    pub sessions: usize,
    pub players: usize,
    pub playing_players: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_wire_format() {
        let msg = ServerMessage::Ready {
            resumed: false,
            session_id: SessionId(99),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "ready", "resumed": false, "sessionId": 99})
        );
    }

    #[test]
    fn player_update_wire_format() {
        let msg = ServerMessage::PlayerUpdate {
            guild_id: GuildId(7),
            playing: true,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"op":"playerUpdate","guildId":7,"playing":true}"#);
    }

    #[test]
    fn stats_parses_back() {
        let text = r#"{"op":"stats","sessions":2,"players":3,"playingPlayers":1}"#;
        let msg: ServerMessage = serde_json::from_str(text).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Stats(NodeStats {
                sessions: 2,
                players: 3,
                playing_players: 1
            })
        );
    }
}
