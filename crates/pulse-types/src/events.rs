use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Event;

/// Internal change notification fanned out to gateway connections. A single
/// broad variant on purpose: any event or message mutation invalidates every
/// subscriber's list, and subscribers refetch wholesale rather than merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    EventsChanged,
}

/// Frames sent from server to client over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Connection accepted for this user.
    Ready { user_id: Uuid, user_name: String },

    /// Full refreshed event list. Sent on connect and after every store
    /// change — the client replaces its in-memory list wholesale.
    EventList { events: Vec<Event> },
}

/// Frames sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayCommand {
    /// Ask for a fresh event list outside the invalidation cycle.
    Resync,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_frames_use_tagged_encoding() {
        let ready = GatewayEvent::Ready {
            user_id: Uuid::nil(),
            user_name: "Aoi".into(),
        };
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["type"], "Ready");
        assert_eq!(json["data"]["user_name"], "Aoi");
    }

    #[test]
    fn resync_command_parses() {
        let cmd: GatewayCommand = serde_json::from_str(r#"{"type":"Resync"}"#).unwrap();
        assert!(matches!(cmd, GatewayCommand::Resync));
    }
}
