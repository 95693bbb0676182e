//! Core protocol types for Relayforge's wire format.
//!
//! Every frame is one event, adjacently tagged:
//!
//! ```text
//! { "event": "joinGame", "data": "ABC123" }
//! ```
//!
//! The event names are the ones browser chess clients already emit and
//! listen for (`createGame`, `gameStart`, `opponentMove`, ...), so existing
//! front ends can talk to the relay without changes.

use std::fmt;

use relayforge_transport::ConnectionId;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::value::RawValue;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The shareable identifier of a session.
///
/// A short alphanumeric token (e.g. `"ABC123"`) that the creator reads out
/// to their opponent. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw token. No validation happens here: ids that arrive from
    /// clients are only ever used as lookup keys.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One of the two mutually exclusive roles in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// The side a second participant receives when the first holds `self`.
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

/// The full side ↔ connection mapping of an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub white: ConnectionId,
    pub black: ConnectionId,
}

/// A move exactly as the sending client wrote it.
///
/// Opaque to the relay: there is no schema and no legality check. Any JSON
/// value is accepted (SAN strings like `"e2e4"`, objects like
/// `{"from":"e2","to":"e4"}`) and held as the original text, so numbers,
/// key order and inner whitespace reach the opponent byte for byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovePayload(Box<RawValue>);

impl MovePayload {
    /// Wraps a JSON document.
    ///
    /// # Errors
    /// Returns the parse error if `json` isn't a single valid JSON value.
    pub fn from_json(json: impl Into<String>) -> Result<Self, serde_json::Error> {
        RawValue::from_string(json.into()).map(Self)
    }

    /// The move's JSON text, as received.
    pub fn as_json(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for MovePayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_json() == other.as_json()
    }
}

impl Eq for MovePayload {}

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

/// Events a connected client can send.
///
/// Disconnection is not an event on the wire: the handler synthesizes it
/// when the transport reports the channel closed.
///
/// Decoding goes through [`InboundFrame`] so `data` is captured as raw text
/// whichever order the two keys arrive in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Open a new session and take its first seat.
    #[serde(rename = "createGame")]
    CreateSession,

    /// Take the second seat of an existing session.
    #[serde(rename = "joinGame")]
    JoinSession(SessionId),

    /// Relay a move to the opponent.
    #[serde(rename = "move")]
    Move {
        #[serde(rename = "gameId")]
        session_id: SessionId,
        #[serde(rename = "move")]
        mv: MovePayload,
    },
}

const CLIENT_EVENTS: &[&str] = &["createGame", "joinGame", "move"];

/// An inbound frame with its payload still undecoded.
#[derive(Deserialize)]
struct InboundFrame {
    event: String,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

#[derive(Deserialize)]
struct MoveData {
    #[serde(rename = "gameId")]
    session_id: SessionId,
    #[serde(rename = "move")]
    mv: MovePayload,
}

impl<'de> Deserialize<'de> for ClientEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let frame = InboundFrame::deserialize(deserializer)?;
        let data = || {
            frame
                .data
                .as_deref()
                .map(RawValue::get)
                .ok_or_else(|| <D::Error as de::Error>::missing_field("data"))
        };

        match frame.event.as_str() {
            "createGame" => Ok(Self::CreateSession),
            "joinGame" => serde_json::from_str(data()?)
                .map(Self::JoinSession)
                .map_err(de::Error::custom),
            "move" => {
                let MoveData { session_id, mv } =
                    serde_json::from_str(data()?).map_err(de::Error::custom)?;
                Ok(Self::Move { session_id, mv })
            }
            other => Err(de::Error::unknown_variant(other, CLIENT_EVENTS)),
        }
    }
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

/// Events the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// To the creator: the new session's id and the creator's side.
    #[serde(rename = "gameCreated")]
    SessionCreated {
        #[serde(rename = "gameId")]
        session_id: SessionId,
        #[serde(rename = "color")]
        side: Side,
    },

    /// To both participants once the second one is seated.
    #[serde(rename = "gameStart")]
    GameStarting(Roster),

    /// To the joiner, after `GameStarting`.
    #[serde(rename = "playerColor")]
    YourSide(Side),

    /// To the non-sending participant, payload untouched.
    #[serde(rename = "opponentMove")]
    OpponentMoved(MovePayload),

    /// To the participant left behind when the other one drops.
    #[serde(rename = "opponentDisconnected")]
    OpponentDisconnected,

    /// To the requesting connection only; a human-readable reason.
    #[serde(rename = "error")]
    Error(String),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! These pin the exact JSON shapes. A mismatch here means a browser
    //! client can no longer parse what the relay sends.

    use super::*;
    use serde_json::json;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    // =====================================================================
    // Identifiers
    // =====================================================================

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::new("ABC123")).unwrap();
        assert_eq!(json, "\"ABC123\"");
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::from("ZZ9").to_string(), "ZZ9");
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::White.opposite(), Side::Black);
        assert_eq!(Side::Black.opposite(), Side::White);
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Side::White).unwrap(), json!("white"));
        assert_eq!(serde_json::to_value(Side::Black).unwrap(), json!("black"));
        assert_eq!(Side::Black.to_string(), "black");
    }

    // =====================================================================
    // ClientEvent
    // =====================================================================

    #[test]
    fn test_client_event_create_without_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"createGame"}"#).unwrap();
        assert_eq!(event, ClientEvent::CreateSession);
    }

    #[test]
    fn test_client_event_join_carries_bare_id() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"joinGame","data":"ABC123"}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinSession(SessionId::new("ABC123")));
    }

    #[test]
    fn test_client_event_move_json_format() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"move","data":{"gameId":"ABC123","move":"e2e4"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Move {
                session_id: SessionId::new("ABC123"),
                mv: MovePayload::from_json(r#""e2e4""#).unwrap(),
            }
        );
    }

    #[test]
    fn test_client_event_move_accepts_structured_payload() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"move","data":{"gameId":"A","move":{"to":"e4","from":"e2","promotion":null}}}"#,
        )
        .unwrap();
        let ClientEvent::Move { mv, .. } = event else {
            panic!("expected Move");
        };
        // Key order survives the trip through the relay.
        assert_eq!(mv.as_json(), r#"{"to":"e4","from":"e2","promotion":null}"#);
    }

    #[test]
    fn test_client_event_move_keeps_numbers_as_written() {
        for raw in ["12345678901234567890123", "1e2", "1e400", "-0.50", r#"{ "n" : 1E+2 }"#] {
            let frame = format!(r#"{{"event":"move","data":{{"gameId":"A","move":{raw}}}}}"#);
            let event: ClientEvent = serde_json::from_str(&frame).unwrap();
            let ClientEvent::Move { mv, .. } = event else {
                panic!("expected Move");
            };
            assert_eq!(mv.as_json(), raw);
        }
    }

    #[test]
    fn test_client_event_data_before_event_key() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"data":{"move":[1, 2],"gameId":"ABC123"},"event":"move"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Move {
                session_id: SessionId::new("ABC123"),
                mv: MovePayload::from_json("[1, 2]").unwrap(),
            }
        );
    }

    #[test]
    fn test_client_event_unknown_event_returns_error() {
        let err = serde_json::from_str::<ClientEvent>(r#"{"event":"flyToMoon","data":9000}"#)
            .unwrap_err();
        assert!(err.to_string().contains("flyToMoon"));
    }

    #[test]
    fn test_client_event_join_without_id_returns_error() {
        let result: Result<ClientEvent, _> = serde_json::from_str(r#"{"event":"joinGame"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_event_move_without_session_returns_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"move","data":{"move":"e2e4"}}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent: one test per variant to verify JSON shape
    // =====================================================================

    #[test]
    fn test_server_event_session_created_json_format() {
        let event = ServerEvent::SessionCreated {
            session_id: SessionId::new("ABC123"),
            side: Side::White,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "gameCreated", "data": {"gameId": "ABC123", "color": "white"}})
        );
    }

    #[test]
    fn test_server_event_game_starting_json_format() {
        let event = ServerEvent::GameStarting(Roster {
            white: conn(4),
            black: conn(9),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "gameStart", "data": {"white": 4, "black": 9}})
        );
    }

    #[test]
    fn test_server_event_your_side_json_format() {
        let event = ServerEvent::YourSide(Side::Black);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "playerColor", "data": "black"})
        );
    }

    #[test]
    fn test_server_event_opponent_moved_json_format() {
        let event = ServerEvent::OpponentMoved(MovePayload::from_json(r#""e2e4""#).unwrap());
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"opponentMove","data":"e2e4"}"#
        );
    }

    #[test]
    fn test_server_event_opponent_moved_writes_payload_verbatim() {
        let raw = r#"{"to" : "e4","n":12345678901234567890123}"#;
        let event = ServerEvent::OpponentMoved(MovePayload::from_json(raw).unwrap());
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            format!(r#"{{"event":"opponentMove","data":{raw}}}"#)
        );
    }

    #[test]
    fn test_move_payload_rejects_invalid_json() {
        assert!(MovePayload::from_json("{not json").is_err());
    }

    #[test]
    fn test_server_event_opponent_disconnected_has_no_data() {
        let json = serde_json::to_string(&ServerEvent::OpponentDisconnected).unwrap();
        assert_eq!(json, r#"{"event":"opponentDisconnected"}"#);
    }

    #[test]
    fn test_server_event_error_json_format() {
        let event = ServerEvent::Error("session ZZZZZZ not found".into());
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "error", "data": "session ZZZZZZ not found"})
        );
    }
}
