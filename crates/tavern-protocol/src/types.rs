//! Protocol types: identifiers, inbound actions, outbound events, and the
//! room-management HTTP DTOs.
//!
//! The wire format is JSON text. Inbound actions are tagged by an
//! `action` field; outbound traffic is a mix of `action`-tagged room
//! events, `status`-tagged protocol replies, and the bare history reply,
//! folded into one [`ServerEvent`] union so a connection's outbound queue
//! carries a single type. The serde attributes below pin the exact JSON
//! shapes; the tests at the bottom hold them in place.

use std::fmt;

use serde::{Deserialize, Serialize};
use tavern_dice::{RollFormula, RollResults};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque room identifier, generated by the registry at creation time.
///
/// Serializes as a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Creates a room id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied user identifier. Not verified; whoever presents an id
/// is that user for the duration of the connection.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Creates a user id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The empty sender id used for narrative lines the server itself
    /// injects into a room ("x has joined", roll announcements).
    pub fn system() -> Self {
        Self(String::new())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Inbound: client actions
// ---------------------------------------------------------------------------

/// An action sent by a joined client, tagged by the `action` field.
///
/// Payload fields default when absent: `{"action": "send_message"}` is a
/// valid (empty) chat message and `{"action": "roll_dice"}` rolls the
/// zero formula. Frames with an unknown tag fail to decode; the session
/// layer ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Broadcast a chat message to the room.
    SendMessage {
        #[serde(default)]
        message: String,
    },

    /// Request the room's full message history.
    GetChatHistory,

    /// Leave the room and end the session.
    LeaveRoom,

    /// Resolve a roll formula and broadcast the outcome.
    RollDice {
        #[serde(default)]
        formula: RollFormula,
    },

    /// Request a fresh membership snapshot.
    GetRoomInfo,
}

impl ClientAction {
    /// Decodes an inbound text frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

/// The one inbound message that is not `action`-tagged: the password
/// reply a client sends while the server is awaiting authentication.
///
/// A missing `password` field decodes as the empty password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordAttempt {
    #[serde(default)]
    pub password: String,
}

impl PasswordAttempt {
    /// Decodes a password reply frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Outbound: room events, protocol status, history
// ---------------------------------------------------------------------------

/// One (sender, text) line of a room's chat log.
///
/// Narrative lines (joins, leaves, roll announcements) carry the empty
/// sender id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub from: UserId,
    pub text: String,
}

/// A room-scoped event fanned out to participants, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Membership snapshot, broadcast on every join and leave and sent as
    /// the reply to `get_room_info`. `participants` is sorted ascending.
    RoomInfo {
        room_id: RoomId,
        host_id: UserId,
        participants: Vec<UserId>,
    },

    /// A chat message (user-authored or narrative).
    NewMessage { from: UserId, text: String },

    /// A resolved dice roll: the formula as received, every individual
    /// draw grouped by die size, and the total.
    DiceRolled {
        from: UserId,
        formula: RollFormula,
        dices_result: RollResults,
        total: i64,
    },
}

/// Connection-protocol status replies, tagged by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusEvent {
    /// The requested room id is unknown; the session ends here.
    RoomNotFound,
    /// The room has a password; the next frame must be a [`PasswordAttempt`].
    PasswordRequired,
    /// The single password attempt failed; the session ends here.
    WrongPassword,
    /// Authentication (if any) passed; room events follow.
    JoinedRoom,
}

/// Reply to `get_chat_history`: the full accumulated log, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReply {
    pub messages: Vec<ChatRecord>,
}

/// Everything the server can put on a connection's outbound queue.
///
/// Untagged: each arm already carries its own discriminant (`action`,
/// `status`, or the `messages` key), so the union adds no wrapper on the
/// wire. The arms' key sets are disjoint, which keeps decoding
/// unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerEvent {
    Room(RoomEvent),
    Status(StatusEvent),
    History(HistoryReply),
}

impl ServerEvent {
    /// Encodes this event as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decodes an outbound frame. Used by clients and tests; the server
    /// only encodes.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

impl From<RoomEvent> for ServerEvent {
    fn from(event: RoomEvent) -> Self {
        Self::Room(event)
    }
}

impl From<StatusEvent> for ServerEvent {
    fn from(status: StatusEvent) -> Self {
        Self::Status(status)
    }
}

impl From<HistoryReply> for ServerEvent {
    fn from(reply: HistoryReply) -> Self {
        Self::History(reply)
    }
}

// ---------------------------------------------------------------------------
// HTTP DTOs: room creation and listing
// ---------------------------------------------------------------------------

/// Body of `POST /room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub host_id: UserId,
    /// Shared secret for the room; empty (the default) means open.
    #[serde(default)]
    pub password: String,
}

/// Outcome of a create-room request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateRoomStatus {
    /// A new room was allocated.
    RoomCreated,
    /// The host already has a live room; its id is returned instead.
    HostAlreadyHasRoom,
}

/// Reply to `POST /room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub status: CreateRoomStatus,
    pub room_id: RoomId,
}

/// One row of the room listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub host_id: UserId,
    /// Number of currently attached participants.
    pub online: usize,
    pub password_required: bool,
}

/// Reply to `GET /rooms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummary>,
}

// =========================================================================
// Tests
// =========================================================================
