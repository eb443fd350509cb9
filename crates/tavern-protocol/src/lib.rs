//! Wire vocabulary for the Tavern protocol.
//!
//! Every type that travels between a client and the server lives here:
//! identifiers, the inbound action set, the outbound event set, and the
//! DTOs for the room-management HTTP endpoints. The core layers above
//! (room, session) speak these types; turning them into JSON text happens
//! at the channel boundary via the helpers in this crate.

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    ChatRecord, ClientAction, CreateRoomRequest, CreateRoomResponse,
    CreateRoomStatus, HistoryReply, PasswordAttempt, RoomEvent, RoomId,
    RoomListResponse, RoomSummary, ServerEvent, StatusEvent, UserId,
};
