//! Error types for the session layer.
//!
//! Every variant is handled within the connection it belongs to: the
//! caller of [`run_session`](crate::run_session) only logs the result.
//! Malformed client frames are deliberately not an error. They are
//! ignored where the protocol allows it (the joined action loop) and
//! degrade to the empty password during authentication, matching the
//! forgiving default-zero behavior of the roll formula parser.

use tavern_protocol::RoomId;
use tavern_room::RoomError;

use crate::ChannelClosed;

/// Ways a session can end other than a clean leave or disconnect.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No room has the requested id. The client was told and the
    /// connection closed.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The single password attempt failed. The client was told and the
    /// connection closed; there is no retry.
    #[error("wrong password for room {0}")]
    AuthenticationFailed(RoomId),

    /// The outbound queue died mid-session. Cleanup has already run.
    #[error(transparent)]
    Channel(#[from] ChannelClosed),

    /// The room became unavailable under the session.
    #[error(transparent)]
    Room(#[from] RoomError),
}
