//! Error types for the room layer.

use tavern_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this id.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's actor has stopped (it emptied out) or its mailbox is
    /// gone. Callers treat this the same as not-found.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
