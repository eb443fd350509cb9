//! Unified error type for the Tavern server.

use tavern_protocol::ProtocolError;
use tavern_room::RoomError;
use tavern_session::SessionError;

/// Top-level error that wraps the crate-specific errors.
///
/// Users of the `tavern` crate deal with this single type; the `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TavernError {
    /// Binding, accepting, or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown room, failed auth, dead channel).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),
}
