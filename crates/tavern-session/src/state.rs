//! The session state machine.
//!
//! Which inputs are valid before password confirmation is easy to get
//! wrong when the flow lives in control flow alone, so the states and
//! transitions are spelled out as data:
//!
//! ```text
//!                      RoomMissing
//! Connecting ───────────────────────────────→ Closed
//!     │                                         ↑ ↑ ↑
//!     │ RoomOpen                                │ │ │
//!     ├───────────────→ Joined ─────────────────┘ │ │
//!     │                   ↑    LeaveRequested /   │ │
//!     │ RoomLocked        │    ConnectionLost     │ │
//!     └──→ AwaitingPassword ──────────────────────┘ │
//!            │      PasswordRejected /              │
//!            │      ConnectionLost                  │
//!            └── PasswordAccepted ──→ Joined ───────┘
//! ```
//!
//! The driver in [`handler`](crate::handler) feeds inputs to
//! [`SessionState::apply`]; anything the table does not allow collapses
//! the session to `Closed`.

/// The lifecycle state of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection accepted; the room is being looked up.
    Connecting,
    /// The room exists and has a password; exactly one attempt will be
    /// evaluated.
    AwaitingPassword,
    /// The client is a room participant and may send actions.
    Joined,
    /// Terminal. The connection is closed and cleanup has run.
    Closed,
}

/// An input that can move a session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// The requested room id is unknown.
    RoomMissing,
    /// The room exists and has no password.
    RoomOpen,
    /// The room exists and is password-protected.
    RoomLocked,
    /// The single password attempt matched.
    PasswordAccepted,
    /// The single password attempt did not match.
    PasswordRejected,
    /// The client asked to leave the room.
    LeaveRequested,
    /// The connection dropped (or the outbound channel died).
    ConnectionLost,
}

impl SessionState {
    /// The transition table. Returns `None` for state/input pairs the
    /// protocol does not define.
    pub fn apply(self, input: SessionInput) -> Option<SessionState> {
        use SessionInput as In;
        use SessionState as St;

        match (self, input) {
            (St::Connecting, In::RoomMissing) => Some(St::Closed),
            (St::Connecting, In::RoomOpen) => Some(St::Joined),
            (St::Connecting, In::RoomLocked) => Some(St::AwaitingPassword),
            (St::Connecting, In::ConnectionLost) => Some(St::Closed),

            (St::AwaitingPassword, In::PasswordAccepted) => Some(St::Joined),
            (St::AwaitingPassword, In::PasswordRejected) => Some(St::Closed),
            (St::AwaitingPassword, In::ConnectionLost) => Some(St::Closed),

            (St::Joined, In::LeaveRequested) => Some(St::Closed),
            (St::Joined, In::ConnectionLost) => Some(St::Closed),

            _ => None,
        }
    }

    /// Returns `true` once the session can never leave this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` while client actions (`send_message`, `roll_dice`,
    /// ...) are valid.
    pub fn accepts_actions(self) -> bool {
        matches!(self, Self::Joined)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::AwaitingPassword => write!(f, "AwaitingPassword"),
            Self::Joined => write!(f, "Joined"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
