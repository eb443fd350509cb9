//! The per-connection protocol handler for Tavern.
//!
//! One session drives one client connection from room lookup through
//! authentication, the joined action loop, and cleanup. The session owns
//! nothing shared: it talks to its room through a [`RoomHandle`] and to
//! its client through a [`ParticipantChannel`], so the whole protocol is
//! exercisable with an in-memory channel and no network.
//!
//! [`RoomHandle`]: tavern_room::RoomHandle
//!
//! # How it fits in the stack
//!
//! ```text
//! server (axum shell)   ← implements ParticipantChannel over a WebSocket
//!     ↕
//! session (this crate)  ← state machine + action dispatch
//!     ↕
//! room / registry       ← membership, history, broadcast
//! ```

#![allow(async_fn_in_trait)]

mod channel;
mod error;
mod handler;
mod state;

pub use channel::{ChannelClosed, ParticipantChannel};
pub use error::SessionError;
pub use handler::run_session;
pub use state::{SessionInput, SessionState};
