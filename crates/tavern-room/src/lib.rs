//! Room lifecycle for Tavern.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! membership map and chat history. All operations against one room are
//! serialized by the actor's mailbox; operations against different rooms
//! never contend. The process-wide [`RoomRegistry`] creates rooms, hands
//! out [`RoomHandle`]s, and drops a room the moment its last participant
//! leaves.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates, looks up, lists, and garbage-collects rooms
//! - [`RoomHandle`]: sends operations to a running room actor
//! - [`RoomSnapshot`]: consistent membership snapshot
//! - [`EventSender`]: a participant's outbound queue handle

mod error;
mod registry;
mod room;

pub use error::RoomError;
pub use registry::{CreateOutcome, RoomRegistry};
pub use room::{EventSender, RoomHandle, RoomSnapshot};
