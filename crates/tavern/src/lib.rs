//! # Tavern
//!
//! A room-scoped chat and dice session server. Clients create rooms over
//! HTTP, then join them over a WebSocket to exchange chat messages and
//! broadcast dice rolls to everyone at the table.
//!
//! This crate is the outer shell: the axum router, the WebSocket channel
//! implementation, and the server builder. The protocol itself lives in
//! the layers below (`tavern-session`, `tavern-room`, `tavern-protocol`,
//! `tavern-dice`).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tavern::TavernServer;
//!
//! # async fn start() -> Result<(), tavern::TavernError> {
//! let server = TavernServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Endpoints
//!
//! - `POST /room` with `{"host_id": ..., "password": ...}` allocates a
//!   room (or returns the host's existing one)
//! - `GET /rooms` lists live rooms
//! - `GET /ws/{room_id}/{user_id}` upgrades to the session protocol

mod error;
mod http;
pub mod logging;
mod server;
mod ws;

pub use error::TavernError;
pub use server::{
    DEMO_ROOM_HOST, DEMO_ROOM_ID, ServerState, TavernServer,
    TavernServerBuilder,
};
