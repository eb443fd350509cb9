//! `TavernServer` builder and run loop.
//!
//! Ties the layers together: the axum router dispatches HTTP requests to
//! the registry and hands upgraded WebSockets to the session driver.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tavern_protocol::{RoomId, UserId};
use tavern_room::RoomRegistry;
use tokio::net::TcpListener;

use crate::TavernError;
use crate::{http, ws};

/// Id of the room seeded at startup so a fresh server is joinable
/// without a create call.
pub const DEMO_ROOM_ID: &str = "example_room_01";

/// Host of the seeded demo room.
pub const DEMO_ROOM_HOST: &str = "host_example";

/// Shared state handed to every request handler.
///
/// Wrapped in `Arc` by the router; no ambient globals anywhere.
pub struct ServerState {
    pub registry: Arc<RoomRegistry>,
}

/// Builder for configuring and starting a Tavern server.
pub struct TavernServerBuilder {
    bind_addr: String,
    demo_room: bool,
}

impl TavernServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            demo_room: true,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Enables or disables seeding the demo room at startup.
    pub fn demo_room(mut self, enabled: bool) -> Self {
        self.demo_room = enabled;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<TavernServer, TavernError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;

        let registry = RoomRegistry::new();
        if self.demo_room {
            registry.seed(
                RoomId::new(DEMO_ROOM_ID),
                UserId::new(DEMO_ROOM_HOST),
                "",
            );
        }

        Ok(TavernServer {
            listener,
            state: Arc::new(ServerState { registry }),
        })
    }
}

impl Default for TavernServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound, ready-to-run Tavern server.
pub struct TavernServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl TavernServer {
    /// Creates a new builder.
    pub fn builder() -> TavernServerBuilder {
        TavernServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), TavernError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "tavern server running");
        }
        axum::serve(self.listener, router(self.state))
            .await
            .map_err(TavernError::Io)
    }
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/room", post(http::create_room))
        .route("/rooms", get(http::list_rooms))
        .route("/ws/{room_id}/{user_id}", get(ws::websocket_handler))
        .with_state(state)
}
