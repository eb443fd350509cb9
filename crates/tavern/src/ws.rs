//! WebSocket glue: upgrades connections and adapts them to the
//! session layer's `ParticipantChannel`.
//!
//! Each connection gets an unbounded outbound queue. Room broadcasts and
//! direct session replies both land in that queue; a dedicated forward
//! task drains it into the socket. A slow client therefore backs up only
//! its own queue while the room actor keeps fanning out to everyone
//! else.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tavern_protocol::{RoomId, ServerEvent, UserId};
use tavern_room::EventSender;
use tavern_session::{ParticipantChannel, run_session};
use tokio::sync::mpsc;

use crate::ServerState;

/// `GET /ws/{room_id}/{user_id}`: entry point for new connections.
///
/// The path parameters bind the session's identity before the protocol
/// handler takes over; both are immutable for the connection's lifetime.
pub(crate) async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path((room_id, user_id)): Path<(String, String)>,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        handle_socket(
            socket,
            state,
            RoomId::new(room_id),
            UserId::new(user_id),
        )
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<ServerState>,
    room_id: RoomId,
    user_id: UserId,
) {
    let (ws_tx, ws_rx) = socket.split();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let forward = tokio::spawn(forward_events(event_rx, ws_tx));

    let channel = WsChannel {
        outbound: Some(event_tx),
        socket: ws_rx,
    };

    if let Err(error) = run_session(
        Arc::clone(&state.registry),
        room_id.clone(),
        user_id.clone(),
        channel,
    )
    .await
    {
        tracing::debug!(%room_id, %user_id, %error, "session closed");
    }

    // The session dropped its queue handles; wait for the forwarder to
    // flush what's left and close the socket.
    let _ = forward.await;
}

/// Drains a connection's event queue into its socket.
///
/// Ends when every queue handle is gone (session over, participant entry
/// removed) or the socket dies; either way the socket is closed on the
/// way out.
async fn forward_events(
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    mut ws_tx: SplitSink<WebSocket, Message>,
) {
    while let Some(event) = events.recv().await {
        let text = match event.to_json() {
            Ok(text) => text,
            Err(error) => {
                tracing::error!(%error, "dropping unencodable event");
                continue;
            }
        };
        if ws_tx.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
    let _ = ws_tx.close().await;
}

/// `ParticipantChannel` over an axum WebSocket.
struct WsChannel {
    /// `None` once the session has closed the channel; the forward task
    /// notices the queue closing and shuts the socket down.
    outbound: Option<EventSender>,
    socket: SplitStream<WebSocket>,
}

impl ParticipantChannel for WsChannel {
    fn outbound(&self) -> EventSender {
        match &self.outbound {
            Some(sender) => sender.clone(),
            // After close(): hand out a sender whose sends always fail.
            None => mpsc::unbounded_channel().0,
        }
    }

    async fn receive(&mut self) -> Option<String> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Binary(data)) => {
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => return Some(text),
                        Err(_) => continue,
                    }
                }
                Ok(Message::Close(_)) => return None,
                // Ping/pong are answered by axum itself.
                Ok(_) => continue,
                Err(error) => {
                    tracing::debug!(%error, "websocket receive failed");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        // Dropping the queue handle is the close: the forward task
        // flushes pending events, then closes the socket.
        self.outbound.take();
    }
}
