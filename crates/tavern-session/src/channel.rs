//! The bidirectional channel a session drives.
//!
//! The protocol core never touches sockets. A [`ParticipantChannel`]
//! gives it everything it needs: an outbound event queue shared with the
//! room (broadcast fan-out and direct replies land in the same queue, so
//! per-connection delivery order equals enqueue order) and an inbound
//! stream of text frames. The server crate implements this over an axum
//! WebSocket; tests implement it over plain mpsc channels.

use tavern_protocol::ServerEvent;
use tavern_room::EventSender;

/// The connection's outbound queue is gone; the peer can no longer be
/// reached. Treated exactly like a disconnect.
#[derive(Debug, thiserror::Error)]
#[error("participant channel closed")]
pub struct ChannelClosed;

/// One client's bidirectional channel.
pub trait ParticipantChannel: Send {
    /// Returns the outbound queue handle.
    ///
    /// Clones of this are what the room stores per participant; direct
    /// session replies go through the same queue via [`send`](Self::send).
    fn outbound(&self) -> EventSender;

    /// Enqueues an event for delivery to this client. Non-blocking; a
    /// slow client backs up its own queue, nobody else's.
    fn send(&self, event: ServerEvent) -> Result<(), ChannelClosed> {
        self.outbound().send(event).map_err(|_| ChannelClosed)
    }

    /// Waits for the next inbound text frame.
    ///
    /// Returns `None` when the client disconnected or the transport
    /// failed; the session treats both identically.
    async fn receive(&mut self) -> Option<String>;

    /// Closes the connection once pending outbound events have flushed.
    async fn close(&mut self);
}
