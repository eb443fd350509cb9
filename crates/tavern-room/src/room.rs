//! Room actor: an isolated Tokio task that owns one room's state.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Membership changes and broadcasts are handled
//! one command at a time, so every `room_info` snapshot reflects a
//! consistent membership set and room-level operations are totally
//! ordered.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tavern_dice::{RollFormula, RollResults};
use tavern_protocol::{ChatRecord, RoomEvent, RoomId, ServerEvent, UserId};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomError, RoomRegistry};

/// A participant's outbound queue handle.
///
/// Unbounded so the actor never blocks on a slow consumer; the connection
/// side drains the queue into the socket at its own pace. A closed
/// receiver (dead connection) makes sends fail, which the actor silently
/// drops.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Operations sent to a room actor through its mailbox.
///
/// Variants carrying a `oneshot::Sender` are request/reply: the caller
/// awaits the reply channel, which also guarantees the command (and any
/// broadcast it triggered) has been fully processed.
pub(crate) enum RoomCommand {
    /// Attach a participant. Overwrites any existing entry for the same
    /// user id (last writer wins on rejoin).
    Join {
        user_id: UserId,
        sender: EventSender,
        reply: oneshot::Sender<()>,
    },

    /// Detach a participant. A no-op if the user is not attached.
    Leave {
        user_id: UserId,
        reply: oneshot::Sender<()>,
    },

    /// Append to history and broadcast a `new_message` event.
    Message { from: UserId, text: String },

    /// Broadcast a `dice_rolled` event. History is untouched; the
    /// narrative line sent alongside it is what lands in the log.
    Roll {
        from: UserId,
        formula: RollFormula,
        dices_result: RollResults,
        total: i64,
    },

    /// Request the full chat log.
    History {
        reply: oneshot::Sender<Vec<ChatRecord>>,
    },

    /// Request a membership snapshot.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// A consistent view of a room's identity and membership.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    /// The room's unique id.
    pub room_id: RoomId,
    /// The creating user. Informational only.
    pub host_id: UserId,
    /// Attached participant ids, sorted ascending.
    pub participants: Vec<UserId>,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the registry holds one per room and hands out clones
/// on lookup. The room's identity and password are immutable, so they
/// live on the handle and never need an actor round-trip.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    host_id: UserId,
    password: Arc<str>,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns the creating user's id.
    pub fn host_id(&self) -> &UserId {
        &self.host_id
    }

    /// Returns `true` if joining this room requires a password.
    pub fn requires_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Checks a password attempt against the room's password.
    pub fn verify_password(&self, attempt: &str) -> bool {
        *self.password == *attempt
    }

    /// Attaches a participant and broadcasts the updated `room_info` to
    /// every attached channel, the new one included.
    ///
    /// Rejoining with an id that is already attached replaces the
    /// previous channel handle.
    pub async fn join(
        &self,
        user_id: UserId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                user_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Detaches a participant and broadcasts the updated `room_info` to
    /// the remaining channels. Detaching the last participant removes
    /// the room from the registry before this call returns.
    pub async fn leave(&self, user_id: UserId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                user_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Appends a chat line to history and broadcasts it to every
    /// participant, the sender included.
    pub async fn send_message(
        &self,
        from: UserId,
        text: String,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { from, text })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Broadcasts a resolved dice roll to every participant.
    pub async fn send_roll(
        &self,
        from: UserId,
        formula: RollFormula,
        dices_result: RollResults,
        total: i64,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Roll {
                from,
                formula,
                dices_result,
                total,
            })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Returns the full chat log, in broadcast order.
    pub async fn history(&self) -> Result<Vec<ChatRecord>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::History { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Returns a consistent membership snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    host_id: UserId,
    participants: HashMap<UserId, EventSender>,
    history: Vec<ChatRecord>,
    /// Back-reference for self-removal when the room empties. `Weak` so
    /// a lingering actor can never keep the registry alive.
    registry: Weak<RoomRegistry>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until the room empties out (or every handle is
    /// dropped).
    async fn run(mut self) {
        tracing::debug!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    user_id,
                    sender,
                    reply,
                } => {
                    self.handle_join(user_id, sender);
                    let _ = reply.send(());
                }
                RoomCommand::Leave { user_id, reply } => {
                    let emptied = self.handle_leave(&user_id);
                    let _ = reply.send(());
                    if emptied {
                        break;
                    }
                }
                RoomCommand::Message { from, text } => {
                    self.handle_message(from, text);
                }
                RoomCommand::Roll {
                    from,
                    formula,
                    dices_result,
                    total,
                } => {
                    self.broadcast(RoomEvent::DiceRolled {
                        from,
                        formula,
                        dices_result,
                        total,
                    });
                }
                RoomCommand::History { reply } => {
                    let _ = reply.send(self.history.clone());
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room closed");
    }

    fn handle_join(&mut self, user_id: UserId, sender: EventSender) {
        if self.participants.insert(user_id.clone(), sender).is_some() {
            tracing::debug!(
                room_id = %self.room_id,
                %user_id,
                "rejoin replaced previous channel"
            );
        }
        tracing::info!(
            room_id = %self.room_id,
            %user_id,
            online = self.participants.len(),
            "participant joined"
        );
        self.broadcast_room_info();
    }

    /// Removes a participant. Returns `true` if the room is now empty,
    /// in which case it has already been removed from the registry.
    fn handle_leave(&mut self, user_id: &UserId) -> bool {
        if self.participants.remove(user_id).is_none() {
            return false;
        }
        tracing::info!(
            room_id = %self.room_id,
            %user_id,
            online = self.participants.len(),
            "participant left"
        );

        if self.participants.is_empty() {
            // Unregister before acking the leave so the caller observes
            // the room gone as soon as its leave() returns.
            if let Some(registry) = self.registry.upgrade() {
                registry.remove(&self.room_id);
            }
            return true;
        }

        self.broadcast_room_info();
        false
    }

    fn handle_message(&mut self, from: UserId, text: String) {
        self.history.push(ChatRecord {
            from: from.clone(),
            text: text.clone(),
        });
        self.broadcast(RoomEvent::NewMessage { from, text });
    }

    fn broadcast_room_info(&self) {
        let RoomSnapshot {
            room_id,
            host_id,
            participants,
        } = self.snapshot();
        self.broadcast(RoomEvent::RoomInfo {
            room_id,
            host_id,
            participants,
        });
    }

    /// Fans an event out to every attached channel. Sends to closed
    /// queues (dead connections) are silently dropped.
    fn broadcast(&self, event: RoomEvent) {
        let event = ServerEvent::from(event);
        for sender in self.participants.values() {
            let _ = sender.send(event.clone());
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        let mut participants: Vec<UserId> =
            self.participants.keys().cloned().collect();
        participants.sort();
        RoomSnapshot {
            room_id: self.room_id.clone(),
            host_id: self.host_id.clone(),
            participants,
        }
    }
}

/// Spawns a room actor task and returns its handle.
pub(crate) fn spawn_room(
    room_id: RoomId,
    host_id: UserId,
    password: &str,
    registry: Weak<RoomRegistry>,
    mailbox_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(mailbox_size);

    let actor = RoomActor {
        room_id: room_id.clone(),
        host_id: host_id.clone(),
        participants: HashMap::new(),
        history: Vec::new(),
        registry,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        host_id,
        password: Arc::from(password),
        sender: tx,
    }
}
