//! The session driver: runs one connection through the state machine.

use std::sync::Arc;

use tavern_dice::{format_formula, resolve};
use tavern_protocol::{
    ClientAction, HistoryReply, PasswordAttempt, RoomEvent, RoomId,
    ServerEvent, StatusEvent, UserId,
};
use tavern_room::{RoomHandle, RoomRegistry};

use crate::{ParticipantChannel, SessionError, SessionInput, SessionState};

/// Drives one client connection from room lookup to cleanup.
///
/// `room_id` and `user_id` are bound by the caller (route parameters)
/// and immutable for the session's lifetime. The channel is always
/// closed before this returns, and a participant entry never outlives
/// the call: explicit `leave_room` and an abrupt disconnect run the same
/// cleanup.
///
/// The returned error is informational; everything it describes has
/// already been handled locally.
pub async fn run_session<C: ParticipantChannel>(
    registry: Arc<RoomRegistry>,
    room_id: RoomId,
    user_id: UserId,
    channel: C,
) -> Result<(), SessionError> {
    let mut session = Session {
        registry,
        room_id,
        user_id,
        channel,
        state: SessionState::Connecting,
    };
    let result = session.drive().await;
    session.channel.close().await;

    tracing::debug!(
        room_id = %session.room_id,
        user_id = %session.user_id,
        state = %session.state,
        "session ended"
    );
    result
}

struct Session<C> {
    registry: Arc<RoomRegistry>,
    room_id: RoomId,
    user_id: UserId,
    channel: C,
    state: SessionState,
}

impl<C: ParticipantChannel> Session<C> {
    async fn drive(&mut self) -> Result<(), SessionError> {
        // --- Connecting ---
        let Some(room) = self.registry.lookup(&self.room_id) else {
            let _ = self.channel.send(StatusEvent::RoomNotFound.into());
            self.advance(SessionInput::RoomMissing);
            return Err(SessionError::RoomNotFound(self.room_id.clone()));
        };

        if room.requires_password() {
            self.advance(SessionInput::RoomLocked);
            if !self.await_password(&room).await? {
                return Ok(()); // disconnected before answering
            }
        } else {
            self.advance(SessionInput::RoomOpen);
        }

        // --- Joined ---
        self.enter_room(&room).await?;
        self.serve(&room).await
    }

    /// AwaitingPassword: evaluates exactly one attempt.
    ///
    /// Returns `Ok(true)` when the attempt matched (the session is now
    /// advancing to Joined), `Ok(false)` when the client disconnected
    /// without answering.
    async fn await_password(
        &mut self,
        room: &RoomHandle,
    ) -> Result<bool, SessionError> {
        self.channel
            .send(StatusEvent::PasswordRequired.into())
            .map_err(SessionError::from)?;

        let Some(frame) = self.channel.receive().await else {
            self.advance(SessionInput::ConnectionLost);
            return Ok(false);
        };

        // A frame that is not a password reply still consumes the single
        // attempt, as the empty password.
        let attempt = PasswordAttempt::from_json(&frame).unwrap_or_default();

        if !room.verify_password(&attempt.password) {
            tracing::info!(
                room_id = %self.room_id,
                user_id = %self.user_id,
                "password rejected"
            );
            let _ = self.channel.send(StatusEvent::WrongPassword.into());
            self.advance(SessionInput::PasswordRejected);
            return Err(SessionError::AuthenticationFailed(
                self.room_id.clone(),
            ));
        }

        self.advance(SessionInput::PasswordAccepted);
        Ok(true)
    }

    /// Entry into Joined: confirm, attach, announce.
    ///
    /// The confirmation goes out first so the client sees `joined_room`
    /// before the `room_info` broadcast its own join triggers.
    async fn enter_room(&mut self, room: &RoomHandle) -> Result<(), SessionError> {
        self.channel
            .send(StatusEvent::JoinedRoom.into())
            .map_err(SessionError::from)?;

        room.join(self.user_id.clone(), self.channel.outbound())
            .await?;
        room.send_message(
            UserId::system(),
            format!("{} has joined the room.", self.user_id),
        )
        .await?;
        Ok(())
    }

    /// The Joined action loop.
    async fn serve(&mut self, room: &RoomHandle) -> Result<(), SessionError> {
        loop {
            let Some(frame) = self.channel.receive().await else {
                // Abrupt disconnect: identical cleanup to leave_room.
                self.depart(room).await;
                self.advance(SessionInput::ConnectionLost);
                return Ok(());
            };

            let action = match ClientAction::from_json(&frame) {
                Ok(action) => action,
                Err(error) => {
                    tracing::debug!(
                        user_id = %self.user_id,
                        %error,
                        "ignoring unrecognized frame"
                    );
                    continue;
                }
            };

            match action {
                ClientAction::SendMessage { message } => {
                    room.send_message(self.user_id.clone(), message).await?;
                }

                ClientAction::GetChatHistory => {
                    let messages = room.history().await?;
                    self.reply(HistoryReply { messages }.into(), room)
                        .await?;
                }

                ClientAction::GetRoomInfo => {
                    let snapshot = room.snapshot().await?;
                    self.reply(
                        RoomEvent::RoomInfo {
                            room_id: snapshot.room_id,
                            host_id: snapshot.host_id,
                            participants: snapshot.participants,
                        }
                        .into(),
                        room,
                    )
                    .await?;
                }

                ClientAction::RollDice { formula } => {
                    let (total, dices_result) = resolve(&formula);
                    let rendered = format_formula(&formula);
                    let narrative = if rendered == "1d2" {
                        format!("{} flipped a coin: {total}", self.user_id)
                    } else {
                        format!(
                            "{} rolled the dice {rendered}: {total}",
                            self.user_id
                        )
                    };
                    room.send_message(UserId::system(), narrative).await?;
                    room.send_roll(
                        self.user_id.clone(),
                        formula,
                        dices_result,
                        total,
                    )
                    .await?;
                }

                ClientAction::LeaveRoom => {
                    self.depart(room).await;
                    self.advance(SessionInput::LeaveRequested);
                    return Ok(());
                }
            }
        }
    }

    /// Sends a direct reply; a dead outbound queue means the client is
    /// gone, so run disconnect cleanup before surfacing the error.
    async fn reply(
        &mut self,
        event: ServerEvent,
        room: &RoomHandle,
    ) -> Result<(), SessionError> {
        if let Err(closed) = self.channel.send(event) {
            self.depart(room).await;
            self.advance(SessionInput::ConnectionLost);
            return Err(closed.into());
        }
        Ok(())
    }

    /// Shared cleanup for leave_room and disconnects: detach, announce.
    ///
    /// When the departing user was the last participant the room is
    /// already gone by the time the narrative is sent; that send failing
    /// is expected.
    async fn depart(&mut self, room: &RoomHandle) {
        if room.leave(self.user_id.clone()).await.is_ok() {
            let _ = room
                .send_message(
                    UserId::system(),
                    format!("{} has left the room.", self.user_id),
                )
                .await;
        }
    }

    fn advance(&mut self, input: SessionInput) {
        // The driver only feeds inputs the table defines; an undefined
        // pair still lands somewhere safe.
        self.state = self.state.apply(input).unwrap_or(SessionState::Closed);
    }
}
