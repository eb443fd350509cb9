//! HTTP handlers for room creation and listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tavern_protocol::{
    CreateRoomRequest, CreateRoomResponse, CreateRoomStatus, RoomListResponse,
};
use tavern_room::CreateOutcome;

use crate::ServerState;

/// `POST /room`: allocate a room, or answer with the host's existing one.
pub(crate) async fn create_room(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Json<CreateRoomResponse> {
    let outcome = state.registry.create(request.host_id, &request.password);

    let (status, handle) = match &outcome {
        CreateOutcome::Created(handle) => {
            (CreateRoomStatus::RoomCreated, handle)
        }
        CreateOutcome::ExistingForHost(handle) => {
            (CreateRoomStatus::HostAlreadyHasRoom, handle)
        }
    };

    Json(CreateRoomResponse {
        status,
        room_id: handle.room_id().clone(),
    })
}

/// `GET /rooms`: list live rooms for display.
pub(crate) async fn list_rooms(
    State(state): State<Arc<ServerState>>,
) -> Json<RoomListResponse> {
    Json(RoomListResponse {
        rooms: state.registry.list().await,
    })
}
