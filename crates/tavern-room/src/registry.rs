//! Room registry: the process-wide collection of live rooms.
//!
//! The registry owns nothing but handles; room state lives in the
//! actors. Its map sits behind a `std::sync::Mutex` that is only ever
//! held for map operations (never across an await), so registry
//! contention is independent of any individual room's workload.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use tavern_protocol::{RoomId, RoomSummary, UserId};

use crate::room::{RoomHandle, spawn_room};

/// Mailbox size for room actors. Joins, leaves, and chat all flow
/// through this channel; it only backpressures a room that is being
/// hammered faster than its actor can fan events out.
const ROOM_MAILBOX_SIZE: usize = 64;

/// Outcome of a create request.
pub enum CreateOutcome {
    /// A new room was allocated under a fresh id.
    Created(RoomHandle),
    /// The host already has a live room; that room is returned instead
    /// of allocating a duplicate.
    ExistingForHost(RoomHandle),
}

impl CreateOutcome {
    /// The handle, regardless of which way the request went.
    pub fn handle(&self) -> &RoomHandle {
        match self {
            Self::Created(handle) | Self::ExistingForHost(handle) => handle,
        }
    }
}

/// Process-wide collection of live rooms.
///
/// Constructed as an `Arc` because emptying rooms unregister themselves
/// through a `Weak` back-reference.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rooms: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a room for `host_id`, or returns the host's existing room.
    ///
    /// One live room per host: a second create from the same host answers
    /// with the first room's handle instead of allocating another. Fresh
    /// ids are 16 hex characters, regenerated on the (practically
    /// impossible) collision.
    pub fn create(
        self: &Arc<Self>,
        host_id: UserId,
        password: &str,
    ) -> CreateOutcome {
        let mut rooms = self.lock();

        if let Some(existing) =
            rooms.values().find(|handle| *handle.host_id() == host_id)
        {
            tracing::debug!(
                %host_id,
                room_id = %existing.room_id(),
                "host already has a room"
            );
            return CreateOutcome::ExistingForHost(existing.clone());
        }

        let room_id = loop {
            let candidate = generate_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            room_id.clone(),
            host_id,
            password,
            Arc::downgrade(self),
            ROOM_MAILBOX_SIZE,
        );
        rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room created");

        CreateOutcome::Created(handle)
    }

    /// Creates a room under a caller-chosen id (the built-in demo room).
    ///
    /// Idempotent: if the id is already live, the existing handle is
    /// returned untouched.
    pub fn seed(
        self: &Arc<Self>,
        room_id: RoomId,
        host_id: UserId,
        password: &str,
    ) -> RoomHandle {
        let mut rooms = self.lock();
        if let Some(existing) = rooms.get(&room_id) {
            return existing.clone();
        }

        let handle = spawn_room(
            room_id.clone(),
            host_id,
            password,
            Arc::downgrade(self),
            ROOM_MAILBOX_SIZE,
        );
        rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room seeded");
        handle
    }

    /// Looks up a live room by id.
    pub fn lookup(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.lock().get(room_id).cloned()
    }

    /// Lists all live rooms for display.
    ///
    /// Takes a snapshot of the handles, then queries each actor for its
    /// online count without holding the registry lock. Rooms that stop
    /// mid-scan are skipped.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.lock().values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(snapshot) = handle.snapshot().await {
                summaries.push(RoomSummary {
                    room_id: snapshot.room_id,
                    host_id: snapshot.host_id,
                    online: snapshot.participants.len(),
                    password_required: handle.requires_password(),
                });
            }
        }
        summaries
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.lock().len()
    }

    /// Unregisters a room. Called by the room's own actor when its last
    /// participant leaves.
    pub(crate) fn remove(&self, room_id: &RoomId) {
        if self.lock().remove(room_id).is_some() {
            tracing::info!(%room_id, "room removed from registry");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoomId, RoomHandle>> {
        // A poisoned map is still structurally sound; carry on.
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Generates a random 16-hex-character room id (64 bits).
///
/// Unguessable enough to avoid casual collision; not a security
/// boundary.
fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    RoomId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}
