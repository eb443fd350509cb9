//! Integration tests for room actors and the registry.

use tavern_dice::{RollFormula, RollResults};
use tavern_protocol::{RoomEvent, RoomId, ServerEvent, UserId};
use tavern_room::{CreateOutcome, EventSender, RoomRegistry};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn uid(id: &str) -> UserId {
    UserId::new(id)
}

/// A participant-side channel pair: the sender goes into the room, the
/// receiver collects whatever the room broadcasts.
fn channel() -> (EventSender, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

/// Drains every event currently queued on a receiver.
fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Pulls the participant lists out of every `room_info` event in a batch.
fn room_info_participants(events: &[ServerEvent]) -> Vec<Vec<UserId>> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::Room(RoomEvent::RoomInfo { participants, .. }) => {
                Some(participants.clone())
            }
            _ => None,
        })
        .collect()
}

// =========================================================================
// Registry: create / seed / lookup
// =========================================================================

#[tokio::test]
async fn test_create_allocates_and_registers_a_room() {
    let registry = RoomRegistry::new();

    let outcome = registry.create(uid("host"), "");
    let CreateOutcome::Created(handle) = outcome else {
        panic!("expected a fresh room");
    };

    assert_eq!(handle.room_id().as_str().len(), 16);
    assert_eq!(registry.room_count(), 1);
    assert!(registry.lookup(handle.room_id()).is_some());
}

#[tokio::test]
async fn test_create_for_same_host_returns_existing_room() {
    let registry = RoomRegistry::new();
    let first = registry.create(uid("host"), "secret");

    let second = registry.create(uid("host"), "other");

    match second {
        CreateOutcome::ExistingForHost(handle) => {
            assert_eq!(handle.room_id(), first.handle().room_id());
        }
        CreateOutcome::Created(_) => panic!("expected the existing room"),
    }
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test]
async fn test_create_for_different_hosts_allocates_distinct_rooms() {
    let registry = RoomRegistry::new();

    let a = registry.create(uid("alice"), "");
    let b = registry.create(uid("bob"), "");

    assert_ne!(a.handle().room_id(), b.handle().room_id());
    assert_eq!(registry.room_count(), 2);
}

#[tokio::test]
async fn test_seed_uses_the_given_id_and_is_idempotent() {
    let registry = RoomRegistry::new();

    let handle =
        registry.seed(RoomId::new("example_room_01"), uid("host_example"), "");
    assert_eq!(handle.room_id().as_str(), "example_room_01");

    let again =
        registry.seed(RoomId::new("example_room_01"), uid("someone_else"), "");
    assert_eq!(again.host_id(), &uid("host_example"));
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test]
async fn test_lookup_unknown_id_returns_none() {
    let registry = RoomRegistry::new();
    assert!(registry.lookup(&RoomId::new("nope")).is_none());
}

// =========================================================================
// Password checks live on the handle
// =========================================================================

#[tokio::test]
async fn test_password_checks() {
    let registry = RoomRegistry::new();
    let open = registry.create(uid("a"), "");
    let locked = registry.create(uid("b"), "x");

    assert!(!open.handle().requires_password());
    assert!(locked.handle().requires_password());
    assert!(locked.handle().verify_password("x"));
    assert!(!locked.handle().verify_password("y"));
    assert!(!locked.handle().verify_password(""));
}

// =========================================================================
// Join / leave broadcasts
// =========================================================================

#[tokio::test]
async fn test_join_broadcasts_room_info_to_everyone_including_joiner() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (alice_tx, mut alice_rx) = channel();
    room.join(uid("alice"), alice_tx).await.unwrap();

    let infos = room_info_participants(&drain(&mut alice_rx));
    assert_eq!(infos, vec![vec![uid("alice")]]);

    let (bob_tx, mut bob_rx) = channel();
    room.join(uid("bob"), bob_tx).await.unwrap();

    // Both the existing participant and the new one see the updated set,
    // sorted ascending.
    let expected = vec![uid("alice"), uid("bob")];
    assert_eq!(
        room_info_participants(&drain(&mut alice_rx)),
        vec![expected.clone()]
    );
    assert_eq!(room_info_participants(&drain(&mut bob_rx)), vec![expected]);
}

#[tokio::test]
async fn test_rejoin_overwrites_previous_channel() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (old_tx, mut old_rx) = channel();
    room.join(uid("alice"), old_tx).await.unwrap();
    drain(&mut old_rx);

    let (new_tx, mut new_rx) = channel();
    room.join(uid("alice"), new_tx).await.unwrap();

    // Still a single participant entry.
    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.participants, vec![uid("alice")]);

    // Broadcasts now land on the replacement channel only.
    room.send_message(uid("alice"), "hi".into()).await.unwrap();
    room.history().await.unwrap(); // round-trip to flush the mailbox
    assert!(drain(&mut old_rx).is_empty());
    assert_eq!(drain(&mut new_rx).len(), 2); // room_info + new_message
}

#[tokio::test]
async fn test_leave_broadcasts_updated_membership_to_remaining() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (alice_tx, mut alice_rx) = channel();
    let (bob_tx, mut bob_rx) = channel();
    room.join(uid("alice"), alice_tx).await.unwrap();
    room.join(uid("bob"), bob_tx).await.unwrap();
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    room.leave(uid("bob")).await.unwrap();

    assert_eq!(
        room_info_participants(&drain(&mut alice_rx)),
        vec![vec![uid("alice")]]
    );
    assert!(drain(&mut bob_rx).is_empty());
}

#[tokio::test]
async fn test_leave_of_absent_user_is_a_no_op() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (alice_tx, mut alice_rx) = channel();
    room.join(uid("alice"), alice_tx).await.unwrap();
    drain(&mut alice_rx);

    room.leave(uid("ghost")).await.unwrap();

    assert!(drain(&mut alice_rx).is_empty());
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test]
async fn test_last_leave_removes_room_from_registry() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();
    let room_id = room.room_id().clone();

    let (tx, _rx) = channel();
    room.join(uid("alice"), tx).await.unwrap();
    assert!(registry.lookup(&room_id).is_some());

    room.leave(uid("alice")).await.unwrap();

    // The removal happens as part of the leave, not eventually.
    assert!(registry.lookup(&room_id).is_none());
    assert_eq!(registry.room_count(), 0);
}

#[tokio::test]
async fn test_operations_on_a_closed_room_return_unavailable() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (tx, _rx) = channel();
    room.join(uid("alice"), tx).await.unwrap();
    room.leave(uid("alice")).await.unwrap();

    let result = room.history().await;
    assert!(matches!(
        result,
        Err(tavern_room::RoomError::Unavailable(_))
    ));
}

// =========================================================================
// Chat history and rolls
// =========================================================================

#[tokio::test]
async fn test_messages_append_to_history_in_order() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (alice_tx, mut alice_rx) = channel();
    let (bob_tx, mut bob_rx) = channel();
    room.join(uid("alice"), alice_tx).await.unwrap();
    room.join(uid("bob"), bob_tx).await.unwrap();

    room.send_message(uid("alice"), "one".into()).await.unwrap();
    room.send_message(uid("bob"), "two".into()).await.unwrap();
    room.send_message(uid("alice"), "three".into()).await.unwrap();

    let history = room.history().await.unwrap();
    let lines: Vec<(String, String)> = history
        .iter()
        .map(|record| (record.from.to_string(), record.text.clone()))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("alice".into(), "one".into()),
            ("bob".into(), "two".into()),
            ("alice".into(), "three".into()),
        ]
    );

    // Every participant, the senders included, saw all three messages in
    // the same order.
    for rx in [&mut alice_rx, &mut bob_rx] {
        let texts: Vec<String> = drain(rx)
            .into_iter()
            .filter_map(|event| match event {
                ServerEvent::Room(RoomEvent::NewMessage { text, .. }) => {
                    Some(text)
                }
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}

#[tokio::test]
async fn test_roll_broadcasts_but_does_not_touch_history() {
    let registry = RoomRegistry::new();
    let room = registry.create(uid("host"), "").handle().clone();

    let (tx, mut rx) = channel();
    room.join(uid("alice"), tx).await.unwrap();
    drain(&mut rx);

    room.send_roll(uid("alice"), RollFormula::default(), RollResults::new(), 0)
        .await
        .unwrap();

    let history = room.history().await.unwrap();
    assert!(history.is_empty());

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::Room(RoomEvent::DiceRolled { total: 0, .. })]
    ));
}

// =========================================================================
// Listing
// =========================================================================

#[tokio::test]
async fn test_list_reports_online_counts_and_password_flags() {
    let registry = RoomRegistry::new();
    let open = registry.create(uid("alice"), "").handle().clone();
    registry.create(uid("bob"), "pw");

    let (tx1, _rx1) = channel();
    let (tx2, _rx2) = channel();
    open.join(uid("p1"), tx1).await.unwrap();
    open.join(uid("p2"), tx2).await.unwrap();

    let mut rooms = registry.list().await;
    rooms.sort_by(|a, b| a.host_id.cmp(&b.host_id));

    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].host_id, uid("alice"));
    assert_eq!(rooms[0].online, 2);
    assert!(!rooms[0].password_required);
    assert_eq!(rooms[1].host_id, uid("bob"));
    assert_eq!(rooms[1].online, 0);
    assert!(rooms[1].password_required);
}
