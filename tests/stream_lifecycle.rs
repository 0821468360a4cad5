extern crate env_logger;
extern crate h2_conn;

mod support;

use h2_conn::{Connection, Error, Reason, State, User};
use support::{id, Event, EventLog};

#[test]
fn client_creates_stream_half_closes_then_closes() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);
    let log = EventLog::new();
    conn.add_listener(Box::new(log.clone()));

    assert_eq!(conn.local().next_stream_id(), Some(id(3)));

    conn.local_mut().create_stream(id(3), false).unwrap();

    assert_eq!(conn.stream(id(3)).unwrap().state(), State::Open);
    assert_eq!(conn.num_active_streams(), 1);
    assert_eq!(conn.local().last_stream_created(), id(3));
    assert_eq!(log.take(), vec![Event::Added(id(3)), Event::Active(id(3))]);

    conn.stream_mut(id(3)).unwrap().close_local_side().unwrap();

    assert_eq!(conn.stream(id(3)).unwrap().state(), State::HalfClosedLocal);
    assert_eq!(log.take(), vec![Event::HalfClosed(id(3))]);

    conn.stream_mut(id(3)).unwrap().close_remote_side().unwrap();

    // The immediate removal policy unlinks the stream synchronously.
    assert!(conn.stream(id(3)).is_none());
    assert_eq!(conn.num_active_streams(), 0);
    assert_eq!(log.take(), vec![Event::Inactive(id(3)), Event::Removed(id(3))]);

    // The connection stream is untouched.
    assert_eq!(conn.connection_stream().id(), id(0));
    assert!(conn.stream(id(0)).is_some());
}

#[test]
fn streams_created_half_closed() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);

    conn.local_mut().create_stream(id(3), true).unwrap();
    assert_eq!(conn.stream(id(3)).unwrap().state(), State::HalfClosedLocal);

    conn.remote_mut().create_stream(id(2), true).unwrap();
    assert_eq!(conn.stream(id(2)).unwrap().state(), State::HalfClosedRemote);

    // Both count as active.
    assert_eq!(conn.num_active_streams(), 2);
}

#[test]
fn half_close_is_idempotent() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);
    let log = EventLog::new();
    conn.add_listener(Box::new(log.clone()));

    conn.local_mut().create_stream(id(3), false).unwrap();
    log.take();

    conn.stream_mut(id(3)).unwrap().close_local_side().unwrap();
    assert_eq!(log.take(), vec![Event::HalfClosed(id(3))]);

    // Closing the same side again changes nothing.
    conn.stream_mut(id(3)).unwrap().close_local_side().unwrap();
    assert_eq!(conn.stream(id(3)).unwrap().state(), State::HalfClosedLocal);
    assert!(log.is_empty());
}

#[test]
fn close_unlinks_under_immediate_policy() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);

    conn.local_mut().create_stream(id(3), false).unwrap();
    conn.stream_mut(id(3)).unwrap().close().unwrap();

    // Unlinked synchronously; a second close is unreachable because the
    // stream can no longer be resolved. (Idempotence with the stream
    // still in the map is covered by the deferred-policy suite.)
    assert!(conn.stream(id(3)).is_none());
    assert!(conn.stream_mut(id(3)).is_none());
}

#[test]
fn closing_open_stream_directly_deactivates() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);
    let log = EventLog::new();
    conn.add_listener(Box::new(log.clone()));

    conn.local_mut().create_stream(id(3), false).unwrap();
    log.take();

    conn.stream_mut(id(3)).unwrap().close().unwrap();

    assert_eq!(conn.num_active_streams(), 0);
    assert_eq!(log.take(), vec![Event::Inactive(id(3)), Event::Removed(id(3))]);
}

#[test]
fn connection_stream_refuses_mutation() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(true);

    assert_eq!(
        conn.stream_mut(id(0)).unwrap().close(),
        Err(Error::User(User::ConnectionStream))
    );
    assert_eq!(
        conn.stream_mut(id(0)).unwrap().close_local_side(),
        Err(Error::User(User::ConnectionStream))
    );
    assert_eq!(
        conn.stream_mut(id(0)).unwrap().close_remote_side(),
        Err(Error::User(User::ConnectionStream))
    );
    assert_eq!(
        conn.stream_mut(id(0)).unwrap().open_for_push(),
        Err(Error::User(User::ConnectionStream))
    );
    assert_eq!(
        conn.stream_mut(id(0)).unwrap().set_priority(id(3), 16, false),
        Err(Error::User(User::ConnectionStream))
    );

    let root = conn.connection_stream();
    assert!(root.is_root());
    assert_eq!(root.state(), State::Idle);
    assert_eq!(
        root.verify_state(Reason::PROTOCOL_ERROR, &[State::Idle]),
        Err(Error::User(User::ConnectionStream))
    );

    // Still never part of the active set.
    assert_eq!(conn.num_active_streams(), 0);
}

#[test]
fn verify_state_checks_whitelist() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);
    conn.local_mut().create_stream(id(3), false).unwrap();

    let stream = conn.stream(id(3)).unwrap();
    assert!(
        stream
            .verify_state(Reason::PROTOCOL_ERROR, &[State::Open, State::HalfClosedLocal])
            .is_ok()
    );

    // The error code is the caller's choice.
    assert_eq!(
        stream.verify_state(Reason::STREAM_CLOSED, &[State::Idle]),
        Err(Error::Proto(Reason::STREAM_CLOSED))
    );
}

#[test]
fn require_stream_missing_is_protocol_error() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);

    assert_eq!(
        conn.require_stream(id(11)).err(),
        Some(Error::Proto(Reason::PROTOCOL_ERROR))
    );
    assert_eq!(
        conn.require_stream_mut(id(11)).err(),
        Some(Error::Proto(Reason::PROTOCOL_ERROR))
    );

    conn.local_mut().create_stream(id(3), false).unwrap();
    assert!(conn.require_stream(id(3)).is_ok());
}

#[test]
fn active_streams_iterate_in_activation_order() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);

    conn.local_mut().create_stream(id(3), false).unwrap();
    conn.local_mut().create_stream(id(5), false).unwrap();
    conn.local_mut().create_stream(id(7), false).unwrap();

    let ids: Vec<u32> = conn.active_streams().map(|s| s.id().into()).collect();
    assert_eq!(ids, &[3, 5, 7]);

    // Dropping the middle stream preserves the order of the rest.
    conn.stream_mut(id(5)).unwrap().close().unwrap();

    let ids: Vec<u32> = conn.active_streams().map(|s| s.id().into()).collect();
    assert_eq!(ids, &[3, 7]);
    assert_eq!(conn.num_active_streams(), 2);
}

#[test]
fn removed_listener_stops_observing() {
    let _ = env_logger::try_init();

    let mut conn: Connection<()> = Connection::new(false);
    let log = EventLog::new();
    let token = conn.add_listener(Box::new(log.clone()));

    conn.local_mut().create_stream(id(3), false).unwrap();
    assert_eq!(log.take().len(), 2);

    conn.remove_listener(token);

    conn.local_mut().create_stream(id(5), false).unwrap();
    assert!(log.is_empty());
}

#[test]
fn flow_slots_hold_subsystem_state() {
    let _ = env_logger::try_init();

    #[derive(Debug, PartialEq)]
    struct Window(i32);

    let mut conn: Connection<Window> = Connection::new(false);
    conn.local_mut().create_stream(id(3), false).unwrap();

    assert!(conn.stream(id(3)).unwrap().inbound_flow().is_none());
    assert!(conn.stream(id(3)).unwrap().outbound_flow().is_none());

    {
        let mut stream = conn.stream_mut(id(3)).unwrap();
        stream.set_inbound_flow(Window(65_535));
        stream.set_outbound_flow(Window(65_535));
        stream.inbound_flow_mut().unwrap().0 += 1_000;
        stream.outbound_flow_mut().unwrap().0 -= 1_000;
    }

    let stream = conn.stream(id(3)).unwrap();
    assert_eq!(stream.inbound_flow(), Some(&Window(66_535)));
    assert_eq!(stream.outbound_flow(), Some(&Window(64_535)));
}
