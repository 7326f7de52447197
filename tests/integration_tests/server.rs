use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;

use crate::common::{SETTLE, assert_silent, connect_clients, read_chunk, start_test_server};

#[test]
fn test_server_accepts_connections() {
    let (addr, shutdown) = start_test_server(30);

    let stream = TcpStream::connect(addr);
    assert!(stream.is_ok(), "Should be able to connect to server");

    shutdown.trigger();
}

#[test]
fn test_end_to_end_room_scenario() {
    let (addr, shutdown) = start_test_server(30);
    let mut clients = connect_clients(addr, 3);

    // A registers; B and C see the announcement, A does not
    clients[0].write_all(b"/Alice\n").unwrap();
    thread::sleep(SETTLE);

    let b_received = read_chunk(&mut clients[1]);
    assert!(
        b_received.contains("Alice join the room..."),
        "B should see Alice join. Got: {}",
        b_received
    );
    let c_received = read_chunk(&mut clients[2]);
    assert!(
        c_received.contains("Alice join the room..."),
        "C should see Alice join. Got: {}",
        c_received
    );
    assert_silent(&mut clients[0]);

    // B registers; A and C see it
    clients[1].write_all(b"/Bob\n").unwrap();
    thread::sleep(SETTLE);

    assert!(read_chunk(&mut clients[0]).contains("Bob join the room..."));
    assert!(read_chunk(&mut clients[2]).contains("Bob join the room..."));

    // A chats; B and C get the attributed line, A never sees its own echo
    clients[0].write_all(b"hello\n").unwrap();
    thread::sleep(SETTLE);

    let b_received = read_chunk(&mut clients[1]);
    assert!(
        b_received.contains("Alice: hello"),
        "B should get the chat line. Got: {}",
        b_received
    );
    assert!(
        b_received.contains("[from "),
        "chat line should carry sender attribution. Got: {}",
        b_received
    );
    assert!(read_chunk(&mut clients[2]).contains("Alice: hello"));
    assert_silent(&mut clients[0]);

    shutdown.trigger();
}

#[test]
fn test_quit_announces_leave_to_remaining_clients() {
    let (addr, shutdown) = start_test_server(30);
    let mut clients = connect_clients(addr, 3);

    clients[0].write_all(b"/Alice\n").unwrap();
    thread::sleep(SETTLE);
    read_chunk(&mut clients[1]);
    read_chunk(&mut clients[2]);

    clients[0].write_all(b"/q\n").unwrap();
    thread::sleep(SETTLE);

    let b_received = read_chunk(&mut clients[1]);
    assert!(
        b_received.contains("Alice leave the room..."),
        "B should see Alice leave. Got: {}",
        b_received
    );
    assert!(read_chunk(&mut clients[2]).contains("Alice leave the room..."));

    // the quitting client is sent nothing further, its connection is closed
    let mut buf = [0u8; 64];
    let closed = matches!(clients[0].read(&mut buf), Ok(0) | Err(_));
    assert!(closed, "quitting client's connection should be closed");

    shutdown.trigger();
}

#[test]
fn test_capacity_refusal_and_admission_after_release() {
    let (addr, shutdown) = start_test_server(2);
    let mut clients = connect_clients(addr, 2);

    // the third concurrent connection is refused outright
    let mut refused = connect_clients(addr, 1).remove(0);
    let mut buf = [0u8; 64];
    let closed = matches!(refused.read(&mut buf), Ok(0) | Err(_));
    assert!(closed, "connection beyond capacity should be closed");

    // a slot frees up, the next attempt is admitted and served
    clients[0].write_all(b"/q\n").unwrap();
    thread::sleep(SETTLE);
    read_chunk(&mut clients[1]);

    let mut admitted = connect_clients(addr, 1).remove(0);
    clients[1].write_all(b"hello again\n").unwrap();
    thread::sleep(SETTLE);

    let received = read_chunk(&mut admitted);
    assert!(
        received.contains("hello again"),
        "client admitted after a release should be served. Got: {}",
        received
    );

    shutdown.trigger();
}

#[test]
fn test_first_registration_wins() {
    let (addr, shutdown) = start_test_server(30);
    let mut clients = connect_clients(addr, 2);

    clients[0].write_all(b"/alice\n").unwrap();
    thread::sleep(SETTLE);
    read_chunk(&mut clients[1]);

    // a second registration line is relayed as literal text, not honored
    clients[0].write_all(b"/bob\n").unwrap();
    thread::sleep(SETTLE);

    let received = read_chunk(&mut clients[1]);
    assert!(
        received.contains("alice: /bob"),
        "second registration should be relayed as chat from alice. Got: {}",
        received
    );

    shutdown.trigger();
}

#[test]
fn test_disconnect_without_quit_is_reaped_silently() {
    let (addr, shutdown) = start_test_server(30);
    let mut clients = connect_clients(addr, 3);

    // close without sending /q
    drop(clients.remove(0));
    thread::sleep(SETTLE);

    // the server keeps relaying between the remaining clients
    clients[0].write_all(b"/carol\n").unwrap();
    thread::sleep(SETTLE);

    let received = read_chunk(&mut clients[1]);
    assert!(
        received.contains("carol join the room..."),
        "server should keep serving after a silent disconnect. Got: {}",
        received
    );
    assert!(
        !received.contains("leave the room"),
        "a silent disconnect is not announced. Got: {}",
        received
    );

    shutdown.trigger();
}

#[test]
fn test_released_slot_is_reused_lowest_first() {
    let (addr, shutdown) = start_test_server(30);
    let mut clients = connect_clients(addr, 2);

    // slot 0 leaves
    clients[0].write_all(b"/q\n").unwrap();
    thread::sleep(SETTLE);
    read_chunk(&mut clients[1]);

    // the next client takes slot 0 and its attribution shows it
    let mut reused = connect_clients(addr, 1).remove(0);
    reused.write_all(b"/dave\n").unwrap();
    thread::sleep(SETTLE);
    read_chunk(&mut clients[1]);

    reused.write_all(b"ping\n").unwrap();
    thread::sleep(SETTLE);

    let received = read_chunk(&mut clients[1]);
    assert!(
        received.contains("dave: ping"),
        "reused slot should relay normally. Got: {}",
        received
    );
    assert!(
        received.contains("127.0.0.1:0]"),
        "display info should show the reused slot 0. Got: {}",
        received
    );

    shutdown.trigger();
}
