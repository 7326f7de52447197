use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use chat_relay::{ChatServer, ShutdownFlag};

/// Long enough for the single-threaded loop to accept a connection and
/// finish the reverse lookup for loopback.
pub const SETTLE: Duration = Duration::from_millis(300);

pub fn start_test_server(capacity: usize) -> (SocketAddr, ShutdownFlag) {
    let mut server = ChatServer::with_capacity("127.0.0.1:0", capacity).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_flag();

    thread::spawn(move || {
        server.run().unwrap();
    });

    (addr, shutdown)
}

/// Connect `count` clients one at a time so slots are assigned in order
pub fn connect_clients(addr: SocketAddr, count: usize) -> Vec<TcpStream> {
    (0..count)
        .map(|_| {
            let stream = TcpStream::connect(addr).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            thread::sleep(SETTLE);
            stream
        })
        .collect()
}

/// Read whatever has arrived within the stream's read timeout
pub fn read_chunk(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 1024];
    match stream.read(&mut buf) {
        Ok(n) => String::from_utf8_lossy(&buf[..n]).into_owned(),
        Err(_) => String::new(),
    }
}

/// Assert that nothing is delivered to `stream` within a short window
pub fn assert_silent(stream: &mut TcpStream) {
    stream
        .set_read_timeout(Some(Duration::from_millis(300)))
        .unwrap();
    let received = read_chunk(stream);
    assert!(
        received.is_empty(),
        "expected no delivery, got: {}",
        received
    );
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
}
