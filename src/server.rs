use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, ToSocketAddrs};
use std::os::fd::AsRawFd;

use log::{debug, error, info, warn};

use crate::epoll::{Epoll, Event, Token};
use crate::error::ServerError;
use crate::protocol::{self, ClientEvent};
use crate::resolver::resolve_hostname;
use crate::session::{MAX_CLIENT, Session, SessionTable};
use crate::shutdown::ShutdownFlag;

/// One read per readiness event consumes at most this many bytes; a line is
/// whatever one read returns, there is no partial-line reassembly.
const BUF_SIZE: usize = 512;

/// Chat relay server instance
///
/// Owns the listening socket, the epoll instance and the session table.
/// Everything runs on the calling thread: accept, read, decode and
/// broadcast for one readiness batch complete before the next wait, so the
/// table is never touched concurrently.
pub struct ChatServer {
    listener: TcpListener,
    epoll: Epoll,
    sessions: SessionTable,
    shutdown: ShutdownFlag,
}

impl ChatServer {
    /// Bind with the default `MAX_CLIENT` session capacity
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, ServerError> {
        Self::with_capacity(addr, MAX_CLIENT)
    }

    /// Bind with an explicit session capacity
    pub fn with_capacity<A: ToSocketAddrs>(addr: A, capacity: usize) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).map_err(ServerError::Bind)?;
        listener.set_nonblocking(true).map_err(ServerError::Bind)?;

        let epoll = Epoll::new().map_err(ServerError::PollSetup)?;

        Ok(ChatServer {
            listener,
            epoll,
            sessions: SessionTable::with_capacity(capacity),
            shutdown: ShutdownFlag::new(),
        })
    }

    /// Handle used to stop the loop from a signal handler or another thread
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// The local address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the event loop until the shutdown flag is raised
    ///
    /// Each iteration blocks on the readiness wait, then dispatches the
    /// listener first and ready sessions in ascending slot order. The
    /// listening socket closes when the server is dropped after this
    /// returns.
    pub fn run(&mut self) -> Result<(), ServerError> {
        self.epoll
            .add_interest(
                self.listener.as_raw_fd(),
                Event::new(Token::Listener).readable(),
            )
            .map_err(ServerError::PollSetup)?;

        while !self.shutdown.is_triggered() {
            let mut events = Vec::with_capacity(self.sessions.capacity() + 1);
            self.epoll
                .wait(&mut events, None)
                .map_err(ServerError::Wait)?;

            if events.is_empty() {
                continue;
            }

            let mut tokens: Vec<Token> = events.iter().map(Event::token).collect();
            tokens.sort();

            for token in tokens {
                match token {
                    Token::Listener => self.accept_client(),
                    Token::Slot(slot) => self.service_session(slot),
                }
            }
        }

        info!("Server shutting down gracefully");
        Ok(())
    }

    /// Admit one pending connection, or refuse it when the room is full
    fn accept_client(&mut self) {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(err) if err.kind() == ErrorKind::WouldBlock => return,
            Err(err) => {
                error!("accept failed: {err}");
                return;
            }
        };

        // Room full: accept and close right away. A level-triggered
        // listener with a pending connection would otherwise report ready
        // on every wait.
        let Some(slot) = self.sessions.peek_free_slot() else {
            warn!(
                "refusing {peer}: all {} slots occupied",
                self.sessions.capacity()
            );
            let _ = stream.shutdown(Shutdown::Both);
            return;
        };

        if let Err(err) = stream.set_nonblocking(true) {
            error!("failed to set {peer} non-blocking: {err}");
            return;
        }

        let host = resolve_hostname(peer.ip());
        let display_info = format!("{host}:{}:{slot}", peer.ip());
        let fd = stream.as_raw_fd();

        match self.sessions.acquire(Session::new(stream, display_info)) {
            Ok(slot) => {
                let event = Event::new(Token::Slot(slot)).readable().peer_hangup();
                if let Err(err) = self.epoll.add_interest(fd, event) {
                    error!("failed to register slot {slot}: {err}");
                    self.sessions.release(slot);
                    return;
                }
                if let Some(session) = self.sessions.get(slot) {
                    info!("Connection established: [{}]", session.display_info());
                }
            }
            Err(refused) => {
                warn!("refusing {peer}: {refused}");
            }
        }
    }

    /// Read once from a ready session and apply whatever the line asks for
    fn service_session(&mut self, slot: usize) {
        let mut buf = [0u8; BUF_SIZE];
        let read = {
            // the slot may have been vacated earlier in this same batch
            let Some(session) = self.sessions.get_mut(slot) else {
                return;
            };
            session.stream_mut().read(&mut buf)
        };

        let len = match read {
            Ok(0) => {
                // peer closed without a quit line: free the slot, no
                // announcement
                self.remove_session(slot);
                return;
            }
            Ok(len) => len,
            Err(err) if err.kind() == ErrorKind::WouldBlock => return,
            Err(err) => {
                error!("read failed on slot {slot}: {err}");
                self.remove_session(slot);
                return;
            }
        };

        let raw = String::from_utf8_lossy(&buf[..len]);
        let line = raw.trim_end_matches(['\r', '\n']);

        let (named, nickname, display_info) = {
            let Some(session) = self.sessions.get(slot) else {
                return;
            };
            (
                session.is_named(),
                session.nickname().to_string(),
                session.display_info().to_string(),
            )
        };

        match protocol::classify(line, named) {
            ClientEvent::Register { name } => {
                if self.sessions.set_nickname(slot, &name) {
                    debug!("slot {slot} registered nickname {name:?}");
                    self.broadcast_except(slot, &protocol::render_join(&name));
                }
            }
            ClientEvent::Quit => {
                self.remove_session(slot);
                self.broadcast_except(slot, &protocol::render_leave(&nickname));
            }
            ClientEvent::Chat { text } => {
                self.broadcast_except(slot, &protocol::render_chat(&nickname, &text, &display_info));
            }
        }
    }

    /// Deregister, shut down and free one session
    fn remove_session(&mut self, slot: usize) {
        let Some(fd) = self.sessions.get(slot).map(Session::as_raw_fd) else {
            return;
        };

        if let Err(err) = self.epoll.remove_interest(fd) {
            warn!("failed to deregister slot {slot}: {err}");
        }

        if let Some(session) = self.sessions.release(slot) {
            info!("Connection removed: [{}]", session.display_info());
        }
    }

    /// Fan one rendered line out to every live session except the sender,
    /// in ascending slot order
    ///
    /// A failed write to one recipient is logged and skipped; it neither
    /// aborts delivery to the rest nor releases the recipient here, the
    /// broken connection is reaped by its own next read.
    fn broadcast_except(&mut self, sender: usize, line: &str) {
        for (slot, session) in self.sessions.iter_live_mut() {
            if slot == sender {
                continue;
            }
            match session.stream_mut().write(line.as_bytes()) {
                Ok(written) => debug!("{written} bytes relayed from slot {sender} to slot {slot}"),
                Err(err) => error!("failed to relay to slot {slot}: {err}"),
            }
        }
    }
}
