use std::net::{Shutdown, TcpStream};
use std::os::fd::{AsRawFd, RawFd};

use thiserror::Error;

/// Maximum number of concurrently connected clients
pub const MAX_CLIENT: usize = 30;

/// Connection lifecycle of a live session; a released slot holds no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no registration line seen yet
    Unnamed,
    /// Nickname registered, immutable for the rest of the session
    Named,
}

/// One accepted client connection plus its nickname and display metadata
///
/// The stream is owned exclusively by the table while the session is live.
#[derive(Debug)]
pub struct Session {
    stream: TcpStream,
    nickname: Option<String>,
    display_info: String,
}

impl Session {
    pub fn new(stream: TcpStream, display_info: String) -> Self {
        Session {
            stream,
            nickname: None,
            display_info,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.nickname.is_some() {
            SessionState::Named
        } else {
            SessionState::Unnamed
        }
    }

    /// Nickname if registered, the empty string otherwise
    pub fn nickname(&self) -> &str {
        self.nickname.as_deref().unwrap_or("")
    }

    pub fn is_named(&self) -> bool {
        self.nickname.is_some()
    }

    /// `hostname:ip:slot`, fixed at accept time
    pub fn display_info(&self) -> &str {
        &self.display_info
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// All client slots occupied
///
/// Carries the rejected session back to the caller, which must close the
/// connection without admitting it.
#[derive(Debug, Error)]
#[error("session table full, all {capacity} slots occupied")]
pub struct CapacityExceeded {
    pub capacity: usize,
    pub rejected: Session,
}

/// Bounded, slot-indexed registry of live sessions
///
/// Mutated only by the event loop, so it needs no internal locking. Slot
/// acquisition always picks the lowest free index: numbering is
/// deterministic and released slots are reused before fresh ones.
#[derive(Debug)]
pub struct SessionTable {
    slots: Vec<Option<Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CLIENT)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        SessionTable { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.peek_free_slot().is_none()
    }

    /// The slot the next `acquire` will pick
    ///
    /// Stable between the peek and the acquire because the table is only
    /// ever touched from the event loop.
    pub fn peek_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    /// Reserve the lowest free slot for `session`
    pub fn acquire(&mut self, session: Session) -> Result<usize, CapacityExceeded> {
        match self.peek_free_slot() {
            Some(slot) => {
                self.slots[slot] = Some(session);
                Ok(slot)
            }
            None => Err(CapacityExceeded {
                capacity: self.capacity(),
                rejected: session,
            }),
        }
    }

    /// Register a nickname; the first registration wins
    ///
    /// Returns false when the slot is free or already named, leaving any
    /// existing name untouched.
    pub fn set_nickname(&mut self, slot: usize, name: &str) -> bool {
        match self.slots.get_mut(slot) {
            Some(Some(session)) if session.nickname.is_none() => {
                session.nickname = Some(name.to_string());
                true
            }
            _ => false,
        }
    }

    /// Shut the connection down and free the slot
    pub fn release(&mut self, slot: usize) -> Option<Session> {
        let session = self.slots.get_mut(slot)?.take()?;
        session.shutdown();
        Some(session)
    }

    pub fn get(&self, slot: usize) -> Option<&Session> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Session> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Live sessions in ascending slot order
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, &Session)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|session| (slot, session)))
    }

    /// Live sessions in ascending slot order, mutably; broadcast fan-out
    /// filters the sender out of this
    pub fn iter_live_mut(&mut self) -> impl Iterator<Item = (usize, &mut Session)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_mut().map(|session| (slot, session)))
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
