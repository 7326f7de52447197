//! Server error types.

use std::io;

use thiserror::Error;

/// Fatal server failures
///
/// Everything else, accept errors, capacity refusals, peer disconnects and
/// per-recipient write failures, is handled where it occurs and never
/// propagates out of the event loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created or bound. Reported before
    /// the loop starts, the process exits non-zero.
    #[error("failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    /// The epoll instance could not be created or the listener could not be
    /// registered on it.
    #[error("failed to set up readiness polling: {0}")]
    PollSetup(#[source] io::Error),

    /// The readiness wait itself failed. The loop cannot continue.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),
}
