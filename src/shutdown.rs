use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

/// Cloneable termination flag shared between the event loop and the signal
/// handlers
///
/// Once set it stays set, so a second termination request is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the flag on the process termination signals
    ///
    /// The blocked readiness wait returns with EINTR when a signal lands,
    /// the loop observes the flag and exits instead of waiting again.
    pub fn install(&self) -> io::Result<()> {
        for signal in TERM_SIGNALS {
            flag::register(*signal, Arc::clone(&self.0))?;
        }
        Ok(())
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
