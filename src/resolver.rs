use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::debug;

/// Placeholder host when reverse lookup fails or takes too long
pub const FALLBACK_HOST: &str = "unknown";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolve the display hostname for a peer address
///
/// The lookup runs on a worker thread and is abandoned after
/// `LOOKUP_TIMEOUT`, so a dead resolver can delay one accept but never
/// wedge the event loop.
pub fn resolve_hostname(ip: IpAddr) -> String {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(dns_lookup::lookup_addr(&ip).ok());
    });

    match rx.recv_timeout(LOOKUP_TIMEOUT) {
        Ok(Some(host)) => host,
        Ok(None) => FALLBACK_HOST.to_string(),
        Err(_) => {
            debug!("reverse lookup for {ip} timed out");
            FALLBACK_HOST.to_string()
        }
    }
}
