//! Printer address resolution.
//!
//! Accepts the formats users actually type for a printer on the LAN:
//! `IP`, `IP:PORT`, `hostname`, `hostname:PORT`. The port defaults to the
//! FlashForge control port, 8899.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::error::LinkError;

/// The TCP control port FlashForge firmware listens on.
pub const DEFAULT_PORT: u16 = 8899;

/// Resolve a printer address string to a `SocketAddr`.
///
/// Accepted formats:
/// - `192.168.1.50:8899` — IP with explicit port
/// - `192.168.1.50` — IP without port (defaults to 8899)
/// - `finder.local:8899` — hostname with port
/// - `finder.local` — hostname without port (defaults to 8899)
///
/// For hostnames that resolve to multiple addresses (dual-stack), the first
/// result is used.
pub fn resolve_addr(input: &str) -> Result<SocketAddr, LinkError> {
    // Full socket address, including bracketed IPv6 ("[::1]:8899").
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Bare IP without a port.
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    // host:port through DNS.
    if let Ok(mut addrs) = input.to_socket_addrs()
        && let Some(addr) = addrs.next()
    {
        return Ok(addr);
    }

    // Bare hostname through DNS with the default port.
    if let Ok(mut addrs) = (input, DEFAULT_PORT).to_socket_addrs()
        && let Some(addr) = addrs.next()
    {
        return Ok(addr);
    }

    Err(LinkError::NoAddressFound(input.to_string()))
}
