//! Typed error types for the printer link.

use std::io;
use std::time::Duration;

/// Failure conditions while polling a printer, categorized by type.
///
/// Transport errors abort the remaining command sequence for the current
/// poll cycle; data-quality errors are scoped to a single command's derived
/// fields. Use [`LinkError::is_transport()`] to tell them apart.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    // -- Connection --
    /// The printer actively refused the connection (e.g. port not open).
    #[error("connection refused: {addr}")]
    ConnectionRefused {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// TCP connect timed out before the printer responded.
    #[error("connection timed out: {addr} ({timeout:?})")]
    ConnectionTimeout {
        /// The address that was attempted.
        addr: String,
        /// The configured timeout that elapsed.
        timeout: Duration,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Connection failed for a reason other than refusal or timeout.
    #[error("connection failed: {addr}")]
    ConnectionFailed {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The printer closed the connection mid-sequence.
    #[error("connection closed by printer")]
    ConnectionClosed,

    // -- Address --
    /// DNS resolution found no addresses for the given host string.
    #[error("no address found for host: {0}")]
    NoAddressFound(String),

    // -- I/O --
    /// Writing a command to the printer failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// Reading a response from the printer failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),

    /// The printer did not respond to a command within the read timeout.
    #[error("read timed out waiting for response to {command}")]
    ReadTimeout {
        /// The command that was awaiting a response.
        command: &'static str,
    },

    // -- Protocol --
    /// A command-specific transform did not find the structure it expected.
    ///
    /// Scoped to that command's derived fields only; the rest of the poll
    /// cycle continues with the untransformed fields.
    #[error("malformed {command} response: {details}")]
    MalformedResponse {
        /// The command whose response failed to decode.
        command: &'static str,
        /// Human-readable description of the decoding failure.
        details: String,
    },
}

impl LinkError {
    /// Returns `true` if this error is a transport failure that aborts the
    /// remaining command sequence, as opposed to a data-quality issue scoped
    /// to one command's derived fields.
    pub fn is_transport(&self) -> bool {
        !matches!(self, LinkError::MalformedResponse { .. })
    }
}
