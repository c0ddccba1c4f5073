//! The TCP printer link: one connection, one command sequence, one snapshot.
//!
//! A poll cycle opens a fresh connection, issues the configured commands in
//! order (strictly request/response — the protocol has no multiplexing, and
//! later commands depend on control having been acquired first), and merges
//! each interpreted response into the running snapshot. Failures are data:
//! a transport error stops the sequence and the snapshot accumulated so far
//! is returned with an error description, never a panic or an `Err`.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tracing::{debug, warn};

use crate::addr::resolve_addr;
use crate::command::Command;
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::fields::FieldMap;
use crate::interpret::interpret;
use crate::parse::split_fields;
use crate::snapshot::Snapshot;

/// Largest single response read. The firmware answers each command with a
/// short burst well under this; a larger response truncates, which the
/// lenient parser tolerates.
pub(crate) const RESPONSE_BUFFER_SIZE: usize = 1024;

/// A polling client for one printer.
///
/// Holds no connection between polls — each [`poll()`](PrinterLink::poll)
/// opens and closes its own TCP session, so a failed cycle leaves nothing
/// to clean up. Concurrent polls against the same printer are not safe by
/// design; the caller's scheduler must serialize them.
pub struct PrinterLink {
    addr: SocketAddr,
    commands: Vec<Command>,
    config: LinkConfig,
}

impl PrinterLink {
    /// Create a link to a printer at a resolved socket address.
    pub fn new(addr: SocketAddr, commands: Vec<Command>, config: LinkConfig) -> Self {
        Self {
            addr,
            commands,
            config,
        }
    }

    /// Create a link from a user-supplied address string
    /// (see [`resolve_addr`]).
    pub fn resolve(
        input: &str,
        commands: Vec<Command>,
        config: LinkConfig,
    ) -> Result<Self, LinkError> {
        Ok(Self::new(resolve_addr(input)?, commands, config))
    }

    /// The printer address this link polls.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run one poll cycle and return its snapshot.
    ///
    /// Connects, issues every configured command in order, interprets each
    /// response, and closes the connection. On a transport failure at any
    /// step no further commands are attempted and the snapshot carries the
    /// fields accumulated so far plus the error; when any response bytes
    /// were received this cycle, the most recent raw response is attached
    /// for diagnostics.
    pub fn poll(&self) -> Snapshot {
        let mut fields = FieldMap::new();
        let mut last_raw: Option<String> = None;

        let mut stream = match self.open_stream() {
            Ok(stream) => stream,
            Err(e) => {
                warn!(addr = %self.addr, error = %e, "poll failed to connect");
                return Snapshot::degraded(fields, &e, None);
            }
        };

        for &command in &self.commands {
            let raw = match exchange(&mut stream, command) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(command = command.name(), error = %e, "poll aborted mid-sequence");
                    let _ = stream.shutdown(Shutdown::Both);
                    return Snapshot::degraded(fields, &e, last_raw);
                }
            };
            debug!(command = command.name(), bytes = raw.len(), "response received");

            if self.config.debug {
                fields.insert(format!("Debug({})", command.name()), raw.clone());
            }
            match interpret(command, &raw) {
                Ok(parsed) => fields.merge(parsed),
                Err(e) => {
                    // Data-quality failure: the derivation for this command
                    // is dropped but its plain fields and the rest of the
                    // cycle survive.
                    warn!(command = command.name(), error = %e, "malformed response");
                    fields.merge(split_fields(&raw));
                }
            }
            last_raw = Some(raw);
        }

        let _ = stream.shutdown(Shutdown::Both);
        Snapshot::complete(fields)
    }

    /// Open a connection and configure it (nodelay, keepalive, timeouts).
    fn open_stream(&self) -> Result<TcpStream, LinkError> {
        let timeout = self.config.timeout;
        let stream = TcpStream::connect_timeout(&self.addr, timeout).map_err(|e| {
            match e.kind() {
                io::ErrorKind::ConnectionRefused => LinkError::ConnectionRefused {
                    addr: self.addr.to_string(),
                    source: e,
                },
                io::ErrorKind::TimedOut => LinkError::ConnectionTimeout {
                    addr: self.addr.to_string(),
                    timeout,
                    source: e,
                },
                _ => LinkError::ConnectionFailed {
                    addr: self.addr.to_string(),
                    source: e,
                },
            }
        })?;

        configure_stream(&stream, &self.addr, timeout)?;
        Ok(stream)
    }
}

/// Send one command and read its single response, bounded by the stream's
/// read timeout and [`RESPONSE_BUFFER_SIZE`].
fn exchange<S: Read + Write>(stream: &mut S, command: Command) -> Result<String, LinkError> {
    stream
        .write_all(command.wire_bytes())
        .map_err(LinkError::WriteFailed)?;
    stream.flush().map_err(LinkError::WriteFailed)?;

    let mut buf = [0u8; RESPONSE_BUFFER_SIZE];
    let n = match stream.read(&mut buf) {
        Ok(0) => return Err(LinkError::ConnectionClosed),
        Ok(n) => n,
        Err(ref e)
            if matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) =>
        {
            return Err(LinkError::ReadTimeout {
                command: command.name(),
            });
        }
        Err(e) => return Err(LinkError::ReadFailed(e)),
    };

    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

/// Configure TCP_NODELAY, keepalive, and read/write timeouts on a stream.
fn configure_stream(
    stream: &TcpStream,
    addr: &SocketAddr,
    timeout: Duration,
) -> Result<(), LinkError> {
    let failed = |source: io::Error| LinkError::ConnectionFailed {
        addr: addr.to_string(),
        source,
    };

    stream.set_nodelay(true).map_err(failed)?;

    let keepalive = TcpKeepalive::new().with_time(Duration::from_secs(60));
    SockRef::from(stream)
        .set_tcp_keepalive(&keepalive)
        .map_err(failed)?;

    stream.set_write_timeout(Some(timeout)).map_err(failed)?;
    stream.set_read_timeout(Some(timeout)).map_err(failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSet;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// A canned response script for the mock printer: one entry per
    /// expected command. `Some(text)` answers with the text; `None` reads
    /// the command but stays silent (holding the connection open) to
    /// provoke a client-side read timeout.
    fn mock_printer(
        script: Vec<Option<&'static str>>,
    ) -> (SocketAddr, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut received = Vec::new();
            let (mut stream, _) = listener.accept().unwrap();
            for response in script {
                let mut buf = [0u8; 256];
                let n = match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                received.push(String::from_utf8_lossy(&buf[..n]).into_owned());
                match response {
                    Some(text) => {
                        stream.write_all(text.as_bytes()).unwrap();
                    }
                    None => {
                        // Stay silent past the client's timeout.
                        thread::sleep(Duration::from_millis(600));
                        break;
                    }
                }
            }
            received
        });

        (addr, handle)
    }

    fn fast_config() -> LinkConfig {
        LinkConfig {
            timeout: Duration::from_millis(200),
            ..LinkConfig::default()
        }
    }

    #[test]
    fn full_poll_merges_every_interpreted_response() {
        let (addr, server) = mock_printer(vec![
            Some("CMD M601 Received.\r\nControl Success.\r\nok\r\n"),
            Some("CMD M119 Received.\r\nStatus: READY\r\nok\r\n"),
            Some("CMD M115 Received.\r\nMachineType:Flashforge Finder\r\nX:500\r\nok\r\n"),
            Some("CMD M114 Received.\r\nX:12.5 Y:30.1 Z:0.4\r\nok\r\n"),
            Some("CMD M105 Received.\r\nT0:25.3/26.0B:24.0/25.0\r\nok\r\n"),
            Some("CMD M27 Received.\r\nSD printing byte 120/4000\r\nok\r\n"),
        ]);

        let link = PrinterLink::new(addr, CommandSet::default().commands(), fast_config());
        let snapshot = link.poll();

        assert!(!snapshot.is_degraded(), "error: {:?}", snapshot.error());
        assert_eq!(snapshot.status(), Some("READY"));
        assert_eq!(snapshot.get("MaxSize").unwrap().as_text(), Some("X:500"));
        assert_eq!(
            snapshot.get("HeadPosition").unwrap().as_text(),
            Some("X:12.5 Y:30.1 Z:0.4")
        );
        assert_eq!(snapshot.get("TempT0").unwrap().as_text(), Some("25.3"));
        assert_eq!(snapshot.get("TempB_Target").unwrap().as_text(), Some("25.0"));
        assert_eq!(snapshot.get("ByteProgress").unwrap().as_text(), Some("120"));
        assert_eq!(
            snapshot.get("ProgressPercent").unwrap().as_number(),
            Some(3.0)
        );
        assert_eq!(snapshot.raw_data(), None);

        let received = server.join().unwrap();
        assert_eq!(
            received,
            vec![
                "~M601 S1\r\n",
                "~M119\r\n",
                "~M115\r\n",
                "~M114\r\n",
                "~M105\r\n",
                "~M27\r\n",
            ]
        );
    }

    #[test]
    fn later_command_keys_overwrite_earlier_ones() {
        let (addr, server) = mock_printer(vec![
            Some("Status: pending\r\nok\r\n"),
            Some("Status: READY\r\nok\r\n"),
        ]);

        let set = CommandSet {
            include_info: false,
            include_head_position: false,
            include_temperature: false,
            include_progress: false,
        };
        let link = PrinterLink::new(addr, set.commands(), fast_config());
        let snapshot = link.poll();

        assert!(!snapshot.is_degraded());
        assert_eq!(snapshot.status(), Some("READY"));
        server.join().unwrap();
    }

    #[test]
    fn connection_refused_yields_bare_degraded_snapshot() {
        // Bind then drop a listener so the port is known to be closed.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let link = PrinterLink::new(addr, CommandSet::default().commands(), fast_config());
        let snapshot = link.poll();

        assert!(snapshot.is_degraded());
        assert!(snapshot.fields().is_empty());
        assert_eq!(snapshot.raw_data(), None);
        assert!(
            snapshot.error().unwrap().contains("connection"),
            "error: {:?}",
            snapshot.error()
        );
    }

    #[test]
    fn timeout_on_third_command_keeps_first_two_commands_fields() {
        let status_response = "CMD M119 Received.\r\nStatus: READY\r\nok\r\n";
        let (addr, server) = mock_printer(vec![
            Some("CMD M601 Received.\r\nControl Success.\r\nok\r\n"),
            Some(status_response),
            None, // ~M115 never answered
        ]);

        // Five commands configured; the third times out.
        let set = CommandSet {
            include_progress: false,
            ..CommandSet::default()
        };
        let link = PrinterLink::new(addr, set.commands(), fast_config());
        let snapshot = link.poll();

        assert!(snapshot.is_degraded());
        assert_eq!(snapshot.status(), Some("READY"));
        assert!(snapshot.error().unwrap().contains("~M115"));
        // Nothing from the commands after the failure.
        assert!(!snapshot.fields().contains_key("MaxSize"));
        assert!(!snapshot.fields().contains_key("HeadPosition"));
        assert!(!snapshot.fields().contains_key("TempT0"));
        // Diagnostics carry the last response that did arrive.
        assert_eq!(snapshot.raw_data(), Some(status_response));

        let received = server.join().unwrap();
        assert_eq!(received.len(), 3);
    }

    #[test]
    fn connection_closed_mid_sequence_is_reported() {
        // Server answers the first command then hangs up.
        let (addr, server) = mock_printer(vec![Some("Control Success.\r\nok\r\n")]);

        let set = CommandSet {
            include_info: false,
            include_head_position: false,
            include_temperature: false,
            include_progress: false,
        };
        let link = PrinterLink::new(addr, set.commands(), fast_config());
        let snapshot = link.poll();

        assert!(snapshot.is_degraded());
        assert!(
            snapshot.error().unwrap().contains("closed"),
            "error: {:?}",
            snapshot.error()
        );
        assert_eq!(snapshot.raw_data(), Some("Control Success.\r\nok\r\n"));
        server.join().unwrap();
    }

    #[test]
    fn malformed_temperature_degrades_one_command_not_the_poll() {
        let (addr, server) = mock_printer(vec![
            Some("ok\r\n"),
            Some("Status: READY\r\nok\r\n"),
            Some("T0:garbled\r\nok\r\n"),
            Some("SD printing byte 50/200\r\nok\r\n"),
        ]);

        let set = CommandSet {
            include_info: false,
            include_head_position: false,
            ..CommandSet::default()
        };
        let link = PrinterLink::new(addr, set.commands(), fast_config());
        let snapshot = link.poll();

        // The poll completed; only the temperature derivation is missing.
        assert!(!snapshot.is_degraded(), "error: {:?}", snapshot.error());
        assert_eq!(snapshot.status(), Some("READY"));
        assert!(!snapshot.fields().contains_key("TempT0"));
        assert_eq!(snapshot.get("T0").unwrap().as_text(), Some("garbled"));
        assert_eq!(
            snapshot.get("ProgressPercent").unwrap().as_number(),
            Some(25.0)
        );
        server.join().unwrap();
    }

    #[test]
    fn debug_mode_records_raw_responses_per_command() {
        let (addr, server) = mock_printer(vec![
            Some("Control Success.\r\nok\r\n"),
            Some("Status: READY\r\nok\r\n"),
        ]);

        let set = CommandSet {
            include_info: false,
            include_head_position: false,
            include_temperature: false,
            include_progress: false,
        };
        let config = LinkConfig {
            debug: true,
            ..fast_config()
        };
        let link = PrinterLink::new(addr, set.commands(), config);
        let snapshot = link.poll();

        assert!(!snapshot.is_degraded());
        assert_eq!(
            snapshot.get("Debug(~M601 S1)").unwrap().as_text(),
            Some("Control Success.\r\nok\r\n")
        );
        assert_eq!(
            snapshot.get("Debug(~M119)").unwrap().as_text(),
            Some("Status: READY\r\nok\r\n")
        );
        server.join().unwrap();
    }

    #[test]
    fn exchange_reads_one_bounded_response() {
        use std::io::Cursor;

        // In-memory duplex: canned bytes on the read side, captured
        // command bytes on the write side.
        struct Duplex {
            input: Cursor<Vec<u8>>,
            output: Vec<u8>,
        }
        impl Read for Duplex {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.input.read(buf)
            }
        }
        impl Write for Duplex {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.output.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut stream = Duplex {
            input: Cursor::new(b"Status: READY\r\nok\r\n".to_vec()),
            output: Vec::new(),
        };
        let raw = exchange(&mut stream, Command::Status).unwrap();
        assert_eq!(raw, "Status: READY\r\nok\r\n");
        assert_eq!(stream.output, b"~M119\r\n");

        // A drained stream reads as closed.
        let err = exchange(&mut stream, Command::Status).unwrap_err();
        assert!(matches!(err, LinkError::ConnectionClosed));
    }
}
