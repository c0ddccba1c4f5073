//! FlashForge telemetry client — poll networked FlashForge 3D printers.
//!
//! FlashForge controllers expose a proprietary line-oriented text protocol
//! on TCP port 8899. This crate opens a connection per poll cycle, issues a
//! fixed command sequence (`~M601 S1`, `~M119`, and optional info, head
//! position, temperature and progress queries), and normalizes the raw,
//! inconsistent responses into an immutable [`Snapshot`].
//!
//! The API is synchronous (`std::net`), with no async runtime required.
//!
//! ```no_run
//! use flashforge_telemetry_client::{CommandSet, LinkConfig, PrinterLink};
//!
//! let link = PrinterLink::resolve(
//!     "192.168.1.50",
//!     CommandSet::default().commands(),
//!     LinkConfig::default(),
//! )
//! .unwrap();
//!
//! let snapshot = link.poll();
//! match snapshot.status() {
//!     Some(status) => println!("printer is {status}"),
//!     None => println!("unavailable: {:?}", snapshot.error()),
//! }
//! ```
mod addr;
mod command;
mod config;
mod error;
mod fields;
mod interpret;
mod link;
mod parse;
mod snapshot;

pub use addr::{DEFAULT_PORT, resolve_addr};
pub use command::{Command, CommandSet};
pub use config::LinkConfig;
pub use error::LinkError;
pub use fields::{FieldMap, FieldValue};
pub use interpret::interpret;
pub use link::PrinterLink;
pub use parse::{
    DualTemperature, scan_print_progress, split_dual_temperature, split_fields,
    split_progress_counts,
};
pub use snapshot::Snapshot;
