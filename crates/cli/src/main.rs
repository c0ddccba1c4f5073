//! `fftel` — poll FlashForge networked 3D printers from the command line.

mod render;

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flashforge_telemetry_client::{CommandSet, LinkConfig, PrinterLink};

use crate::render::{Format, print_snapshot};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fftel",
    version,
    about = "Poll FlashForge networked 3D printers and print their telemetry"
)]
struct Cli {
    /// Output mode: "pretty" for a key/value listing, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run one poll cycle and print the snapshot.
    ///
    /// Exits with status 1 when the snapshot is degraded (the printer was
    /// unreachable or the cycle failed partway through).
    Poll {
        /// Printer address: IP or hostname, optionally with :PORT
        /// (port defaults to 8899).
        address: String,
        #[command(flatten)]
        opts: PollOpts,
    },

    /// Poll on a fixed interval, printing each snapshot.
    ///
    /// Cycles are strictly serialized: a new poll never starts before the
    /// previous one completes or times out.
    Watch {
        /// Printer address: IP or hostname, optionally with :PORT
        /// (port defaults to 8899).
        address: String,
        /// Seconds to wait between poll cycles.
        #[arg(long, default_value_t = 30)]
        interval: u64,
        #[command(flatten)]
        opts: PollOpts,
    },
}

/// Options shared by `poll` and `watch`.
#[derive(Args, Debug)]
struct PollOpts {
    /// Timeout in seconds for each blocking operation (connect, send,
    /// receive).
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Skip the ~M115 firmware/machine info query.
    #[arg(long)]
    no_info: bool,

    /// Skip the ~M114 head position query.
    #[arg(long)]
    no_head: bool,

    /// Skip the ~M105 temperature query.
    #[arg(long)]
    no_temp: bool,

    /// Skip the ~M27 print progress query.
    #[arg(long)]
    no_progress: bool,

    /// Record each command's raw response under a Debug(<command>) field.
    #[arg(long)]
    debug: bool,
}

impl PollOpts {
    fn command_set(&self) -> CommandSet {
        CommandSet {
            include_info: !self.no_info,
            include_head_position: !self.no_head,
            include_temperature: !self.no_temp,
            include_progress: !self.no_progress,
        }
    }

    fn link_config(&self) -> LinkConfig {
        LinkConfig::new(Duration::from_secs(self.timeout), self.debug)
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    // Log to stderr so JSON output stays clean on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Poll { address, opts } => cmd_poll(&address, &opts, format),
        Cmd::Watch {
            address,
            interval,
            opts,
        } => cmd_watch(&address, interval, &opts, format),
    }
}

fn build_link(address: &str, opts: &PollOpts) -> Result<PrinterLink> {
    PrinterLink::resolve(address, opts.command_set().commands(), opts.link_config())
        .with_context(|| format!("cannot resolve printer address {address:?}"))
}

fn cmd_poll(address: &str, opts: &PollOpts, format: Format) -> Result<ExitCode> {
    let link = build_link(address, opts)?;
    let snapshot = link.poll();
    print_snapshot(&snapshot, format)?;

    Ok(if snapshot.is_degraded() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_watch(address: &str, interval: u64, opts: &PollOpts, format: Format) -> Result<ExitCode> {
    let link = build_link(address, opts)?;
    let interval = Duration::from_secs(interval.max(1));

    loop {
        let snapshot = link.poll();
        print_snapshot(&snapshot, format)?;
        thread::sleep(interval);
    }
}
