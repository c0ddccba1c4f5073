//! The fixed catalog of protocol commands a poll cycle can issue.
//!
//! FlashForge controllers speak a G-code-flavoured request/response protocol
//! over TCP: each request is a literal ASCII line (`~M…`) terminated by CRLF,
//! and each request produces exactly one text response. The command set is
//! static and undocumented by the vendor; the wire strings below are the ones
//! the stock firmware answers.

/// One wire-protocol request recognized by the printer controller.
///
/// The same raw response shape (`key:value` lines) carries different
/// semantics depending on which command produced it, so the interpreter
/// dispatches on this enum rather than on field names alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `~M601 S1` — acquire control of the printer. Must be issued first;
    /// later commands may be ignored until control is acknowledged.
    AcquireControl,
    /// `~M119` — machine status (the canonical `Status` field).
    Status,
    /// `~M115` — firmware/machine info, including the build volume.
    Info,
    /// `~M114` — current head position.
    HeadPosition,
    /// `~M105` — extruder and bed temperatures.
    Temperature,
    /// `~M27` — SD print progress.
    Progress,
}

impl Command {
    /// The exact bytes sent on the wire for this command, CRLF included.
    pub fn wire_bytes(self) -> &'static [u8] {
        match self {
            Command::AcquireControl => b"~M601 S1\r\n",
            Command::Status => b"~M119\r\n",
            Command::Info => b"~M115\r\n",
            Command::HeadPosition => b"~M114\r\n",
            Command::Temperature => b"~M105\r\n",
            Command::Progress => b"~M27\r\n",
        }
    }

    /// The command without its CRLF terminator, for log events, error
    /// messages and debug field keys.
    pub fn name(self) -> &'static str {
        match self {
            Command::AcquireControl => "~M601 S1",
            Command::Status => "~M119",
            Command::Info => "~M115",
            Command::HeadPosition => "~M114",
            Command::Temperature => "~M105",
            Command::Progress => "~M27",
        }
    }
}

/// Selects which optional command groups a poll cycle issues.
///
/// `AcquireControl` and `Status` are always included and always issued
/// first and second; the optional groups follow in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSet {
    /// Issue `~M115` (firmware/machine info).
    pub include_info: bool,
    /// Issue `~M114` (head position).
    pub include_head_position: bool,
    /// Issue `~M105` (temperatures).
    pub include_temperature: bool,
    /// Issue `~M27` (print progress).
    pub include_progress: bool,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            include_info: true,
            include_head_position: true,
            include_temperature: true,
            include_progress: true,
        }
    }
}

impl CommandSet {
    /// The ordered command sequence for one poll cycle.
    ///
    /// Order matters: control must be acquired before the printer answers
    /// the rest, and `Status` follows immediately so its fields are present
    /// even on a poll that fails partway through the optional groups.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = vec![Command::AcquireControl, Command::Status];
        if self.include_info {
            commands.push(Command::Info);
        }
        if self.include_head_position {
            commands.push(Command::HeadPosition);
        }
        if self.include_temperature {
            commands.push(Command::Temperature);
        }
        if self.include_progress {
            commands.push(Command::Progress);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes_are_crlf_terminated() {
        for cmd in [
            Command::AcquireControl,
            Command::Status,
            Command::Info,
            Command::HeadPosition,
            Command::Temperature,
            Command::Progress,
        ] {
            assert!(cmd.wire_bytes().ends_with(b"\r\n"), "{:?}", cmd);
            assert!(cmd.wire_bytes().starts_with(b"~M"), "{:?}", cmd);
        }
    }

    #[test]
    fn name_matches_wire_bytes() {
        for cmd in [
            Command::AcquireControl,
            Command::Status,
            Command::Info,
            Command::HeadPosition,
            Command::Temperature,
            Command::Progress,
        ] {
            let wire = std::str::from_utf8(cmd.wire_bytes()).unwrap();
            assert_eq!(wire.trim_end_matches("\r\n"), cmd.name());
        }
    }

    #[test]
    fn default_set_issues_all_six_commands() {
        let commands = CommandSet::default().commands();
        assert_eq!(
            commands,
            vec![
                Command::AcquireControl,
                Command::Status,
                Command::Info,
                Command::HeadPosition,
                Command::Temperature,
                Command::Progress,
            ]
        );
    }

    #[test]
    fn control_and_status_always_first() {
        let set = CommandSet {
            include_info: false,
            include_head_position: false,
            include_temperature: false,
            include_progress: false,
        };
        assert_eq!(
            set.commands(),
            vec![Command::AcquireControl, Command::Status]
        );
    }

    #[test]
    fn optional_groups_are_independent() {
        let set = CommandSet {
            include_info: false,
            include_head_position: true,
            include_temperature: false,
            include_progress: true,
        };
        assert_eq!(
            set.commands(),
            vec![
                Command::AcquireControl,
                Command::Status,
                Command::HeadPosition,
                Command::Progress,
            ]
        );
    }
}
