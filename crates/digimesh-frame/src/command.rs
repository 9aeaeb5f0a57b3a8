//! AT command catalog and response status codes.
//!
//! Every supported command has a fixed two-character ASCII mnemonic and a
//! maximum value width. A command sent with an empty value is a query.

use std::fmt;
use std::str::FromStr;

use crate::error::FrameError;

/// Width of an AT command mnemonic on the wire.
pub const MNEMONIC_LEN: usize = 2;

/// A configurable radio parameter addressed by a local AT command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtCommand {
    /// Network identifier.
    Id,
    /// Operating channel.
    Ch,
    /// Node identifier string.
    Ni,
    /// Sleep mode.
    Sm,
    /// Number of sleep periods.
    Sn,
    /// Sleep options.
    So,
    /// Wake time.
    St,
    /// Sleep period.
    Sp,
    /// Host delay.
    Wh,
    /// Serial number, high word.
    Sh,
    /// Serial number, low word.
    Sl,
    /// Write parameters to non-volatile memory.
    Wr,
}

impl AtCommand {
    /// All supported commands in catalog order.
    pub const ALL: [AtCommand; 12] = [
        AtCommand::Id,
        AtCommand::Ch,
        AtCommand::Ni,
        AtCommand::Sm,
        AtCommand::Sn,
        AtCommand::So,
        AtCommand::St,
        AtCommand::Sp,
        AtCommand::Wh,
        AtCommand::Sh,
        AtCommand::Sl,
        AtCommand::Wr,
    ];

    /// The two ASCII bytes sent on the wire.
    pub const fn mnemonic(self) -> [u8; MNEMONIC_LEN] {
        match self {
            AtCommand::Id => *b"ID",
            AtCommand::Ch => *b"CH",
            AtCommand::Ni => *b"NI",
            AtCommand::Sm => *b"SM",
            AtCommand::Sn => *b"SN",
            AtCommand::So => *b"SO",
            AtCommand::St => *b"ST",
            AtCommand::Sp => *b"SP",
            AtCommand::Wh => *b"WH",
            AtCommand::Sh => *b"SH",
            AtCommand::Sl => *b"SL",
            AtCommand::Wr => *b"WR",
        }
    }

    /// Maximum number of value bytes accepted when setting this parameter.
    ///
    /// Zero means the command can only be sent as a query.
    pub const fn max_value_len(self) -> usize {
        match self {
            AtCommand::Id => 2,
            AtCommand::Ch => 1,
            AtCommand::Ni => 20,
            AtCommand::Sm => 1,
            AtCommand::Sn => 2,
            AtCommand::So => 2,
            AtCommand::St => 3,
            AtCommand::Sp => 2,
            AtCommand::Wh => 2,
            AtCommand::Sh | AtCommand::Sl | AtCommand::Wr => 0,
        }
    }

    /// Look up a command by its wire mnemonic.
    pub fn from_mnemonic(mnemonic: [u8; MNEMONIC_LEN]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.mnemonic() == mnemonic)
    }

    /// The mnemonic as a string slice.
    pub fn as_str(self) -> &'static str {
        match self {
            AtCommand::Id => "ID",
            AtCommand::Ch => "CH",
            AtCommand::Ni => "NI",
            AtCommand::Sm => "SM",
            AtCommand::Sn => "SN",
            AtCommand::So => "SO",
            AtCommand::St => "ST",
            AtCommand::Sp => "SP",
            AtCommand::Wh => "WH",
            AtCommand::Sh => "SH",
            AtCommand::Sl => "SL",
            AtCommand::Wr => "WR",
        }
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtCommand {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let mnemonic: [u8; MNEMONIC_LEN] = upper
            .as_bytes()
            .try_into()
            .map_err(|_| FrameError::UnknownCommand(s.to_string()))?;
        Self::from_mnemonic(mnemonic).ok_or_else(|| FrameError::UnknownCommand(s.to_string()))
    }
}

/// Status byte carried by a local AT command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtStatus {
    Ok,
    Error,
    InvalidCommand,
    InvalidParameter,
    /// Any status byte outside the documented set.
    Unrecognized(u8),
}

impl AtStatus {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => AtStatus::Ok,
            0x01 => AtStatus::Error,
            0x02 => AtStatus::InvalidCommand,
            0x03 => AtStatus::InvalidParameter,
            other => AtStatus::Unrecognized(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            AtStatus::Ok => 0x00,
            AtStatus::Error => 0x01,
            AtStatus::InvalidCommand => 0x02,
            AtStatus::InvalidParameter => 0x03,
            AtStatus::Unrecognized(byte) => byte,
        }
    }

    /// Human-readable status name.
    pub fn name(self) -> &'static str {
        match self {
            AtStatus::Ok => "OKAY",
            AtStatus::Error => "ERROR",
            AtStatus::InvalidCommand => "INVALID_COMMAND",
            AtStatus::InvalidParameter => "INVALID_PARAMETER",
            AtStatus::Unrecognized(_) => "UNRECOGNIZED",
        }
    }

    pub fn is_ok(self) -> bool {
        self == AtStatus::Ok
    }
}

impl fmt::Display for AtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_lookup_covers_catalog() {
        for command in AtCommand::ALL {
            assert_eq!(AtCommand::from_mnemonic(command.mnemonic()), Some(command));
        }
        assert_eq!(AtCommand::from_mnemonic(*b"ZZ"), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("ni".parse::<AtCommand>().unwrap(), AtCommand::Ni);
        assert_eq!(" CH ".parse::<AtCommand>().unwrap(), AtCommand::Ch);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(matches!(
            "XX".parse::<AtCommand>(),
            Err(FrameError::UnknownCommand(_))
        ));
        assert!(matches!(
            "IDX".parse::<AtCommand>(),
            Err(FrameError::UnknownCommand(_))
        ));
    }

    #[test]
    fn query_only_commands() {
        assert_eq!(AtCommand::Sh.max_value_len(), 0);
        assert_eq!(AtCommand::Sl.max_value_len(), 0);
        assert_eq!(AtCommand::Wr.max_value_len(), 0);
        assert_eq!(AtCommand::Ni.max_value_len(), 20);
    }

    #[test]
    fn status_byte_mapping() {
        assert_eq!(AtStatus::from_byte(0), AtStatus::Ok);
        assert_eq!(AtStatus::from_byte(3), AtStatus::InvalidParameter);
        assert_eq!(AtStatus::from_byte(0x42), AtStatus::Unrecognized(0x42));
        assert_eq!(AtStatus::from_byte(0x42).as_byte(), 0x42);
        assert_eq!(AtStatus::InvalidCommand.to_string(), "INVALID_COMMAND");
    }
}
