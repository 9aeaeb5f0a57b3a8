//! Per-command value acceptance rules.
//!
//! The numeric bounds mirror the radio firmware limits. Multi-byte values are
//! interpreted little-endian.

use tracing::debug;

use crate::codec::MAX_FRAME_SIZE;
use crate::command::AtCommand;

/// Returns true if `value` may be sent with `command`.
///
/// An empty value is always accepted: it turns the frame into a query.
pub fn is_value_valid(command: AtCommand, value: &[u8]) -> bool {
    let valid = check(command, value);
    if !valid {
        debug!(%command, len = value.len(), "rejected AT command value");
    }
    valid
}

fn check(command: AtCommand, value: &[u8]) -> bool {
    if value.len() > MAX_FRAME_SIZE {
        return false;
    }
    if value.is_empty() {
        return true;
    }
    if value.len() > command.max_value_len() {
        return false;
    }

    match command {
        AtCommand::Id => true,
        AtCommand::Ch => (0x0B..=0x1A).contains(&value[0]),
        AtCommand::Ni => value.is_ascii(),
        AtCommand::Sm => little_endian_value(value) <= 8,
        AtCommand::Sn => (1..=0xFFFF).contains(&little_endian_value(value)),
        AtCommand::So | AtCommand::Sp | AtCommand::Wh => little_endian_value(value) <= 0x13E,
        AtCommand::St => (1..=0x36_EE80).contains(&little_endian_value(value)),
        // Query-only; a non-empty value already failed the width check.
        AtCommand::Sh | AtCommand::Sl | AtCommand::Wr => false,
    }
}

/// Assemble up to eight little-endian bytes into an unsigned integer.
pub(crate) fn little_endian_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (idx, &byte)| acc | (u64::from(byte) << (idx * 8)))
}
