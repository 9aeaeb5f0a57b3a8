//! Hex text helpers for command-line input and output.

use crate::exit::{CliError, CliResult, USAGE};

/// Decode hex text into bytes.
///
/// Accepts contiguous digits (`7e0005`) or tokens separated by whitespace,
/// commas or colons (`7E 00 05`, `7e:00:05`), each optionally prefixed `0x`.
pub fn decode(input: &str) -> CliResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|token| !token.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let decoded = ::hex::decode(digits)
            .map_err(|err| CliError::new(USAGE, format!("invalid hex {token:?}: {err}")))?;
        bytes.extend_from_slice(&decoded);
    }
    Ok(bytes)
}

/// Lowercase contiguous hex, e.g. `7e0005`.
pub fn encode(bytes: &[u8]) -> String {
    ::hex::encode(bytes)
}
