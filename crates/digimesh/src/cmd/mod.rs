use clap::{Args, Subcommand};
use std::path::PathBuf;

use digimesh_frame::codec::MAX_FRAME_SIZE;

use crate::exit::CliResult;
use crate::hex;
use crate::output::OutputFormat;

pub mod at;
pub mod parse;
pub mod tx;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a Local-AT-Command frame.
    At(AtArgs),
    /// Encode transmit request frames for a payload.
    Tx(TxArgs),
    /// Extract and inspect frames from a noisy byte stream.
    Parse(ParseArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::At(args) => at::run(args, format),
        Command::Tx(args) => tx::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct AtArgs {
    /// Two-letter AT command (e.g. CH, NI, SH).
    pub command: String,
    /// Parameter value as hex (little-endian for numeric parameters).
    #[arg(long, conflicts_with = "text")]
    pub hex: Option<String>,
    /// Parameter value as text.
    #[arg(long, conflicts_with = "hex")]
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct TxArgs {
    /// 64-bit destination address as hex, or "broadcast".
    pub destination: String,
    /// Payload as hex.
    #[arg(long, conflicts_with_all = ["text", "file"])]
    pub hex: Option<String>,
    /// Payload as text.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub text: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["hex", "text"])]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Input bytes as hex. Reads raw bytes from stdin when neither this nor
    /// --file is given.
    #[arg(conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw input bytes from file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Largest accepted frame in bytes.
    #[arg(long, default_value_t = MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
    /// Stream buffer capacity in bytes.
    #[arg(long, default_value_t = 512)]
    pub buffer_capacity: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Bytes given either as `--hex` or `--text`; empty when neither is set.
fn resolve_bytes(hex_arg: Option<&str>, text_arg: Option<&str>) -> CliResult<Vec<u8>> {
    if let Some(input) = hex_arg {
        return hex::decode(input);
    }
    if let Some(text) = text_arg {
        return Ok(text.as_bytes().to_vec());
    }
    Ok(Vec::new())
}
