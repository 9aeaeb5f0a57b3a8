mod cmd;
mod exit;
mod hex;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "digimesh", version, about = "DigiMesh API frame tool")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_at_subcommand() {
        let cli = Cli::try_parse_from(["digimesh", "at", "CH", "--hex", "0B"])
            .expect("at args should parse");

        assert!(matches!(cli.command, Command::At(_)));
    }

    #[test]
    fn rejects_conflicting_value_args() {
        let err = Cli::try_parse_from(["digimesh", "at", "NI", "--hex", "41", "--text", "A"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_tx_with_global_format() {
        let cli = Cli::try_parse_from([
            "digimesh",
            "tx",
            "broadcast",
            "--text",
            "hello",
            "--format",
            "raw",
        ])
        .expect("tx args should parse");

        assert!(matches!(cli.command, Command::Tx(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
    }

    #[test]
    fn parse_defaults_frame_limits() {
        let cli = Cli::try_parse_from(["digimesh", "parse", "7E"]).expect("parse args should parse");
        match cli.command {
            Command::Parse(args) => {
                assert_eq!(args.max_frame_size, 128);
                assert_eq!(args.buffer_capacity, 512);
                assert_eq!(args.hex.as_deref(), Some("7E"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
