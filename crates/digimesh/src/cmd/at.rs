use digimesh_frame::{AtCommand, Frame};

use crate::cmd::{resolve_bytes, AtArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: AtArgs, format: OutputFormat) -> CliResult<i32> {
    let command: AtCommand = args
        .command
        .parse()
        .map_err(|err| frame_error("invalid command", err))?;
    let value = resolve_bytes(args.hex.as_deref(), args.text.as_deref())?;

    let frame = Frame::at_command(command, &value)
        .map_err(|err| frame_error(&format!("cannot encode {command}"), err))?;
    tracing::debug!(%command, size = frame.wire_size(), "encoded AT command");

    print_frames(&[frame], format);
    Ok(SUCCESS)
}
