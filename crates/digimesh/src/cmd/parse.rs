use std::fs;
use std::io::Read;

use bytes::BytesMut;
use digimesh_frame::{inspect, Frame, FrameConfig, ParseSummary, StreamBuffer};

use crate::cmd::ParseArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::hex;
use crate::output::{print_parse_report, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let config = FrameConfig {
        max_frame_size: args.max_frame_size,
        buffer_capacity: args.buffer_capacity,
    };

    let (frames, summary, buffered) = extract_all(&input, config)?;
    tracing::debug!(
        frames = summary.frames,
        discarded = summary.discarded,
        buffered,
        "parsed input"
    );

    print_parse_report(&frames, &summary, buffered, format);
    Ok(SUCCESS)
}

fn read_input(args: &ParseArgs) -> CliResult<Vec<u8>> {
    if let Some(input) = &args.hex {
        return hex::decode(input);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }

    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(input)
}

/// Feed `input` through a stream buffer chunk by chunk, as a serial driver
/// would, and collect every frame. Also returns the bytes still buffered as
/// an incomplete frame at the end.
fn extract_all(input: &[u8], config: FrameConfig) -> CliResult<(Vec<Frame>, ParseSummary, usize)> {
    let mut buffer = StreamBuffer::with_config(config);
    let mut out = BytesMut::new();
    let mut total = ParseSummary::default();
    let mut rest = input;

    while !rest.is_empty() {
        let take = rest.len().min(buffer.remaining_capacity());
        if take == 0 {
            return Err(CliError::new(INTERNAL, "stream buffer stalled"));
        }
        buffer
            .extend_from_slice(&rest[..take])
            .map_err(|err| frame_error("buffer append failed", err))?;
        rest = &rest[take..];

        let summary = buffer.extract_frames(&mut out);
        total.frames += summary.frames;
        total.consumed += summary.consumed;
        total.emitted += summary.emitted;
        total.discarded += summary.discarded;
    }

    let mut frames = Vec::with_capacity(total.frames);
    while !out.is_empty() {
        let size = inspect::frame_size(&out).map_err(|err| frame_error("bad parser output", err))?;
        let bytes = out.split_to(size.min(out.len())).freeze();
        frames.push(Frame::from_bytes(bytes).map_err(|err| frame_error("bad parser output", err))?);
    }

    Ok((frames, total, buffer.len()))
}
