use std::fs;

use digimesh_frame::codec::ADDRESS_LENGTH;
use digimesh_frame::{split_payload, Address, Frame, FrameWriter, BROADCAST_ADDRESS};

use crate::cmd::{resolve_bytes, TxArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::hex;
use crate::output::{print_frames, OutputFormat};

pub fn run(args: TxArgs, format: OutputFormat) -> CliResult<i32> {
    let destination = parse_address(&args.destination)?;
    let payload = match &args.file {
        Some(path) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => resolve_bytes(args.hex.as_deref(), args.text.as_deref())?,
    };

    if let OutputFormat::Raw = format {
        let mut writer = FrameWriter::new(std::io::stdout().lock());
        writer
            .send_payload(&destination, &payload)
            .map_err(|err| frame_error("write failed", err))?;
        return Ok(SUCCESS);
    }

    let frames = encode_frames(&destination, &payload)?;
    tracing::debug!(bytes = payload.len(), frames = frames.len(), "encoded payload");
    print_frames(&frames, format);
    Ok(SUCCESS)
}

fn encode_frames(destination: &Address, payload: &[u8]) -> CliResult<Vec<Frame>> {
    if payload.is_empty() {
        let frame = Frame::transmit_request(destination, payload)
            .map_err(|err| frame_error("cannot encode", err))?;
        return Ok(vec![frame]);
    }

    split_payload(payload)
        .map(|chunk| {
            Frame::transmit_request(destination, chunk)
                .map_err(|err| frame_error("cannot encode", err))
        })
        .collect()
}

fn parse_address(input: &str) -> CliResult<Address> {
    if input.eq_ignore_ascii_case("broadcast") {
        return Ok(BROADCAST_ADDRESS);
    }

    let bytes = hex::decode(input)?;
    Address::try_from(bytes.as_slice()).map_err(|_| {
        CliError::new(
            USAGE,
            format!(
                "destination must be {ADDRESS_LENGTH} bytes of hex, got {}",
                bytes.len()
            ),
        )
    })
}
