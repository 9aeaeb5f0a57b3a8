//! DigiMesh API frame codec and streaming parser.
//!
//! Every frame on the serial link has the shape:
//! - A `0x7E` start delimiter
//! - A 2-byte big-endian length covering the frame body
//! - The body: frame type, frame ID, type-specific fields
//! - A 1-byte checksum (`0xFF` minus the low byte of the body sum)
//!
//! Outbound frames are built by [`encode_at_command`] and
//! [`encode_transmit_request`]. Inbound bytes go through a [`StreamBuffer`],
//! which resynchronizes on line noise and hands back checksum-valid frames.

pub mod codec;
pub mod command;
pub mod error;
pub mod inspect;
pub mod parser;
pub mod reader;
pub mod registration;
pub mod validate;
pub mod writer;

pub use codec::{
    checksum, encode_at_command, encode_transmit_request, required_packet_count, split_payload,
    verify_frame, Address, Frame, FrameConfig, FrameType, BROADCAST_ADDRESS, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE, START_DELIMITER,
};
pub use command::{AtCommand, AtStatus};
pub use error::{FrameError, Result};
pub use parser::{extract_first_frame, parse_bytes, ParseSummary, StreamBuffer};
pub use reader::FrameReader;
pub use registration::Registration;
pub use validate::is_value_valid;
pub use writer::FrameWriter;
