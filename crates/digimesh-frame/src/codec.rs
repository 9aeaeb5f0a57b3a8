use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::command::{AtCommand, AtStatus, MNEMONIC_LEN};
use crate::error::{FrameError, Result};
use crate::inspect;
use crate::validate::is_value_valid;

/// Every API frame starts with this byte.
pub const START_DELIMITER: u8 = 0x7E;

/// Start delimiter (1) + big-endian length (2).
pub const HEADER_SIZE: usize = 3;

/// Bytes on the wire that are not counted by the length field.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + 1;

/// Largest frame, overhead included, that this codec builds or accepts.
pub const MAX_FRAME_SIZE: usize = 128;

/// Largest payload carried by a single transmit request.
pub const MAX_PAYLOAD_SIZE: usize = 65;

/// Bytes in a 64-bit module address.
pub const ADDRESS_LENGTH: usize = 8;

/// Frame ID stamped on every outbound request.
pub const DEFAULT_FRAME_ID: u8 = 0x01;

/// Smallest legal length field: frame type + frame ID.
pub const MIN_BODY_LEN: usize = 2;

/// A 64-bit module address, most significant byte first.
pub type Address = [u8; ADDRESS_LENGTH];

/// Address that reaches every module in the network.
pub const BROADCAST_ADDRESS: Address = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF];

const TRANSMIT_RESERVED: [u8; 2] = [0xFF, 0xFE];
const TRANSMIT_BROADCAST_RADIUS: u8 = 0x00;
const TRANSMIT_OPTIONS_DIGIMESH: u8 = 0xC0;

/// Frame type + ID + address + reserved + radius + options.
const TRANSMIT_REQUEST_HEADER_LEN: usize = 1 + 1 + ADDRESS_LENGTH + 2 + 1 + 1;

/// Frame type + ID + mnemonic.
const AT_COMMAND_HEADER_LEN: usize = 1 + 1 + MNEMONIC_LEN;

/// API frame kind, tagged by the byte at offset 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    LocalAtCommand,
    TransmitRequest,
    LocalAtCommandResponse,
    ExtendedTransmitStatus,
    ReceivePacket,
    Unknown(u8),
}

impl FrameType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x08 => FrameType::LocalAtCommand,
            0x10 => FrameType::TransmitRequest,
            0x88 => FrameType::LocalAtCommandResponse,
            0x8B => FrameType::ExtendedTransmitStatus,
            0x90 => FrameType::ReceivePacket,
            other => FrameType::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            FrameType::LocalAtCommand => 0x08,
            FrameType::TransmitRequest => 0x10,
            FrameType::LocalAtCommandResponse => 0x88,
            FrameType::ExtendedTransmitStatus => 0x8B,
            FrameType::ReceivePacket => 0x90,
            FrameType::Unknown(byte) => byte,
        }
    }

    /// Returns a human-readable name for the frame type.
    pub fn name(self) -> &'static str {
        match self {
            FrameType::LocalAtCommand => "LOCAL_AT_COMMAND",
            FrameType::TransmitRequest => "TRANSMIT_REQUEST",
            FrameType::LocalAtCommandResponse => "LOCAL_AT_COMMAND_RESPONSE",
            FrameType::ExtendedTransmitStatus => "EXTENDED_TRANSMIT_STATUS",
            FrameType::ReceivePacket => "RECEIVE_PACKET",
            FrameType::Unknown(_) => "UNKNOWN",
        }
    }
}

/// A complete, checksum-valid API frame.
///
/// Holds the full wire bytes, start delimiter through checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Wrap bytes that the parser has already validated.
    pub(crate) fn from_validated(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Validate and wrap a single frame.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        verify_frame(&bytes)?;
        Ok(Self { bytes })
    }

    /// Build a Local-AT-Command frame.
    pub fn at_command(command: AtCommand, value: &[u8]) -> Result<Self> {
        let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + AT_COMMAND_HEADER_LEN + value.len());
        encode_at_command(command, value, &mut buf)?;
        Ok(Self::from_validated(buf.freeze()))
    }

    /// Build a Transmit-Request frame.
    pub fn transmit_request(destination: &Address, payload: &[u8]) -> Result<Self> {
        let mut buf =
            BytesMut::with_capacity(FRAME_OVERHEAD + TRANSMIT_REQUEST_HEADER_LEN + payload.len());
        encode_transmit_request(destination, payload, &mut buf)?;
        Ok(Self::from_validated(buf.freeze()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// The total wire size of this frame (length field + 4).
    pub fn wire_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn frame_type(&self) -> FrameType {
        FrameType::from_byte(self.bytes[3])
    }

    pub fn frame_id(&self) -> u8 {
        self.bytes[4]
    }

    /// Bytes between the length field and the checksum.
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - 1]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    pub fn at_response_command(&self) -> Result<Option<AtCommand>> {
        inspect::command_from_at_response(&self.bytes)
    }

    pub fn at_response_status(&self) -> Result<AtStatus> {
        inspect::status_from_at_response(&self.bytes)
    }

    pub fn at_response_value(&self) -> Result<&[u8]> {
        inspect::response_value(&self.bytes)
    }

    pub fn receive_payload(&self) -> Result<&[u8]> {
        inspect::extract_payload_from_receive_frame(&self.bytes)
    }

    pub fn transmit_status(&self) -> Result<u8> {
        inspect::transmit_status(&self.bytes)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Checksum over the bytes between the length field and the checksum byte.
///
/// `0xFF` minus the 8-bit sum of `body`.
pub fn checksum(body: &[u8]) -> u8 {
    0xFF - body.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Encode a Local-AT-Command frame that sets (or, with an empty value,
/// queries) a parameter on the attached module.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────┬──────┬──────┬──────────┬─────────┬─────┐
/// │ 0x7E │ Length   │ 0x08 │ 0x01 │ Command  │ Value   │ CRC │
/// │      │ (2B BE)  │      │      │ (2B)     │ (0..N)  │     │
/// └──────┴──────────┴──────┴──────┴──────────┴─────────┴─────┘
/// ```
pub fn encode_at_command(command: AtCommand, value: &[u8], dst: &mut BytesMut) -> Result<()> {
    if !is_value_valid(command, value) {
        return Err(FrameError::InvalidValue {
            command,
            len: value.len(),
        });
    }

    let start = begin_frame(AT_COMMAND_HEADER_LEN + value.len(), dst)?;
    dst.put_u8(FrameType::LocalAtCommand.as_byte());
    dst.put_u8(DEFAULT_FRAME_ID);
    dst.put_slice(&command.mnemonic());
    dst.put_slice(value);
    finish_frame(start, dst);
    Ok(())
}

/// Encode a Transmit-Request frame carrying `payload` to `destination`.
///
/// Wire format:
/// ```text
/// ┌──────┬─────────┬──────┬──────┬─────────┬───────┬────────┬─────────┬─────────┬─────┐
/// │ 0x7E │ Length  │ 0x10 │ 0x01 │ Address │ FF FE │ Radius │ Options │ Payload │ CRC │
/// │      │ (2B BE) │      │      │ (8B)    │       │ 0x00   │ 0xC0    │ (0..65) │     │
/// └──────┴─────────┴──────┴──────┴─────────┴───────┴────────┴─────────┴─────────┴─────┘
/// ```
pub fn encode_transmit_request(
    destination: &Address,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let start = begin_frame(TRANSMIT_REQUEST_HEADER_LEN + payload.len(), dst)?;
    dst.put_u8(FrameType::TransmitRequest.as_byte());
    dst.put_u8(DEFAULT_FRAME_ID);
    dst.put_slice(destination);
    dst.put_slice(&TRANSMIT_RESERVED);
    dst.put_u8(TRANSMIT_BROADCAST_RADIUS);
    dst.put_u8(TRANSMIT_OPTIONS_DIGIMESH);
    dst.put_slice(payload);
    finish_frame(start, dst);
    Ok(())
}

/// Number of transmit requests needed to carry `total_payload_len` bytes.
pub fn required_packet_count(total_payload_len: usize) -> usize {
    total_payload_len.div_ceil(MAX_PAYLOAD_SIZE)
}

/// Split a payload into transmit-request sized chunks.
pub fn split_payload(payload: &[u8]) -> std::slice::Chunks<'_, u8> {
    payload.chunks(MAX_PAYLOAD_SIZE)
}

/// Check that `bytes` hold exactly one well-formed frame with a valid checksum.
pub fn verify_frame(bytes: &[u8]) -> Result<()> {
    let size = inspect::frame_size(bytes)?;
    if bytes[0] != START_DELIMITER {
        return Err(FrameError::Malformed("missing start delimiter"));
    }
    if size - FRAME_OVERHEAD < MIN_BODY_LEN {
        return Err(FrameError::Malformed("length field shorter than frame header"));
    }
    if size > MAX_FRAME_SIZE {
        return Err(FrameError::Malformed("declared length exceeds maximum frame size"));
    }
    if bytes.len() != size {
        return Err(FrameError::Truncated {
            needed: size,
            available: bytes.len(),
        });
    }
    if checksum(&bytes[HEADER_SIZE..size - 1]) != bytes[size - 1] {
        return Err(FrameError::Malformed("checksum mismatch"));
    }
    Ok(())
}

/// Configuration for frame parsing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest accepted frame, overhead included. Default: 128 bytes.
    pub max_frame_size: usize,
    /// Capacity of the inbound stream buffer. Default: 512 bytes.
    pub buffer_capacity: usize,
}

impl FrameConfig {
    /// Clamp the frame size to the protocol maximum and make sure the buffer
    /// can hold at least one maximum-size frame.
    pub fn normalized(mut self) -> Self {
        self.max_frame_size = self.max_frame_size.clamp(FRAME_OVERHEAD + MIN_BODY_LEN, MAX_FRAME_SIZE);
        self.buffer_capacity = self.buffer_capacity.max(self.max_frame_size);
        self
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            buffer_capacity: 512,
        }
    }
}

fn begin_frame(body_len: usize, dst: &mut BytesMut) -> Result<usize> {
    let size = body_len + FRAME_OVERHEAD;
    if size > MAX_FRAME_SIZE {
        return Err(FrameError::CapacityExceeded {
            needed: size,
            available: MAX_FRAME_SIZE,
        });
    }

    let start = dst.len();
    dst.reserve(size);
    dst.put_u8(START_DELIMITER);
    dst.put_u16(body_len as u16);
    Ok(start)
}

fn finish_frame(start: usize, dst: &mut BytesMut) {
    let crc = checksum(&dst[start + HEADER_SIZE..]);
    dst.put_u8(crc);
    trace!(size = dst.len() - start, crc, "encoded frame");
}
