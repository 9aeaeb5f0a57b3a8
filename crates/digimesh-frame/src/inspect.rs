//! Field accessors for a single, already-extracted frame.
//!
//! Offsets are fixed by the API frame layout. None of these verify the
//! checksum; frames are expected to come out of the stream parser. Every read
//! is bounds-checked, so short or foreign frames yield an error, never a panic.

use crate::codec::{FrameType, FRAME_OVERHEAD};
use crate::command::{AtCommand, AtStatus, MNEMONIC_LEN};
use crate::error::{FrameError, Result};

const FRAME_TYPE_OFFSET: usize = 3;
const FRAME_ID_OFFSET: usize = 4;
const AT_RESPONSE_COMMAND_OFFSET: usize = 5;
const AT_RESPONSE_STATUS_OFFSET: usize = 7;
const AT_RESPONSE_VALUE_OFFSET: usize = 8;
/// Frame type + ID + command + status.
const AT_RESPONSE_HEADER_LEN: usize = 5;
const RECEIVE_PAYLOAD_OFFSET: usize = 15;
/// Everything in a receive packet that is not payload.
const RECEIVE_OVERHEAD: usize = 16;
const TRANSMIT_STATUS_OFFSET: usize = 8;

/// Total frame size on the wire: declared length + 4.
pub fn frame_size(frame: &[u8]) -> Result<usize> {
    Ok(declared_length(frame)? + FRAME_OVERHEAD)
}

/// The frame-kind tag at offset 3.
pub fn frame_type(frame: &[u8]) -> Result<FrameType> {
    byte_at(frame, FRAME_TYPE_OFFSET).map(FrameType::from_byte)
}

/// The request/response correlation byte at offset 4.
pub fn frame_id(frame: &[u8]) -> Result<u8> {
    byte_at(frame, FRAME_ID_OFFSET)
}

/// Number of value bytes carried by a local AT command response.
pub fn at_command_response_size(frame: &[u8]) -> Result<usize> {
    declared_length(frame)?
        .checked_sub(AT_RESPONSE_HEADER_LEN)
        .ok_or(FrameError::Malformed("AT response shorter than its header"))
}

/// The echoed command of a local AT command response.
///
/// Returns `Ok(None)` if the mnemonic is not in the catalog.
pub fn command_from_at_response(frame: &[u8]) -> Result<Option<AtCommand>> {
    let end = AT_RESPONSE_COMMAND_OFFSET + MNEMONIC_LEN;
    ensure_len(frame, end)?;
    let mut mnemonic = [0u8; MNEMONIC_LEN];
    mnemonic.copy_from_slice(&frame[AT_RESPONSE_COMMAND_OFFSET..end]);
    Ok(AtCommand::from_mnemonic(mnemonic))
}

/// The status byte of a local AT command response.
pub fn status_from_at_response(frame: &[u8]) -> Result<AtStatus> {
    byte_at(frame, AT_RESPONSE_STATUS_OFFSET).map(AtStatus::from_byte)
}

/// The value bytes of a local AT command response.
pub fn response_value(frame: &[u8]) -> Result<&[u8]> {
    let size = at_command_response_size(frame)?;
    let end = AT_RESPONSE_VALUE_OFFSET + size;
    ensure_len(frame, end)?;
    Ok(&frame[AT_RESPONSE_VALUE_OFFSET..end])
}

/// The payload of a receive packet.
pub fn extract_payload_from_receive_frame(frame: &[u8]) -> Result<&[u8]> {
    let len = frame_size(frame)?
        .checked_sub(RECEIVE_OVERHEAD)
        .ok_or(FrameError::Malformed("receive packet shorter than its header"))?;
    let end = RECEIVE_PAYLOAD_OFFSET + len;
    ensure_len(frame, end)?;
    Ok(&frame[RECEIVE_PAYLOAD_OFFSET..end])
}

/// The delivery status byte of an extended transmit status frame.
pub fn transmit_status(frame: &[u8]) -> Result<u8> {
    byte_at(frame, TRANSMIT_STATUS_OFFSET)
}

fn declared_length(frame: &[u8]) -> Result<usize> {
    ensure_len(frame, 3)?;
    Ok(u16::from_be_bytes([frame[1], frame[2]]) as usize)
}

fn byte_at(frame: &[u8], offset: usize) -> Result<u8> {
    frame.get(offset).copied().ok_or(FrameError::Truncated {
        needed: offset + 1,
        available: frame.len(),
    })
}

fn ensure_len(frame: &[u8], needed: usize) -> Result<()> {
    if frame.len() < needed {
        return Err(FrameError::Truncated {
            needed,
            available: frame.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT_RESPONSE_NI: [u8; 9] = [0x7E, 0x00, 0x05, 0x88, 0x01, 0x4E, 0x49, 0x00, 0xDF];

    const RECEIVE_ABCDEF: [u8; 22] = [
        0x7E, 0x00, 0x12, 0x90, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0x01,
        0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x24,
    ];

    #[test]
    fn size_type_and_id() {
        assert_eq!(frame_size(&AT_RESPONSE_NI).unwrap(), 9);
        assert_eq!(
            frame_type(&AT_RESPONSE_NI).unwrap(),
            FrameType::LocalAtCommandResponse
        );
        assert_eq!(frame_id(&AT_RESPONSE_NI).unwrap(), 0x01);
    }

    #[test]
    fn at_response_fields() {
        assert_eq!(at_command_response_size(&AT_RESPONSE_NI).unwrap(), 0);
        assert_eq!(
            command_from_at_response(&AT_RESPONSE_NI).unwrap(),
            Some(AtCommand::Ni)
        );
        assert_eq!(status_from_at_response(&AT_RESPONSE_NI).unwrap(), AtStatus::Ok);
        assert!(response_value(&AT_RESPONSE_NI).unwrap().is_empty());
    }

    #[test]
    fn at_response_with_value() {
        // SH query answered with a four byte serial half.
        let frame = [
            0x7E, 0x00, 0x09, 0x88, 0x01, 0x53, 0x48, 0x00, 0x00, 0x13, 0xA2, 0x00, 0x26,
        ];
        assert_eq!(at_command_response_size(&frame).unwrap(), 4);
        assert_eq!(command_from_at_response(&frame).unwrap(), Some(AtCommand::Sh));
        assert_eq!(response_value(&frame).unwrap(), [0x00, 0x13, 0xA2, 0x00]);
    }

    #[test]
    fn unrecognized_command_and_status() {
        let frame = [0x7E, 0x00, 0x05, 0x88, 0x01, 0x5A, 0x5A, 0x09, 0xB9];
        assert_eq!(command_from_at_response(&frame).unwrap(), None);
        assert_eq!(
            status_from_at_response(&frame).unwrap(),
            AtStatus::Unrecognized(0x09)
        );
    }

    #[test]
    fn receive_payload() {
        assert_eq!(
            extract_payload_from_receive_frame(&RECEIVE_ABCDEF).unwrap(),
            [0x61, 0x62, 0x63, 0x64, 0x65, 0x66]
        );
    }

    #[test]
    fn receive_payload_rejects_short_frame() {
        assert!(matches!(
            extract_payload_from_receive_frame(&AT_RESPONSE_NI),
            Err(FrameError::Malformed(_))
        ));
        assert!(matches!(
            extract_payload_from_receive_frame(&RECEIVE_ABCDEF[..18]),
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn transmit_status_offset() {
        let frame = [0x7E, 0x00, 0x07, 0x8B, 0x01, 0xFF, 0xFE, 0x00, 0x21, 0x00, 0x55];
        assert_eq!(
            frame_type(&frame).unwrap(),
            FrameType::ExtendedTransmitStatus
        );
        assert_eq!(transmit_status(&frame).unwrap(), 0x21);
    }

    #[test]
    fn unknown_frame_type_does_not_panic() {
        let frame = [0x7E, 0x00, 0x02, 0x42, 0x07, 0xB6];
        assert_eq!(frame_type(&frame).unwrap(), FrameType::Unknown(0x42));
        assert!(matches!(
            status_from_at_response(&frame),
            Err(FrameError::Truncated { .. })
        ));
        assert!(matches!(
            at_command_response_size(&frame),
            Err(FrameError::Malformed(_))
        ));
        assert!(transmit_status(&frame).is_err());
    }

    #[test]
    fn empty_input_is_truncated() {
        assert!(matches!(
            frame_size(&[]),
            Err(FrameError::Truncated {
                needed: 3,
                available: 0
            })
        ));
        assert!(frame_type(&[0x7E, 0x00, 0x02]).is_err());
    }
}
