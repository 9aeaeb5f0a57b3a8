//! Streaming frame parser.
//!
//! Scans a byte buffer for checksum-valid frames embedded in arbitrary noise.
//! The buffer is described by a `(head, tail)` cursor: `head` counts the valid
//! bytes, `tail` the bytes already consumed. Every pass ends by compacting the
//! buffer so unconsumed bytes start at offset 0 and `tail` is 0 again; callers
//! append new bytes at `head`.
//!
//! A start delimiter always restarts frame assembly, even mid-frame. The
//! abandoned bytes are consumed as garbage and are not rescanned, so a real
//! frame whose first delimiter was swallowed by a corrupted predecessor is lost.
//! The same rule drops any frame whose checksum byte happens to be `0x7E`.

use std::ops::ControlFlow;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::codec::{
    checksum, Frame, FrameConfig, FRAME_OVERHEAD, HEADER_SIZE, MAX_FRAME_SIZE, MIN_BODY_LEN,
    START_DELIMITER,
};
use crate::error::{FrameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingStart,
    LengthHigh,
    LengthLow,
    Body { declared: usize },
}

/// Outcome of one parser pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    /// Complete frames emitted.
    pub frames: usize,
    /// Input bytes consumed (frames plus garbage).
    pub consumed: usize,
    /// Bytes appended to the output buffer.
    pub emitted: usize,
    /// Partial or corrupt frames thrown away.
    pub discarded: usize,
}

/// Extract every complete frame from `input[tail..head]` into `out`.
///
/// Frames are appended to `out` back to back. The buffer is compacted
/// afterwards; see the module docs.
pub fn parse_bytes(
    input: &mut [u8],
    head: &mut usize,
    tail: &mut usize,
    out: &mut BytesMut,
) -> ParseSummary {
    parse_bytes_with_limit(input, head, tail, out, MAX_FRAME_SIZE)
}

/// Extract the first complete frame from `input[tail..head]`.
///
/// Garbage ahead of the frame is consumed either way. Returns
/// `FrameError::NoFrameFound` if the input ran out first.
pub fn extract_first_frame(input: &mut [u8], head: &mut usize, tail: &mut usize) -> Result<Frame> {
    extract_first_frame_with_limit(input, head, tail, MAX_FRAME_SIZE)
}

fn parse_bytes_with_limit(
    input: &mut [u8],
    head: &mut usize,
    tail: &mut usize,
    out: &mut BytesMut,
    max_frame_size: usize,
) -> ParseSummary {
    let (start, end) = cursor_bounds(input, *head, *tail);
    let before = out.len();

    let mut summary = scan(&input[start..end], max_frame_size, |frame| {
        out.put_slice(frame);
        ControlFlow::Continue(())
    });
    summary.emitted = out.len() - before;

    *head = end;
    *tail = start + summary.consumed;
    compact(input, head, tail);

    if summary.frames > 0 || summary.discarded > 0 {
        debug!(
            frames = summary.frames,
            discarded = summary.discarded,
            consumed = summary.consumed,
            "parsed input buffer"
        );
    }
    summary
}

fn extract_first_frame_with_limit(
    input: &mut [u8],
    head: &mut usize,
    tail: &mut usize,
    max_frame_size: usize,
) -> Result<Frame> {
    let (start, end) = cursor_bounds(input, *head, *tail);
    let mut found = None;

    let summary = scan(&input[start..end], max_frame_size, |frame| {
        found = Some(Bytes::copy_from_slice(frame));
        ControlFlow::Break(())
    });

    *head = end;
    *tail = start + summary.consumed;
    compact(input, head, tail);

    match found {
        Some(bytes) => {
            debug!(size = bytes.len(), "extracted frame");
            Ok(Frame::from_validated(bytes))
        }
        None => Err(FrameError::NoFrameFound),
    }
}

fn cursor_bounds(input: &[u8], head: usize, tail: usize) -> (usize, usize) {
    let end = head.min(input.len());
    (tail.min(end), end)
}

/// Run the frame state machine over `input`, handing each validated frame to
/// `on_frame`. Stops early if `on_frame` breaks.
fn scan<F>(input: &[u8], max_frame_size: usize, mut on_frame: F) -> ParseSummary
where
    F: FnMut(&[u8]) -> ControlFlow<()>,
{
    let max_frame_size = max_frame_size.min(MAX_FRAME_SIZE);
    let mut scratch = [0u8; MAX_FRAME_SIZE];
    let mut count = 0usize;
    let mut state = State::SeekingStart;
    let mut summary = ParseSummary::default();

    for &byte in input {
        if byte == START_DELIMITER {
            if count > 0 {
                trace!(len = count, "start delimiter inside frame, restarting");
                summary.consumed += count;
                summary.discarded += 1;
                count = 0;
            }
            state = State::SeekingStart;
        }

        match state {
            State::SeekingStart => {
                if byte == START_DELIMITER {
                    scratch[0] = byte;
                    count = 1;
                    state = State::LengthHigh;
                } else {
                    summary.consumed += 1;
                }
            }
            State::LengthHigh => {
                scratch[count] = byte;
                count += 1;
                state = State::LengthLow;
            }
            State::LengthLow => {
                scratch[count] = byte;
                count += 1;

                let declared = u16::from_be_bytes([scratch[1], scratch[2]]) as usize;
                if declared < MIN_BODY_LEN || declared + FRAME_OVERHEAD > max_frame_size {
                    warn!(declared, max_frame_size, "discarding frame with out-of-range length");
                    summary.consumed += count;
                    summary.discarded += 1;
                    count = 0;
                    state = State::SeekingStart;
                } else {
                    state = State::Body { declared };
                }
            }
            State::Body { declared } => {
                if count < declared + HEADER_SIZE {
                    scratch[count] = byte;
                    count += 1;
                    continue;
                }

                let expected = checksum(&scratch[HEADER_SIZE..count]);
                if expected == byte {
                    scratch[count] = byte;
                    count += 1;
                    summary.consumed += count;
                    summary.frames += 1;
                    let flow = on_frame(&scratch[..count]);
                    count = 0;
                    state = State::SeekingStart;
                    if flow.is_break() {
                        break;
                    }
                } else {
                    trace!(expected, received = byte, "checksum mismatch, discarding frame");
                    summary.consumed += count + 1;
                    summary.discarded += 1;
                    count = 0;
                    state = State::SeekingStart;
                }
            }
        }
    }

    summary
}

/// Move `input[tail..head]` to the front, zero everything after it, reset
/// `tail` to 0.
fn compact(input: &mut [u8], head: &mut usize, tail: &mut usize) {
    let remaining = *head - *tail;
    input.copy_within(*tail..*head, 0);
    input[remaining..].fill(0);
    *head = remaining;
    *tail = 0;
}

/// Fixed-capacity inbound byte buffer that owns its parser cursor.
///
/// Transport code appends raw chunks with [`StreamBuffer::extend_from_slice`]
/// and pulls frames out with [`StreamBuffer::extract_frames`] or
/// [`StreamBuffer::extract_first`]. A single buffer must not be shared between
/// concurrent readers.
#[derive(Debug)]
pub struct StreamBuffer {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
    max_frame_size: usize,
}

impl StreamBuffer {
    /// Create a new stream buffer with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new stream buffer with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        let config = config.normalized();
        Self {
            buf: vec![0u8; config.buffer_capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            max_frame_size: config.max_frame_size,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of valid buffered bytes.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Read position; 0 between parser passes.
    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.head - self.tail
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free space after `head`.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity() - self.head
    }

    /// The buffered, not yet consumed bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.tail..self.head]
    }

    /// Append raw bytes at `head`.
    ///
    /// Fails without writing anything if the bytes do not fit.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.remaining_capacity() {
            return Err(FrameError::CapacityExceeded {
                needed: data.len(),
                available: self.remaining_capacity(),
            });
        }
        self.buf[self.head..self.head + data.len()].copy_from_slice(data);
        self.head += data.len();
        Ok(())
    }

    /// Writable region after `head`, for reading directly into the buffer.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.head..]
    }

    /// Mark `n` bytes written through [`StreamBuffer::spare_mut`] as valid.
    pub fn commit(&mut self, n: usize) -> Result<()> {
        if n > self.remaining_capacity() {
            return Err(FrameError::CapacityExceeded {
                needed: n,
                available: self.remaining_capacity(),
            });
        }
        self.head += n;
        Ok(())
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.head = 0;
        self.tail = 0;
    }

    /// Batch extraction: append every complete frame to `out`.
    pub fn extract_frames(&mut self, out: &mut BytesMut) -> ParseSummary {
        parse_bytes_with_limit(
            &mut self.buf,
            &mut self.head,
            &mut self.tail,
            out,
            self.max_frame_size,
        )
    }

    /// Single extraction: return the first complete frame.
    pub fn extract_first(&mut self) -> Result<Frame> {
        extract_first_frame_with_limit(
            &mut self.buf,
            &mut self.head,
            &mut self.tail,
            self.max_frame_size,
        )
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_at_command, FrameType};
    use crate::command::AtCommand;

    const NI_RESPONSE: [u8; 9] = [0x7E, 0x00, 0x05, 0x88, 0x01, 0x4E, 0x49, 0x00, 0xDF];
    const CH_RESPONSE: [u8; 9] = [0x7E, 0x00, 0x05, 0x88, 0x01, 0x43, 0x48, 0x00, 0xEB];
    const RECEIVE_ASD: [u8; 19] = [
        0x7E, 0x00, 0x0F, 0x90, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0x01,
        0x61, 0x73, 0x64, 0x41,
    ];

    fn buffer_with(bytes: &[u8]) -> StreamBuffer {
        let mut buffer = StreamBuffer::new();
        buffer.extend_from_slice(bytes).unwrap();
        buffer
    }

    #[test]
    fn frame_embedded_in_garbage() {
        let mut input = [
            0x01, 0x00, 0x03, 0x99, 0x10, 0x7E, 0x00, 0x05, 0x88, 0x01, 0x4E, 0x49, 0x00, 0xDF,
            0x99, 0x23, 0x00, 0xFF,
        ];
        let mut head = input.len();
        let mut tail = 0;
        let mut out = BytesMut::new();

        let summary = parse_bytes(&mut input, &mut head, &mut tail, &mut out);

        assert_eq!(summary.consumed, 18);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.emitted, 9);
        assert_eq!(summary.discarded, 0);
        assert_eq!(&out[..], NI_RESPONSE);
        assert_eq!((head, tail), (0, 0));
        assert!(input.iter().all(|&b| b == 0));
    }

    #[test]
    fn second_pass_without_new_bytes_is_idle() {
        let mut buffer = buffer_with(&[0x01, 0x02]);
        buffer.extend_from_slice(&NI_RESPONSE).unwrap();
        buffer.extend_from_slice(&[0x99, 0x23]).unwrap();
        let mut out = BytesMut::new();

        assert_eq!(buffer.extract_frames(&mut out).frames, 1);
        assert_eq!((buffer.head(), buffer.tail()), (0, 0));

        let summary = buffer.extract_frames(&mut out);
        assert_eq!(summary, ParseSummary::default());
        assert_eq!((buffer.head(), buffer.tail()), (0, 0));
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn restarts_on_every_delimiter() {
        let mut input = vec![0x7E, 0x7E, 0x00, 0x01];
        input.extend_from_slice(&[
            0x7E, 0x00, 0x0F, 0x90, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
            0x01, 0x61, 0x62, 0x63, 0x53,
        ]);
        input.extend_from_slice(&[0x7E, 0x55]);
        let mut buffer = buffer_with(&input);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 1);
        assert_eq!(summary.consumed, input.len() - 2);
        assert_eq!(out.len(), 19);
        assert_eq!(&out[..], &input[4..23]);
        // The trailing partial frame survives compaction.
        assert_eq!(buffer.as_slice(), [0x7E, 0x55]);
        assert_eq!((buffer.head(), buffer.tail()), (2, 0));
    }

    #[test]
    fn receive_packet_alone() {
        let input = [
            0x7E, 0x00, 0x0E, 0x90, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
            0x01, 0x03, 0x44, 0x32,
        ];
        let mut buffer = buffer_with(&input);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 1);
        assert_eq!(&out[..], input);
        assert!(buffer.is_empty());
    }

    #[test]
    fn extract_first_of_several_frames() {
        let mut buffer = buffer_with(&CH_RESPONSE);
        buffer.extend_from_slice(&NI_RESPONSE).unwrap();
        buffer.extend_from_slice(&RECEIVE_ASD).unwrap();

        let frame = buffer.extract_first().unwrap();

        assert_eq!(frame.as_bytes(), CH_RESPONSE);
        assert_eq!(buffer.tail(), 0);
        assert_eq!(buffer.head(), 28);
        assert_eq!(&buffer.as_slice()[..9], NI_RESPONSE);
        assert_eq!(&buffer.as_slice()[9..], RECEIVE_ASD);

        let second = buffer.extract_first().unwrap();
        assert_eq!(second.at_response_command().unwrap(), Some(AtCommand::Ni));
        let third = buffer.extract_first().unwrap();
        assert_eq!(third.frame_type(), FrameType::ReceivePacket);
        assert_eq!(third.receive_payload().unwrap(), b"asd");
        assert!(buffer.is_empty());
    }

    #[test]
    fn batch_emits_frames_contiguously() {
        let mut buffer = buffer_with(&CH_RESPONSE);
        buffer.extend_from_slice(&[0x00, 0x11]).unwrap();
        buffer.extend_from_slice(&NI_RESPONSE).unwrap();
        buffer.extend_from_slice(&RECEIVE_ASD).unwrap();
        let mut out = BytesMut::from(&b"prefix"[..]);

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.consumed, 39);
        assert_eq!(summary.emitted, 37);
        assert_eq!(&out[..6], b"prefix");
        assert_eq!(&out[6..15], CH_RESPONSE);
        assert_eq!(&out[15..24], NI_RESPONSE);
        assert_eq!(&out[24..], RECEIVE_ASD);
    }

    #[test]
    fn no_frame_found_consumes_garbage() {
        let mut buffer = buffer_with(&[0x01, 0x02, 0x03]);

        let err = buffer.extract_first().unwrap_err();

        assert!(matches!(err, FrameError::NoFrameFound));
        assert!(buffer.is_empty());
    }

    #[test]
    fn checksum_mismatch_is_discarded() {
        let mut corrupt = NI_RESPONSE;
        corrupt[8] = 0xDE;
        let mut buffer = buffer_with(&corrupt);
        buffer.extend_from_slice(&CH_RESPONSE).unwrap();
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 1);
        assert_eq!(summary.discarded, 1);
        assert_eq!(summary.consumed, 18);
        assert_eq!(&out[..], CH_RESPONSE);
    }

    #[test]
    fn oversized_length_is_discarded() {
        // Declares 0x7D body bytes: 129 bytes on the wire.
        let mut buffer = buffer_with(&[0x7E, 0x00, 0x7D, 0x01, 0x02]);
        buffer.extend_from_slice(&NI_RESPONSE).unwrap();
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 1);
        assert_eq!(summary.discarded, 1);
        assert_eq!(&out[..], NI_RESPONSE);
    }

    #[test]
    fn high_length_byte_is_honoured() {
        let mut buffer = buffer_with(&[0x7E, 0x01, 0x05, 0x88, 0x01]);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.discarded, 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn configured_frame_limit() {
        let cfg = FrameConfig {
            max_frame_size: 12,
            ..FrameConfig::default()
        };
        let mut buffer = StreamBuffer::with_config(cfg);
        buffer.extend_from_slice(&RECEIVE_ASD).unwrap();
        buffer.extend_from_slice(&CH_RESPONSE).unwrap();
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 1);
        assert_eq!(&out[..], CH_RESPONSE);
    }

    #[test]
    fn body_shorter_than_header_is_discarded() {
        let mut buffer = buffer_with(&[0x7E, 0x00, 0x00, 0xFF]);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.discarded, 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn frame_split_across_appends() {
        let mut buffer = buffer_with(&NI_RESPONSE[..5]);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);
        assert_eq!(summary.frames, 0);
        assert_eq!(buffer.head(), 5);
        assert_eq!(buffer.as_slice(), &NI_RESPONSE[..5]);

        buffer.extend_from_slice(&NI_RESPONSE[5..]).unwrap();
        let summary = buffer.extract_frames(&mut out);
        assert_eq!(summary.frames, 1);
        assert_eq!(&out[..], NI_RESPONSE);
        assert!(buffer.is_empty());
    }

    #[test]
    fn checksum_equal_to_delimiter_is_lost() {
        // Body sums to 0x81, so the checksum byte is 0x7E.
        let mut buffer = buffer_with(&[0x7E, 0x00, 0x02, 0x42, 0x3F, 0x7E]);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.consumed, 5);
        assert_eq!(buffer.as_slice(), [0x7E]);
    }

    #[test]
    fn encoded_frames_parse_back() {
        let mut wire = BytesMut::new();
        encode_at_command(AtCommand::Ni, b"crumb", &mut wire).unwrap();
        encode_at_command(AtCommand::Sh, &[], &mut wire).unwrap();
        let mut buffer = buffer_with(&wire);
        let mut out = BytesMut::new();

        let summary = buffer.extract_frames(&mut out);

        assert_eq!(summary.frames, 2);
        assert_eq!(out, wire);
    }

    #[test]
    fn capacity_is_enforced() {
        let cfg = FrameConfig {
            buffer_capacity: MAX_FRAME_SIZE,
            ..FrameConfig::default()
        };
        let mut buffer = StreamBuffer::with_config(cfg);
        buffer.extend_from_slice(&[0u8; 100]).unwrap();

        let err = buffer.extend_from_slice(&[0u8; 29]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::CapacityExceeded {
                needed: 29,
                available: 28
            }
        ));
        assert_eq!(buffer.head(), 100);
    }

    #[test]
    fn spare_and_commit() {
        let mut buffer = StreamBuffer::new();
        buffer.spare_mut()[..9].copy_from_slice(&NI_RESPONSE);
        buffer.commit(9).unwrap();

        assert_eq!(buffer.extract_first().unwrap().as_bytes(), NI_RESPONSE);
        assert!(buffer.commit(buffer.capacity() + 1).is_err());
    }

    #[test]
    fn compaction_zeroes_past_head() {
        let mut input = [0u8; 16];
        input[..4].copy_from_slice(&[0x33, 0x7E, 0x00, 0x05]);
        input[10] = 0xAA;
        let mut head = 4;
        let mut tail = 0;
        let mut out = BytesMut::new();

        parse_bytes(&mut input, &mut head, &mut tail, &mut out);

        assert_eq!((head, tail), (3, 0));
        assert_eq!(&input[..3], [0x7E, 0x00, 0x05]);
        assert!(input[3..].iter().all(|&b| b == 0));
    }
}
