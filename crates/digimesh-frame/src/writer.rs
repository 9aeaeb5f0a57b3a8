use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{
    encode_at_command, encode_transmit_request, required_packet_count, split_payload, Address,
    Frame, MAX_FRAME_SIZE,
};
use crate::command::AtCommand;
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Write an already-built frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        write_all(&mut self.inner, frame.as_bytes())?;
        self.flush()
    }

    /// Encode and send a local AT command.
    pub fn send_at_command(&mut self, command: AtCommand, value: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_at_command(command, value, &mut self.buf)?;
        self.send_buffered()
    }

    /// Encode and send a single transmit request.
    ///
    /// Payloads longer than one packet are rejected; see [`Self::send_payload`].
    pub fn send_transmit_request(&mut self, destination: &Address, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_transmit_request(destination, payload, &mut self.buf)?;
        self.send_buffered()
    }

    /// Send a payload of any length as consecutive transmit requests.
    ///
    /// Returns the number of frames written. An empty payload still produces
    /// one frame.
    pub fn send_payload(&mut self, destination: &Address, payload: &[u8]) -> Result<usize> {
        let count = required_packet_count(payload.len());
        if payload.is_empty() {
            self.send_transmit_request(destination, payload)?;
            return Ok(1);
        }

        for chunk in split_payload(payload) {
            self.send_transmit_request(destination, chunk)?;
        }

        debug!(bytes = payload.len(), frames = count, "sent payload");
        Ok(count)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn send_buffered(&mut self) -> Result<()> {
        write_all(&mut self.inner, &self.buf)?;
        self.flush()
    }
}

fn write_all<T: Write>(inner: &mut T, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}
