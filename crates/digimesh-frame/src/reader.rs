use std::io::{ErrorKind, Read};

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::parser::StreamBuffer;

/// Reads complete frames from any `Read` stream (serial port, socket, file).
///
/// Handles partial reads and line noise internally; callers always get
/// checksum-valid frames.
pub struct FrameReader<T> {
    inner: T,
    buf: StreamBuffer,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        let config = config.normalized();
        Self {
            inner,
            buf: StreamBuffer::with_config(config.clone()),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            match self.buf.extract_first() {
                Ok(frame) => return Ok(frame),
                Err(FrameError::NoFrameFound) => {}
                Err(err) => return Err(err),
            }

            if self.buf.remaining_capacity() == 0 {
                return Err(FrameError::CapacityExceeded {
                    needed: 1,
                    available: 0,
                });
            }

            let read = match self.inner.read(self.buf.spare_mut()) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.commit(read)?;
        }
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream ends; a clean EOF ends iteration.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
