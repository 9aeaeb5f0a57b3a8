use crate::command::AtCommand;

/// Errors that can occur during frame encoding, parsing and inspection.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The value was rejected by the per-command validation rules.
    #[error("invalid value for AT command {command} ({len} bytes)")]
    InvalidValue { command: AtCommand, len: usize },

    /// The transmit payload exceeds the protocol ceiling.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A single-frame scan exhausted its input without a checksum-valid frame.
    #[error("no complete frame found in buffered input")]
    NoFrameFound,

    /// The frame bytes do not follow the expected layout.
    #[error("malformed frame: {0}")]
    Malformed(&'static str),

    /// A fixed-offset field lies beyond the end of the frame.
    #[error("frame truncated ({available} bytes, need {needed})")]
    Truncated { needed: usize, available: usize },

    /// A write would run past the end of a bounded buffer.
    #[error("buffer capacity exceeded ({needed} bytes needed, {available} available)")]
    CapacityExceeded { needed: usize, available: usize },

    /// The mnemonic does not name a supported AT command.
    #[error("unknown AT command {0:?}")]
    UnknownCommand(String),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
