//! DigiMesh API frame codec.
//!
//! Encodes outbound AT command and transmit request frames, validates AT
//! parameter values, and recovers inbound frames from a noisy serial byte
//! stream.
//!
//! # Crate Structure
//!
//! - [`frame`] - Frame encoding, inspection, validation and stream parsing

/// Re-export frame types.
pub mod frame {
    pub use digimesh_frame::*;
}
