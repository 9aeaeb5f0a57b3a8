//! Identity of the locally attached radio module.
//!
//! The module's 64-bit serial number doubles as its network address. An
//! all-`0xFF` address means no module has been registered yet.

use tracing::debug;

use crate::codec::{Address, ADDRESS_LENGTH};

const UNREGISTERED: Address = [0xFF; ADDRESS_LENGTH];

/// Caller-owned registration record for one radio module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    address: Address,
}

impl Registration {
    /// Create an empty (unregistered) record.
    pub fn new() -> Self {
        Self {
            address: UNREGISTERED,
        }
    }

    /// True once an address other than all-`0xFF` has been stored.
    pub fn is_registered(&self) -> bool {
        self.address != UNREGISTERED
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn set_address(&mut self, address: Address) {
        debug!(address = ?address, "registered module address");
        self.address = address;
    }

    /// Store the address from the two halves returned by the SH and SL
    /// queries.
    pub fn set_serial(&mut self, high: [u8; 4], low: [u8; 4]) {
        let mut address = [0u8; ADDRESS_LENGTH];
        address[..4].copy_from_slice(&high);
        address[4..].copy_from_slice(&low);
        self.set_address(address);
    }

    pub fn serial_high(&self) -> [u8; 4] {
        [self.address[0], self.address[1], self.address[2], self.address[3]]
    }

    pub fn serial_low(&self) -> [u8; 4] {
        [self.address[4], self.address[5], self.address[6], self.address[7]]
    }

    /// Forget the stored address.
    pub fn reset(&mut self) {
        self.address = UNREGISTERED;
    }
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}
