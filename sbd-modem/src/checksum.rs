//! Additive checksum used by the SBD binary buffers (`AT+SBDWB`, `AT+SBDRB`)

use sbd_core::{SbdError, SbdResult};

/// Checksum calculator
///
/// The checksum is the least significant 16 bits of the sum of all payload
/// bytes, transmitted high byte first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SbdChecksum {
    sum: u16,
}

impl SbdChecksum {
    /// Create a new checksum calculator
    pub fn new() -> Self {
        Self::default()
    }

    /// Checksum of a complete payload
    pub fn of(data: &[u8]) -> Self {
        let mut calc = Self::new();
        calc.update_bytes(data);
        calc
    }

    /// Reset the checksum to zero
    pub fn reset(&mut self) {
        self.sum = 0;
    }

    /// Update the checksum with a single byte
    pub fn update(&mut self, data: u8) {
        self.sum = self.sum.wrapping_add(data as u16);
    }

    /// Update the checksum with multiple bytes
    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Get the current checksum value
    pub fn value(&self) -> u16 {
        self.sum
    }

    /// Get the checksum as transmitted on the wire (big-endian)
    pub fn to_bytes(&self) -> [u8; 2] {
        self.sum.to_be_bytes()
    }

    /// Compare against a checksum trailer received from the modem
    pub fn validate(&self, trailer: [u8; 2]) -> SbdResult<()> {
        let received = u16::from_be_bytes(trailer);
        if received != self.sum {
            Err(SbdError::Parse(format!(
                "Checksum has wrong value: 0x{:04X}, expected 0x{:04X}",
                received, self.sum
            )))
        } else {
            Ok(())
        }
    }
}
