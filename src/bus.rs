//! Byte-level register transactions
//!
//! [`RegisterBus`] is the narrow contract the rest of the crate relies on:
//! single-byte reads and writes keyed by register address, plus a 16-bit
//! word read composed from two consecutive byte reads. It is implemented for
//! every `device-driver` [`RegisterInterface`] with 8-bit addresses, so the
//! real I2C adapter and the test mock both get it without extra code.
//!
//! The bus never sleeps. Settle delays after mode-changing writes depend on
//! which register changed, so they are owned by the caller (see
//! [`Iam20380Driver`](crate::Iam20380Driver)).

use device_driver::RegisterInterface;

/// Minimal transactional access to the device register space
pub trait RegisterBus {
    /// Transport error
    type Error;

    /// Read one byte from `address`
    ///
    /// # Errors
    ///
    /// Returns the transport error if the transaction fails.
    fn read_byte(&mut self, address: u8) -> Result<u8, Self::Error>;

    /// Write one byte to `address`
    ///
    /// # Errors
    ///
    /// Returns the transport error if the transaction fails.
    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error>;

    /// Read a big-endian signed word as two byte reads from `address` and `address + 1`
    ///
    /// # Errors
    ///
    /// Returns the transport error if either byte read fails.
    fn read_word(&mut self, address: u8) -> Result<i16, Self::Error> {
        let high = self.read_byte(address)?;
        let low = self.read_byte(address.wrapping_add(1))?;
        Ok(i16::from_be_bytes([high, low]))
    }
}

impl<T> RegisterBus for T
where
    T: RegisterInterface<AddressType = u8>,
{
    type Error = <T as RegisterInterface>::Error;

    fn read_byte(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0u8; 1];
        self.read_register(address, 8, &mut buffer)?;
        Ok(buffer[0])
    }

    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.write_register(address, 8, &[value])
    }
}
