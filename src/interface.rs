//! I2C bus interface for the IAM-20380
//!
//! Adapts any `embedded-hal` I2C bus to the `device-driver` register
//! interface. On Linux this is typically `linux_embedded_hal::I2cdev`.

use crate::I2C_ADDRESS_AD0_HIGH;
use device_driver::RegisterInterface;

/// I2C interface for the IAM-20380
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the default address (0x69, AD0 pin HIGH)
    ///
    /// Most IAM-20380 breakout boards pull AD0 high.
    #[must_use]
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_AD0_HIGH,
        }
    }

    /// Create a new I2C interface with the alternative address (0x68, AD0 pin LOW)
    #[must_use]
    pub const fn alternative(i2c: I2C) -> Self {
        Self {
            i2c,
            address: crate::I2C_ADDRESS_AD0_LOW,
        }
    }

    /// Create a new I2C interface bound to a custom device address
    #[must_use]
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Device address this interface talks to
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    #[must_use]
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len() for I2C
        self.i2c.write_read(self.address, &[address], read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits;
        // Register writes on this part are single bytes; address + value
        let mut buffer = [0u8; 3];
        buffer[0] = address;
        let len = write_data.len().min(2);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.i2c.write(self.address, &buffer[..=len])
    }
}
