//! Bus interface implementation for the MPU-6050
//!
//! This module provides the `device-driver` register interface over I2C.
//! The MPU-6050 has no SPI port, so I2C is the only transport.

use crate::I2C_ADDRESS_AD0_LOW;

use device_driver::RegisterInterface;
use embedded_hal::i2c::{I2c, Operation};

/// I2C interface for the MPU-6050
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the default address (0x68, AD0 pin LOW)
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let mut mpu = Mpu6050::new(interface)?;
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_AD0_LOW,
        }
    }

    /// Create a new I2C interface with the alternative address (0x69, AD0 pin HIGH)
    pub const fn alternative(i2c: I2C) -> Self {
        Self {
            i2c,
            address: crate::I2C_ADDRESS_AD0_HIGH,
        }
    }

    /// Create a new I2C interface with a custom 7-bit device address
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit device address this interface talks to
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: I2c<Error = E>,
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
        // Adjacent writes go out without a restart, so the device sees the
        // register address followed by the whole payload
        self.i2c.transaction(
            self.address,
            &mut [Operation::Write(&[address]), Operation::Write(write_data)],
        )
    }
}
