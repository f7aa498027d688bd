//! Register bus adapter
//!
//! Wraps a [`RegisterInterface`] and adds bit, bitfield and 16-bit word access
//! on top of the raw byte transactions.
//!
//! # Atomicity
//!
//! Bit, field and word writes are read-modify-write sequences spanning two
//! bus transactions. The device has no lock, so nothing may touch the same
//! register between the read and the write. Every method takes `&mut self`,
//! which gives that guarantee within one owner; sharing the bus between
//! threads or tasks needs a mutex around the whole adapter. There is no
//! retry or compare-and-swap: transport errors are returned as they occur.

use device_driver::RegisterInterface;

use crate::Error;
use crate::registers::BitField;

/// Register access with bit-level and word-level helpers
pub struct RegisterBus<I> {
    interface: I,
}

impl<I> RegisterBus<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Wrap a register interface
    pub const fn new(interface: I) -> Self {
        Self { interface }
    }

    /// Consume the adapter and return the interface
    pub fn release(self) -> I {
        self.interface
    }

    /// Read a single register
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn read_byte(&mut self, address: u8) -> Result<u8, Error<I::Error>> {
        let mut buffer = [0u8; 1];
        self.read_bytes(address, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Write a single register
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.write_bytes(address, &[value])
    }

    /// Read `buffer.len()` bytes starting at `address` in one transaction
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn read_bytes(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Error<I::Error>> {
        if buffer.is_empty() {
            return Ok(());
        }
        let size_bits = (buffer.len() * 8) as u32;
        self.interface.read_register(address, size_bits, buffer)?;
        Ok(())
    }

    /// Write `data` starting at `address` in one transaction
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn write_bytes(&mut self, address: u8, data: &[u8]) -> Result<(), Error<I::Error>> {
        let size_bits = (data.len() * 8) as u32;
        self.interface.write_register(address, size_bits, data)?;
        Ok(())
    }

    /// Read one bit of a register
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `bit > 7`, or [`Error::Bus`] if the
    /// transaction fails.
    pub fn read_bit(&mut self, address: u8, bit: u8) -> Result<bool, Error<I::Error>> {
        let field = BitField::try_new(address, bit, 1).ok_or(Error::InvalidConfig)?;
        Ok(self.read_field(field)? != 0)
    }

    /// Set or clear one bit of a register, leaving the others untouched
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `bit > 7`, or [`Error::Bus`] if
    /// either transaction fails.
    pub fn write_bit(&mut self, address: u8, bit: u8, value: bool) -> Result<(), Error<I::Error>> {
        let field = BitField::try_new(address, bit, 1).ok_or(Error::InvalidConfig)?;
        self.write_field(field, u8::from(value))
    }

    /// Read a multi-bit field, returned right-aligned
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn read_field(&mut self, field: BitField) -> Result<u8, Error<I::Error>> {
        let byte = self.read_byte(field.register())?;
        Ok(field.extract(byte))
    }

    /// Write a multi-bit field, leaving the rest of the register untouched
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] without touching the bus if `value`
    /// does not fit in the field, or [`Error::Bus`] if either transaction fails.
    pub fn write_field(&mut self, field: BitField, value: u8) -> Result<(), Error<I::Error>> {
        let max = field.max_value();
        if value > max {
            return Err(Error::ValueOutOfRange { value, max });
        }

        let current = self.read_byte(field.register())?;
        self.write_byte(field.register(), field.insert(current, value))
    }

    /// Read a signed big-endian word from `address` (high) and `address + 1` (low)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn read_word(&mut self, address: u8) -> Result<i16, Error<I::Error>> {
        let mut buffer = [0u8; 2];
        self.read_bytes(address, &mut buffer)?;
        Ok(i16::from_be_bytes(buffer))
    }

    /// Read an unsigned big-endian word from `address` and `address + 1`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn read_u16(&mut self, address: u8) -> Result<u16, Error<I::Error>> {
        let mut buffer = [0u8; 2];
        self.read_bytes(address, &mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    /// Write a signed word as two big-endian bytes in a single transaction
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the transaction fails.
    pub fn write_word(&mut self, address: u8, value: i16) -> Result<(), Error<I::Error>> {
        self.write_bytes(address, &value.to_be_bytes())
    }
}
