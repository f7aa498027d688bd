#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod device;
pub mod dmp;
pub mod fifo;
pub mod interface;
pub mod registers;

// Re-export main types
pub use bus::RegisterBus;
pub use config::{
    AccelFullScale, Axis, ClockSource, DeviceVariant, DhpfMode, DlpfMode, ExternalSync, GyroFullScale,
};
pub use device::Mpu6050;
pub use dmp::{ChunkMismatch, DmpConfig, DmpFirmware, MemoryCursor, Quaternion, QuaternionRaw};
pub use fifo::FifoDrainConfig;
pub use interface::I2cInterface;
pub use registers::BitField;

/// MPU-6050 I2C address when AD0 pin is low (default: 0x68)
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// MPU-6050 I2C address when AD0 pin is high (alternative: 0x69)
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// Driver errors
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// A bitfield write value does not fit the field width
    ValueOutOfRange {
        /// Value that was rejected
        value: u8,
        /// Largest value the field can hold
        max: u8,
    },
    /// No complete FIFO packet was observed within the wait window
    Timeout,
    /// The FIFO count stayed between zero and one packet for too many polls
    MisalignedFifo {
        /// Last FIFO count observed
        count: u16,
    },
    /// Firmware chunk readback did not match what was written
    VerificationMismatch(ChunkMismatch),
    /// Firmware image does not have the expected length
    CorruptFirmwareImage {
        /// Length of the rejected image
        len: usize,
    },
    /// Unknown `WHO_AM_I` register value (contains the actual value read)
    InvalidDevice(u8),
    /// Invalid configuration parameter
    InvalidConfig,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
