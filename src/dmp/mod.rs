//! Digital Motion Processor (DMP) Support
//!
//! The MPU-6050's DMP fuses accelerometer and gyroscope data on-chip and
//! pushes fixed-size packets into the FIFO.
//!
//! ## Important: Firmware Loading Required
//!
//! The DMP **does not have pre-programmed firmware**. Its program memory is
//! volatile, so the host must upload the 3062-byte MotionApps 6.12 image on
//! every power-up. The image is supplied by the caller (it is not bundled
//! with this crate) and is checked for length before any bus activity.
//!
//! ## Usage Example
//!
//! ```ignore
//! # use mpu6050_dmp::{Mpu6050, FifoDrainConfig, QuaternionRaw};
//! # let mut mpu: Mpu6050<_> = todo!();
//! # let mut delay = todo!();
//! static IMAGE: &[u8] = include_bytes!("dmp_6_12.bin");
//!
//! mpu.dmp_initialize(IMAGE, &mut delay)?;
//! mpu.set_dmp_enabled(true)?;
//!
//! let config = FifoDrainConfig::dmp();
//! let mut packet = [0u8; 28];
//! loop {
//!     mpu.read_dmp_packet(&mut delay, &config, &mut packet)?;
//!     if let Some(q) = QuaternionRaw::from_packet(&packet) {
//!         let q = q.to_quaternion();
//!     }
//! }
//! # Ok::<(), mpu6050_dmp::Error<()>>(())
//! ```

pub mod loader;
pub mod packet;

pub use loader::{
    BankFlags, ChunkMismatch, MemoryCursor, load_image, read_memory, read_memory_with,
};
pub use packet::{Quaternion, QuaternionRaw};

use crate::config::{DlpfMode, GyroFullScale};

/// Size of the MotionApps 6.12 DMP firmware in bytes
pub const DMP_FIRMWARE_SIZE: usize = 3062;

/// DMP program start address (written to `DMP_CFG_1`/`DMP_CFG_2`)
pub const DMP_START_ADDRESS: u16 = 0x0400;

/// Size of one DMP FIFO packet in bytes
pub const DMP_PACKET_SIZE: usize = 28;

/// Number of addressable 256-byte DMP memory banks
///
/// The 6.12 image alone reaches into bank 11.
pub const DMP_MEMORY_BANKS: usize = 16;

/// DMP memory bank size (bytes)
pub const DMP_BANK_SIZE: usize = 256;

/// Maximum bytes per DMP memory write, set by the device's burst limit
pub const DMP_CHUNK_SIZE: usize = 16;

/// Settle time after the device reset and the signal-path reset (ms)
pub const RESET_SETTLE_MS: u32 = 100;

/// A DMP firmware image of the expected length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmpFirmware<'a> {
    image: &'a [u8],
}

impl<'a> DmpFirmware<'a> {
    /// Wrap an image, returning `None` unless it is exactly
    /// [`DMP_FIRMWARE_SIZE`] bytes long
    pub const fn new(image: &'a [u8]) -> Option<Self> {
        if image.len() == DMP_FIRMWARE_SIZE {
            Some(Self { image })
        } else {
            None
        }
    }

    /// Raw image bytes
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.image
    }
}

/// Settings used by the DMP initialization sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmpConfig {
    /// `SMPLRT_DIV` while the firmware is loaded
    pub sample_rate_div: u8,
    /// Digital low-pass filter bandwidth
    pub dlpf: DlpfMode,
    /// Gyroscope range the firmware expects
    pub gyro_range: GyroFullScale,
    /// `SMPLRT_DIV` left in place for DMP output (1 kHz / (1 + div))
    pub output_rate_div: u8,
}

impl Default for DmpConfig {
    fn default() -> Self {
        Self {
            sample_rate_div: 4,
            dlpf: DlpfMode::Bw188,
            gyro_range: GyroFullScale::Dps2000,
            output_rate_div: 4, // 200 Hz
        }
    }
}

impl DmpConfig {
    /// Set the sample rate divider used during initialization
    pub fn with_sample_rate_div(mut self, div: u8) -> Self {
        self.sample_rate_div = div;
        self
    }

    /// Set the digital low-pass filter bandwidth
    pub fn with_dlpf(mut self, dlpf: DlpfMode) -> Self {
        self.dlpf = dlpf;
        self
    }

    /// Set the gyroscope range
    pub fn with_gyro_range(mut self, range: GyroFullScale) -> Self {
        self.gyro_range = range;
        self
    }

    /// Set the final output rate divider
    pub fn with_output_rate_div(mut self, div: u8) -> Self {
        self.output_rate_div = div;
        self
    }
}
