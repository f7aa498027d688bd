//! Sensor configuration types
//!
//! Register-level settings of the MPU-6050 expressed as enums. Each variant's
//! discriminant is the raw value of the corresponding [`BitField`](crate::BitField).

use crate::registers;

/// Clock source selection (`PWR_MGMT_1.CLKSEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Internal 8 MHz oscillator
    Internal = 0,
    /// PLL with X axis gyroscope reference (recommended)
    PllXGyro = 1,
    /// PLL with Y axis gyroscope reference
    PllYGyro = 2,
    /// PLL with Z axis gyroscope reference
    PllZGyro = 3,
    /// PLL with external 32.768 kHz reference
    PllExt32k = 4,
    /// PLL with external 19.2 MHz reference
    PllExt19M = 5,
    /// Stops the clock and keeps the timing generator in reset
    KeepReset = 7,
}

impl ClockSource {
    /// Decode a `CLKSEL` field value (6 is reserved)
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Internal),
            1 => Some(Self::PllXGyro),
            2 => Some(Self::PllYGyro),
            3 => Some(Self::PllZGyro),
            4 => Some(Self::PllExt32k),
            5 => Some(Self::PllExt19M),
            7 => Some(Self::KeepReset),
            _ => None,
        }
    }
}

/// Gyroscope full-scale range (`GYRO_CONFIG.FS_SEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroFullScale {
    /// ±250°/s range
    Dps250 = 0,
    /// ±500°/s range
    Dps500 = 1,
    /// ±1000°/s range
    Dps1000 = 2,
    /// ±2000°/s range
    Dps2000 = 3,
}

impl GyroFullScale {
    /// Decode a two-bit `FS_SEL` value
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Dps250,
            1 => Self::Dps500,
            2 => Self::Dps1000,
            _ => Self::Dps2000,
        }
    }

    /// Full `GYRO_CONFIG` byte selecting this range with self-test off
    pub const fn config_byte(self) -> u8 {
        registers::GCONFIG_FS_SEL.insert(0, self as u8)
    }

    /// Get the sensitivity in LSB/(°/s)
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

/// Accelerometer full-scale range (`ACCEL_CONFIG.AFS_SEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelFullScale {
    /// ±2g range
    G2 = 0,
    /// ±4g range
    G4 = 1,
    /// ±8g range
    G8 = 2,
    /// ±16g range
    G16 = 3,
}

impl AccelFullScale {
    /// Decode a two-bit `AFS_SEL` value
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::G2,
            1 => Self::G4,
            2 => Self::G8,
            _ => Self::G16,
        }
    }

    /// Full `ACCEL_CONFIG` byte selecting this range with self-test and HPF off
    pub const fn config_byte(self) -> u8 {
        registers::ACONFIG_AFS_SEL.insert(0, self as u8)
    }

    /// Get the sensitivity in LSB/g
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}

/// Digital low-pass filter bandwidth (`CONFIG.DLPF_CFG`)
///
/// Bandwidths are for the accelerometer; the gyroscope figures are close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DlpfMode {
    /// 260 Hz (filter off, 8 kHz gyro output rate)
    Bw256 = 0,
    /// 184 Hz
    Bw188 = 1,
    /// 94 Hz
    Bw98 = 2,
    /// 44 Hz
    Bw42 = 3,
    /// 21 Hz
    Bw20 = 4,
    /// 10 Hz
    Bw10 = 5,
    /// 5 Hz
    Bw5 = 6,
}

impl DlpfMode {
    /// Decode a `DLPF_CFG` field value (7 is reserved)
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Bw256),
            1 => Some(Self::Bw188),
            2 => Some(Self::Bw98),
            3 => Some(Self::Bw42),
            4 => Some(Self::Bw20),
            5 => Some(Self::Bw10),
            6 => Some(Self::Bw5),
            _ => None,
        }
    }
}

/// Accelerometer digital high-pass filter (`ACCEL_CONFIG.ACCEL_HPF`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DhpfMode {
    /// Filter off
    Reset = 0,
    /// 5 Hz cutoff
    Hz5 = 1,
    /// 2.5 Hz cutoff
    Hz2_5 = 2,
    /// 1.25 Hz cutoff
    Hz1_25 = 3,
    /// 0.63 Hz cutoff
    Hz0_63 = 4,
    /// Hold the current sample as the filter output
    Hold = 7,
}

impl DhpfMode {
    /// Decode an `ACCEL_HPF` field value (5 and 6 are reserved)
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Reset),
            1 => Some(Self::Hz5),
            2 => Some(Self::Hz2_5),
            3 => Some(Self::Hz1_25),
            4 => Some(Self::Hz0_63),
            7 => Some(Self::Hold),
            _ => None,
        }
    }
}

/// External frame synchronisation input (`CONFIG.EXT_SYNC_SET`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExternalSync {
    /// FSYNC input disabled
    Disabled = 0,
    /// Latch into `TEMP_OUT_L` bit 0
    TempOutL = 1,
    /// Latch into `GYRO_XOUT_L` bit 0
    GyroXOutL = 2,
    /// Latch into `GYRO_YOUT_L` bit 0
    GyroYOutL = 3,
    /// Latch into `GYRO_ZOUT_L` bit 0
    GyroZOutL = 4,
    /// Latch into `ACCEL_XOUT_L` bit 0
    AccelXOutL = 5,
    /// Latch into `ACCEL_YOUT_L` bit 0
    AccelYOutL = 6,
    /// Latch into `ACCEL_ZOUT_L` bit 0
    AccelZOutL = 7,
}

/// Sensor axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis
    X = 0,
    /// Y axis
    Y = 1,
    /// Z axis
    Z = 2,
}

/// Chip variant, resolved once from the `WHO_AM_I` device id
///
/// The accelerometer offset registers moved between the MPU-6050 and the
/// MPU-6500 family; everything else this driver touches is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceVariant {
    /// MPU-6050 / MPU-6000 (device id 0x34)
    Mpu6050,
    /// MPU-6500 family (device id 0x38 or 0x39)
    Mpu6500,
}

impl DeviceVariant {
    /// Resolve the variant from the six-bit `WHO_AM_I` device id
    pub const fn from_device_id(id: u8) -> Option<Self> {
        match id {
            0x34 => Some(Self::Mpu6050),
            0x38 | 0x39 => Some(Self::Mpu6500),
            _ => None,
        }
    }

    /// Accelerometer offset registers (X, Y, Z high bytes)
    pub const fn accel_offset_registers(self) -> [u8; 3] {
        match self {
            Self::Mpu6050 => [
                registers::XA_OFFS_H,
                registers::YA_OFFS_H,
                registers::ZA_OFFS_H,
            ],
            Self::Mpu6500 => [
                registers::XA_OFFSET_H_6500,
                registers::YA_OFFSET_H_6500,
                registers::ZA_OFFSET_H_6500,
            ],
        }
    }
}
