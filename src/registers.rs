//! Register map for the MPU-6050
//!
//! The MPU-6050 has a single flat 8-bit register space. Sub-byte settings are
//! described as [`BitField`]s so the bus adapter can read-modify-write them
//! without disturbing neighbouring bits.

/// A contiguous run of bits within one register
///
/// `bit` is the most significant bit of the field (bit 0 = LSB) and `length`
/// the number of bits, so the field occupies `[bit - length + 1, bit]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitField {
    register: u8,
    bit: u8,
    length: u8,
}

impl BitField {
    /// Create a bitfield, panicking if it does not fit in one byte
    ///
    /// Meant for constants, where the check runs at compile time. Use
    /// [`BitField::try_new`] for values computed at runtime.
    pub const fn new(register: u8, bit: u8, length: u8) -> Self {
        match Self::try_new(register, bit, length) {
            Some(field) => field,
            None => panic!("bitfield must satisfy 1 <= length <= bit + 1 <= 8"),
        }
    }

    /// Create a bitfield, returning `None` if it does not fit in one byte
    pub const fn try_new(register: u8, bit: u8, length: u8) -> Option<Self> {
        if length == 0 || bit > 7 || length > bit + 1 {
            return None;
        }
        Some(Self {
            register,
            bit,
            length,
        })
    }

    /// Register holding the field
    pub const fn register(&self) -> u8 {
        self.register
    }

    /// Index of the field's most significant bit
    pub const fn bit(&self) -> u8 {
        self.bit
    }

    /// Field width in bits
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// Position of the field's least significant bit
    pub const fn shift(&self) -> u8 {
        self.bit + 1 - self.length
    }

    /// Largest value the field can hold (`2^length - 1`)
    pub const fn max_value(&self) -> u8 {
        ((1u16 << self.length) - 1) as u8
    }

    /// Mask of the field's bits in place within the register byte
    pub const fn mask(&self) -> u8 {
        self.max_value() << self.shift()
    }

    /// Extract the field value from a register byte
    pub const fn extract(&self, byte: u8) -> u8 {
        (byte & self.mask()) >> self.shift()
    }

    /// Replace the field value in a register byte, leaving other bits alone
    ///
    /// `value` must already be known to fit; excess bits are masked off.
    pub const fn insert(&self, byte: u8, value: u8) -> u8 {
        (byte & !self.mask()) | ((value << self.shift()) & self.mask())
    }
}

// ==================== CONFIGURATION ====================

/// Gyroscope X offset / OTP bank valid (MPU-6050 only)
pub const XG_OFFS_TC: u8 = 0x00;
/// MPU-6050 accelerometer X offset, high byte
pub const XA_OFFS_H: u8 = 0x06;
/// MPU-6050 accelerometer Y offset, high byte
pub const YA_OFFS_H: u8 = 0x08;
/// MPU-6050 accelerometer Z offset, high byte
pub const ZA_OFFS_H: u8 = 0x0A;
/// Gyroscope X user offset, high byte
pub const XG_OFFS_USRH: u8 = 0x13;
/// Gyroscope Y user offset, high byte
pub const YG_OFFS_USRH: u8 = 0x15;
/// Gyroscope Z user offset, high byte
pub const ZG_OFFS_USRH: u8 = 0x17;
/// Sample rate divider: rate = gyro output rate / (1 + `SMPLRT_DIV`)
pub const SMPLRT_DIV: u8 = 0x19;
/// External sync and digital low-pass filter
pub const CONFIG: u8 = 0x1A;
/// Gyroscope full-scale range
pub const GYRO_CONFIG: u8 = 0x1B;
/// Accelerometer full-scale range and high-pass filter
pub const ACCEL_CONFIG: u8 = 0x1C;
/// Motion detection threshold
pub const MOT_THR: u8 = 0x1F;
/// Motion detection duration
pub const MOT_DUR: u8 = 0x20;
/// Zero-motion detection threshold
pub const ZRMOT_THR: u8 = 0x21;
/// Zero-motion detection duration
pub const ZRMOT_DUR: u8 = 0x22;
/// Sensor FIFO enable (unused with the DMP, which has its own FIFO path)
pub const FIFO_EN: u8 = 0x23;
/// Auxiliary I2C slave 0 address; slaves 1-3 follow at a stride of 3
pub const I2C_SLV0_ADDR: u8 = 0x25;
/// Interrupt pin configuration
pub const INT_PIN_CFG: u8 = 0x37;
/// Interrupt enable
pub const INT_ENABLE: u8 = 0x38;
/// Interrupt status (cleared on read)
pub const INT_STATUS: u8 = 0x3A;

// ==================== SENSOR DATA ====================

/// First of six accelerometer output registers (X/Y/Z, big-endian)
pub const ACCEL_XOUT_H: u8 = 0x3B;
/// Temperature output, high byte
pub const TEMP_OUT_H: u8 = 0x41;
/// First of six gyroscope output registers (X/Y/Z, big-endian)
pub const GYRO_XOUT_H: u8 = 0x43;

// ==================== CONTROL ====================

/// Motion detection control
pub const MOT_DETECT_CTRL: u8 = 0x69;
/// User control: DMP/FIFO enable and resets
pub const USER_CTRL: u8 = 0x6A;
/// Power management 1: reset, sleep, cycle, clock source
pub const PWR_MGMT_1: u8 = 0x6B;
/// Power management 2
pub const PWR_MGMT_2: u8 = 0x6C;

// ==================== DMP MEMORY ====================

/// DMP memory bank select
pub const BANK_SEL: u8 = 0x6D;
/// DMP memory start address within the selected bank
pub const MEM_START_ADDR: u8 = 0x6E;
/// DMP memory read/write port (address auto-increments)
pub const MEM_R_W: u8 = 0x6F;
/// DMP program start address, high byte (low byte at 0x71)
pub const DMP_CFG_1: u8 = 0x70;
/// DMP program start address, low byte
pub const DMP_CFG_2: u8 = 0x71;

// ==================== FIFO ====================

/// FIFO byte count, high byte (low byte at 0x73)
pub const FIFO_COUNTH: u8 = 0x72;
/// FIFO byte count, low byte
pub const FIFO_COUNTL: u8 = 0x73;
/// FIFO data port; reading dequeues bytes
pub const FIFO_R_W: u8 = 0x74;
/// Device identity
pub const WHO_AM_I: u8 = 0x75;

// ==================== MPU-6500 FAMILY ====================

/// MPU-6500 family accelerometer X offset, high byte
pub const XA_OFFSET_H_6500: u8 = 0x77;
/// MPU-6500 family accelerometer Y offset, high byte
pub const YA_OFFSET_H_6500: u8 = 0x7A;
/// MPU-6500 family accelerometer Z offset, high byte
pub const ZA_OFFSET_H_6500: u8 = 0x7D;

// ==================== BITS AND FIELDS ====================

/// `XG_OFFS_TC` OTP bank valid flag
pub const TC_OTP_BNK_VLD_BIT: u8 = 0;

/// `CONFIG` external frame sync
pub const CFG_EXT_SYNC_SET: BitField = BitField::new(CONFIG, 5, 3);
/// `CONFIG` digital low-pass filter
pub const CFG_DLPF_CFG: BitField = BitField::new(CONFIG, 2, 3);
/// `GYRO_CONFIG` full-scale select
pub const GCONFIG_FS_SEL: BitField = BitField::new(GYRO_CONFIG, 4, 2);
/// `ACCEL_CONFIG` full-scale select
pub const ACONFIG_AFS_SEL: BitField = BitField::new(ACCEL_CONFIG, 4, 2);
/// `ACCEL_CONFIG` digital high-pass filter
pub const ACONFIG_ACCEL_HPF: BitField = BitField::new(ACCEL_CONFIG, 2, 3);
/// `MOT_DETECT_CTRL` accelerometer power-on delay
pub const DETECT_ACCEL_ON_DELAY: BitField = BitField::new(MOT_DETECT_CTRL, 5, 2);
/// `MOT_DETECT_CTRL` motion counter decrement
pub const DETECT_MOT_COUNT: BitField = BitField::new(MOT_DETECT_CTRL, 1, 2);
/// `PWR_MGMT_1` clock source select
pub const PWR1_CLKSEL: BitField = BitField::new(PWR_MGMT_1, 2, 3);
/// `WHO_AM_I` device id (bits 6..1)
pub const WHO_AM_I_DEVICE_ID: BitField = BitField::new(WHO_AM_I, 6, 6);
/// `USER_CTRL` FIFO, I2C master and signal-path resets as one field
pub const USERCTRL_RESETS: BitField = BitField::new(USER_CTRL, 2, 3);

/// `PWR_MGMT_1` bits
pub mod pwr1 {
    /// Device reset
    pub const DEVICE_RESET_BIT: u8 = 7;
    /// Sleep mode
    pub const SLEEP_BIT: u8 = 6;
    /// Wake cycle
    pub const CYCLE_BIT: u8 = 5;
    /// Temperature sensor disable
    pub const TEMP_DIS_BIT: u8 = 3;
}

/// `USER_CTRL` bits
pub mod user_ctrl {
    /// DMP enable
    pub const DMP_EN_BIT: u8 = 7;
    /// FIFO enable
    pub const FIFO_EN_BIT: u8 = 6;
    /// Auxiliary I2C master enable
    pub const I2C_MST_EN_BIT: u8 = 5;
    /// Disable the primary I2C interface
    pub const I2C_IF_DIS_BIT: u8 = 4;
    /// DMP reset
    pub const DMP_RESET_BIT: u8 = 3;
    /// FIFO reset
    pub const FIFO_RESET_BIT: u8 = 2;
    /// Auxiliary I2C master reset
    pub const I2C_MST_RESET_BIT: u8 = 1;
    /// Signal condition reset
    pub const SIG_COND_RESET_BIT: u8 = 0;
}

/// `INT_ENABLE` / `INT_STATUS` bits
pub mod interrupt {
    /// Free fall
    pub const FF_BIT: u8 = 7;
    /// Motion detection
    pub const MOT_BIT: u8 = 6;
    /// Zero-motion detection
    pub const ZMOT_BIT: u8 = 5;
    /// FIFO overflow
    pub const FIFO_OFLOW_BIT: u8 = 4;
    /// Auxiliary I2C master
    pub const I2C_MST_INT_BIT: u8 = 3;
    /// PLL ready
    pub const PLL_RDY_INT_BIT: u8 = 2;
    /// DMP output ready
    pub const DMP_INT_BIT: u8 = 1;
    /// Raw data ready
    pub const DATA_RDY_BIT: u8 = 0;
}

/// `INT_PIN_CFG` bits
pub mod int_pin_cfg {
    /// INT pin active low
    pub const INT_LEVEL_BIT: u8 = 7;
    /// INT pin open drain
    pub const INT_OPEN_BIT: u8 = 6;
    /// Latch INT pin until cleared
    pub const LATCH_INT_EN_BIT: u8 = 5;
    /// Clear interrupt status on any read
    pub const INT_RD_CLEAR_BIT: u8 = 4;
}
