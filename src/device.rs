//! High-level driver API for the MPU-6050
//!
//! [`Mpu6050`] owns a [`RegisterBus`] and maps every sensor setting onto a
//! bit, field, byte or word operation. The chip variant is resolved once at
//! construction and only decides where the accelerometer offsets live.

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;

use crate::Error;
use crate::bus::RegisterBus;
use crate::config::{
    AccelFullScale, Axis, ClockSource, DeviceVariant, DhpfMode, DlpfMode, ExternalSync,
    GyroFullScale,
};
use crate::dmp::{
    DMP_PACKET_SIZE, DMP_START_ADDRESS, DmpConfig, DmpFirmware, MemoryCursor, QuaternionRaw,
    RESET_SETTLE_MS, load_image, packet::QUATERNION_MIN_PACKET_SIZE,
};
use crate::fifo::{self, FifoDrainConfig, MAX_PACKET_SIZE};
use crate::registers::{self, int_pin_cfg, interrupt, pwr1, user_ctrl};

/// Number of auxiliary I2C slave channels with an address register
const SLAVE_COUNT: u8 = 4;

/// Register stride between consecutive slave channels
const SLAVE_STRIDE: u8 = 3;

/// Temperature sensitivity (LSB/°C) and offset (°C)
const TEMP_SENSITIVITY: f32 = 340.0;
const TEMP_OFFSET: f32 = 36.53;

/// Main driver for the MPU-6050
pub struct Mpu6050<I> {
    bus: RegisterBus<I>,
    variant: DeviceVariant,
    dmp_config: DmpConfig,
}

impl<I> Mpu6050<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new driver instance
    ///
    /// Reads `WHO_AM_I` and resolves the chip variant, but does not touch any
    /// configuration. Call [`init`](Self::init) for plain sensor use or
    /// [`dmp_initialize`](Self::dmp_initialize) for the DMP.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The `WHO_AM_I` device id is not a known variant
    ///   ([`Error::InvalidDevice`] carries the raw register value)
    pub fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut bus = RegisterBus::new(interface);

        let who_am_i = bus.read_byte(registers::WHO_AM_I)?;
        let id = registers::WHO_AM_I_DEVICE_ID.extract(who_am_i);
        let variant = DeviceVariant::from_device_id(id).ok_or(Error::InvalidDevice(who_am_i))?;

        #[cfg(feature = "defmt")]
        defmt::debug!("WHO_AM_I = {:#x}, variant {}", who_am_i, variant);

        Ok(Self {
            bus,
            variant,
            dmp_config: DmpConfig::default(),
        })
    }

    /// Use `config` for the next [`dmp_initialize`](Self::dmp_initialize)
    #[must_use]
    pub fn with_dmp_config(mut self, config: DmpConfig) -> Self {
        self.dmp_config = config;
        self
    }

    /// Replace the DMP configuration
    pub fn set_dmp_config(&mut self, config: DmpConfig) {
        self.dmp_config = config;
    }

    /// Current DMP configuration
    pub const fn dmp_config(&self) -> &DmpConfig {
        &self.dmp_config
    }

    /// Chip variant detected at construction
    pub const fn variant(&self) -> DeviceVariant {
        self.variant
    }

    /// Consume the driver and return the underlying interface
    pub fn release(self) -> I {
        self.bus.release()
    }

    /// Get a mutable reference to the register bus (for advanced usage)
    pub fn bus_mut(&mut self) -> &mut RegisterBus<I> {
        &mut self.bus
    }

    /// Wake the device with default settings
    ///
    /// Clears `PWR_MGMT_1`, then selects the X gyro PLL clock, ±250 °/s,
    /// ±2 g and clears the sleep bit.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn init(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::PWR_MGMT_1, 0x00)?;
        self.set_clock_source(ClockSource::PllXGyro)?;
        self.set_full_scale_gyro_range(GyroFullScale::Dps250)?;
        self.set_full_scale_accel_range(AccelFullScale::G2)?;
        self.set_sleep_enabled(false)
    }

    // Identity

    /// Read the raw `WHO_AM_I` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn who_am_i(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::WHO_AM_I)
    }

    /// Read the six-bit device id (0x34 on an MPU-6050)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn device_id(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_field(registers::WHO_AM_I_DEVICE_ID)
    }

    // Power and clock

    /// Select the clock source
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_clock_source(&mut self, source: ClockSource) -> Result<(), Error<I::Error>> {
        self.bus.write_field(registers::PWR1_CLKSEL, source as u8)
    }

    /// Read the clock source
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the reserved value 6 is set, or an
    /// error if communication with the device fails.
    pub fn clock_source(&mut self) -> Result<ClockSource, Error<I::Error>> {
        let bits = self.bus.read_field(registers::PWR1_CLKSEL)?;
        ClockSource::from_bits(bits).ok_or(Error::InvalidConfig)
    }

    /// Set sleep mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_sleep_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::PWR_MGMT_1, pwr1::SLEEP_BIT, enabled)
    }

    /// Check whether sleep mode is set
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn sleep_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_bit(registers::PWR_MGMT_1, pwr1::SLEEP_BIT)
    }

    /// Enable/disable cycling between sleep and single samples
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_wake_cycle_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::PWR_MGMT_1, pwr1::CYCLE_BIT, enabled)
    }

    /// Trigger a full device reset
    ///
    /// All registers return to their power-on values. Wait at least
    /// [`RESET_SETTLE_MS`] before talking to the device again.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::PWR_MGMT_1, pwr1::DEVICE_RESET_BIT, true)
    }

    // Ranges

    /// Set the gyroscope full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_full_scale_gyro_range(&mut self, range: GyroFullScale) -> Result<(), Error<I::Error>> {
        self.bus.write_field(registers::GCONFIG_FS_SEL, range as u8)
    }

    /// Read the gyroscope full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn full_scale_gyro_range(&mut self) -> Result<GyroFullScale, Error<I::Error>> {
        let bits = self.bus.read_field(registers::GCONFIG_FS_SEL)?;
        Ok(GyroFullScale::from_bits(bits))
    }

    /// Set the accelerometer full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_full_scale_accel_range(
        &mut self,
        range: AccelFullScale,
    ) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(registers::ACONFIG_AFS_SEL, range as u8)
    }

    /// Read the accelerometer full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn full_scale_accel_range(&mut self) -> Result<AccelFullScale, Error<I::Error>> {
        let bits = self.bus.read_field(registers::ACONFIG_AFS_SEL)?;
        Ok(AccelFullScale::from_bits(bits))
    }

    // Filters and sample rate

    /// Set the digital low-pass filter
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dlpf_mode(&mut self, mode: DlpfMode) -> Result<(), Error<I::Error>> {
        self.bus.write_field(registers::CFG_DLPF_CFG, mode as u8)
    }

    /// Read the digital low-pass filter
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for the reserved value 7, or an error
    /// if communication with the device fails.
    pub fn dlpf_mode(&mut self) -> Result<DlpfMode, Error<I::Error>> {
        let bits = self.bus.read_field(registers::CFG_DLPF_CFG)?;
        DlpfMode::from_bits(bits).ok_or(Error::InvalidConfig)
    }

    /// Set the accelerometer high-pass filter
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dhpf_mode(&mut self, mode: DhpfMode) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(registers::ACONFIG_ACCEL_HPF, mode as u8)
    }

    /// Read the accelerometer high-pass filter
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a reserved value, or an error if
    /// communication with the device fails.
    pub fn dhpf_mode(&mut self) -> Result<DhpfMode, Error<I::Error>> {
        let bits = self.bus.read_field(registers::ACONFIG_ACCEL_HPF)?;
        DhpfMode::from_bits(bits).ok_or(Error::InvalidConfig)
    }

    /// Set the sample rate divider
    ///
    /// Sample rate = gyro output rate / (1 + `divider`), where the gyro output
    /// rate is 1 kHz with the DLPF on and 8 kHz with it off.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_rate(&mut self, divider: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::SMPLRT_DIV, divider)
    }

    /// Read the sample rate divider
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn rate(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::SMPLRT_DIV)
    }

    /// Route the FSYNC pin into a sample register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_external_frame_sync(&mut self, sync: ExternalSync) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(registers::CFG_EXT_SYNC_SET, sync as u8)
    }

    // Interrupts

    /// Write the whole `INT_ENABLE` register
    ///
    /// `mask` is a combination of the [`interrupt`] bit positions.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_int_enabled(&mut self, mask: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::INT_ENABLE, mask)
    }

    /// Read the whole `INT_ENABLE` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn int_enabled(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::INT_ENABLE)
    }

    /// Read `INT_STATUS` (clears the latched flags on the device)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn int_status(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::INT_STATUS)
    }

    /// Enable/disable the data ready interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_int_data_ready_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::INT_ENABLE, interrupt::DATA_RDY_BIT, enabled)
    }

    /// Check whether the data ready interrupt is enabled
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn int_data_ready_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus
            .read_bit(registers::INT_ENABLE, interrupt::DATA_RDY_BIT)
    }

    /// Check the data ready interrupt flag
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn int_data_ready_status(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus
            .read_bit(registers::INT_STATUS, interrupt::DATA_RDY_BIT)
    }

    /// Enable/disable the motion detection interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_int_motion_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::INT_ENABLE, interrupt::MOT_BIT, enabled)
    }

    /// Check whether the motion detection interrupt is enabled
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn int_motion_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_bit(registers::INT_ENABLE, interrupt::MOT_BIT)
    }

    /// Enable/disable the zero-motion interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_int_zero_motion_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::INT_ENABLE, interrupt::ZMOT_BIT, enabled)
    }

    /// Check whether the zero-motion interrupt is enabled
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn int_zero_motion_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus
            .read_bit(registers::INT_ENABLE, interrupt::ZMOT_BIT)
    }

    /// Configure the INT pin
    ///
    /// # Arguments
    ///
    /// * `active_low` - Pin is driven low while an interrupt is pending
    /// * `open_drain` - Open drain instead of push-pull output
    /// * `latch` - Hold the pin until cleared instead of a 50 µs pulse
    /// * `clear_on_any_read` - Clear on any register read instead of only
    ///   `INT_STATUS` reads
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_int_pin_config(
        &mut self,
        active_low: bool,
        open_drain: bool,
        latch: bool,
        clear_on_any_read: bool,
    ) -> Result<(), Error<I::Error>> {
        let reg = registers::INT_PIN_CFG;
        self.bus
            .write_bit(reg, int_pin_cfg::INT_LEVEL_BIT, active_low)?;
        self.bus
            .write_bit(reg, int_pin_cfg::INT_OPEN_BIT, open_drain)?;
        self.bus
            .write_bit(reg, int_pin_cfg::LATCH_INT_EN_BIT, latch)?;
        self.bus
            .write_bit(reg, int_pin_cfg::INT_RD_CLEAR_BIT, clear_on_any_read)
    }

    // Motion detection

    /// Set the motion detection threshold (1 LSB = 2 mg)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_motion_detection_threshold(&mut self, threshold: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::MOT_THR, threshold)
    }

    /// Read the motion detection threshold
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn motion_detection_threshold(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::MOT_THR)
    }

    /// Set the motion detection duration (1 LSB = 1 ms)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_motion_detection_duration(&mut self, duration: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::MOT_DUR, duration)
    }

    /// Read the motion detection duration
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn motion_detection_duration(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::MOT_DUR)
    }

    /// Set the zero-motion detection threshold
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_zero_motion_detection_threshold(
        &mut self,
        threshold: u8,
    ) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::ZRMOT_THR, threshold)
    }

    /// Read the zero-motion detection threshold
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn zero_motion_detection_threshold(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::ZRMOT_THR)
    }

    /// Set the zero-motion detection duration (1 LSB = 64 ms)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_zero_motion_detection_duration(
        &mut self,
        duration: u8,
    ) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(registers::ZRMOT_DUR, duration)
    }

    /// Read the zero-motion detection duration
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn zero_motion_detection_duration(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(registers::ZRMOT_DUR)
    }

    /// Set the motion detection counter decrement rate (0-3)
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] for values above 3 (nothing is
    /// written), or an error if communication with the device fails.
    pub fn set_motion_detection_counter_decrement(
        &mut self,
        decrement: u8,
    ) -> Result<(), Error<I::Error>> {
        self.bus.write_field(registers::DETECT_MOT_COUNT, decrement)
    }

    /// Read the motion detection counter decrement rate
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn motion_detection_counter_decrement(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_field(registers::DETECT_MOT_COUNT)
    }

    /// Set the extra accelerometer power-on delay (0-3 ms)
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] for values above 3 (nothing is
    /// written), or an error if communication with the device fails.
    pub fn set_accelerometer_power_on_delay(&mut self, delay: u8) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(registers::DETECT_ACCEL_ON_DELAY, delay)
    }

    /// Read the extra accelerometer power-on delay
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn accelerometer_power_on_delay(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_field(registers::DETECT_ACCEL_ON_DELAY)
    }

    // Offsets

    /// Write an accelerometer offset
    ///
    /// The register address depends on the detected [`DeviceVariant`].
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_accel_offset(&mut self, axis: Axis, offset: i16) -> Result<(), Error<I::Error>> {
        let address = self.variant.accel_offset_registers()[axis as usize];
        self.bus.write_word(address, offset)
    }

    /// Read an accelerometer offset
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn accel_offset(&mut self, axis: Axis) -> Result<i16, Error<I::Error>> {
        let address = self.variant.accel_offset_registers()[axis as usize];
        self.bus.read_word(address)
    }

    /// Write a gyroscope offset
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_gyro_offset(&mut self, axis: Axis, offset: i16) -> Result<(), Error<I::Error>> {
        self.bus.write_word(gyro_offset_register(axis), offset)
    }

    /// Read a gyroscope offset
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn gyro_offset(&mut self, axis: Axis) -> Result<i16, Error<I::Error>> {
        self.bus.read_word(gyro_offset_register(axis))
    }

    // Raw data

    /// Read accelerometer data
    ///
    /// Returns raw 16-bit values for X, Y, Z from one 6-byte burst read, so
    /// the three axes always come from the same sample.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn acceleration(&mut self) -> Result<[i16; 3], Error<I::Error>> {
        self.read_triple(registers::ACCEL_XOUT_H)
    }

    /// Read gyroscope data
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn rotation(&mut self) -> Result<[i16; 3], Error<I::Error>> {
        self.read_triple(registers::GYRO_XOUT_H)
    }

    /// Read the raw temperature
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn temperature_raw(&mut self) -> Result<i16, Error<I::Error>> {
        self.bus.read_word(registers::TEMP_OUT_H)
    }

    /// Read the temperature in degrees Celsius
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn temperature_celsius(&mut self) -> Result<f32, Error<I::Error>> {
        let raw = self.temperature_raw()?;
        Ok(f32::from(raw) / TEMP_SENSITIVITY + TEMP_OFFSET)
    }

    fn read_triple(&mut self, address: u8) -> Result<[i16; 3], Error<I::Error>> {
        let mut buffer = [0u8; 6];
        self.bus.read_bytes(address, &mut buffer)?;
        Ok([
            i16::from_be_bytes([buffer[0], buffer[1]]),
            i16::from_be_bytes([buffer[2], buffer[3]]),
            i16::from_be_bytes([buffer[4], buffer[5]]),
        ])
    }

    // FIFO and DMP

    /// Read the FIFO count (number of bytes available)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fifo_count(&mut self) -> Result<u16, Error<I::Error>> {
        fifo::fifo_count(&mut self.bus)
    }

    /// Read raw bytes from the FIFO
    ///
    /// No check is made against the FIFO count; reading more than is
    /// buffered returns stale data on real hardware.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_fifo_bytes(&mut self, buffer: &mut [u8]) -> Result<(), Error<I::Error>> {
        fifo::read_fifo_bytes(&mut self.bus, buffer)
    }

    /// Reset the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::USER_CTRL, user_ctrl::FIFO_RESET_BIT, true)
    }

    /// Reset the DMP
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::USER_CTRL, user_ctrl::DMP_RESET_BIT, true)
    }

    /// Enable/disable FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_fifo_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::USER_CTRL, user_ctrl::FIFO_EN_BIT, enabled)
    }

    /// Enable/disable DMP
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dmp_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::USER_CTRL, user_ctrl::DMP_EN_BIT, enabled)
    }

    /// Check whether the DMP is running
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus
            .read_bit(registers::USER_CTRL, user_ctrl::DMP_EN_BIT)
    }

    /// Enable/disable the DMP interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dmp_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::INT_ENABLE, interrupt::DMP_INT_BIT, enabled)
    }

    /// Check whether at least one DMP packet is buffered
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_packet_available(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(usize::from(self.fifo_count()?) >= DMP_PACKET_SIZE)
    }

    /// Read the newest complete packet from the FIFO
    ///
    /// Stale packets are discarded so the returned packet is the most recent
    /// one. See [`fifo::drain_one_packet`] for the algorithm.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if no packet arrives within the wait window
    /// - [`Error::MisalignedFifo`] if the count stays mid-packet for too long
    /// - [`Error::InvalidConfig`] if `packet` does not match the configured
    ///   packet size
    /// - [`Error::Bus`] if communication with the device fails
    pub fn read_dmp_packet<D>(
        &mut self,
        delay: &mut D,
        config: &FifoDrainConfig,
        packet: &mut [u8],
    ) -> Result<(), Error<I::Error>>
    where
        D: DelayNs,
    {
        fifo::drain_one_packet(&mut self.bus, delay, config, packet)
    }

    /// Read the newest packet and extract its quaternion
    ///
    /// # Errors
    ///
    /// Same as [`read_dmp_packet`](Self::read_dmp_packet); additionally
    /// [`Error::InvalidConfig`] if the configured packet is too short to
    /// carry a quaternion. That is checked before the FIFO is touched.
    pub fn read_dmp_quaternion<D>(
        &mut self,
        delay: &mut D,
        config: &FifoDrainConfig,
    ) -> Result<QuaternionRaw, Error<I::Error>>
    where
        D: DelayNs,
    {
        if config.packet_size < QUATERNION_MIN_PACKET_SIZE {
            return Err(Error::InvalidConfig);
        }
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let packet = buffer
            .get_mut(..config.packet_size).ok_or(Error::InvalidConfig)?;
        self.read_dmp_packet(delay, config, packet)?;
        QuaternionRaw::from_packet(packet).ok_or(Error::InvalidConfig)
    }

    /// Initialize the DMP
    ///
    /// Resets the device, configures it for the MotionApps 6.12 firmware,
    /// uploads and verifies `image`, and leaves the DMP **disabled** with the
    /// FIFO enabled and the DMP interrupt armed. Call
    /// [`set_dmp_enabled(true)`](Self::set_dmp_enabled) to start it.
    ///
    /// Settings come from the driver's [`DmpConfig`] (see
    /// [`with_dmp_config`](Self::with_dmp_config)). The sequence blocks for
    /// two [`RESET_SETTLE_MS`] settle delays.
    ///
    /// # Errors
    ///
    /// - [`Error::CorruptFirmwareImage`] if `image` has the wrong length
    ///   (checked before any bus activity)
    /// - [`Error::VerificationMismatch`] if a firmware chunk reads back wrong;
    ///   initialization stops there
    /// - [`Error::Bus`] if communication with the device fails
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut mpu = Mpu6050::new(I2cInterface::default(i2c))?;
    /// mpu.dmp_initialize(DMP_IMAGE, &mut delay)?;
    /// mpu.set_dmp_enabled(true)?;
    /// ```
    pub fn dmp_initialize<D>(&mut self, image: &[u8], delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: DelayNs,
    {
        let firmware =
            DmpFirmware::new(image).ok_or(Error::CorruptFirmwareImage { len: image.len() })?;
        let config = self.dmp_config;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP init: resetting device");

        self.reset()?;
        delay.delay_ms(RESET_SETTLE_MS);

        // FIFO, I2C master and signal path resets in one write
        self.bus.write_field(registers::USERCTRL_RESETS, 0b111)?;
        delay.delay_ms(RESET_SETTLE_MS);

        let pll = ClockSource::PllXGyro as u8;
        self.bus.write_byte(registers::PWR_MGMT_1, pll)?;
        self.bus.write_byte(registers::INT_ENABLE, 0x00)?;
        self.bus.write_byte(registers::FIFO_EN, 0x00)?;
        self.bus
            .write_byte(registers::ACCEL_CONFIG, AccelFullScale::G2.config_byte())?;
        self.bus
            .write_byte(registers::INT_PIN_CFG, 1 << int_pin_cfg::INT_LEVEL_BIT)?;
        self.bus.write_byte(registers::PWR_MGMT_1, pll)?;
        self.bus
            .write_byte(registers::SMPLRT_DIV, config.sample_rate_div)?;
        self.bus.write_byte(registers::CONFIG, config.dlpf as u8)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP init: loading {} byte firmware", image.len());

        load_image(&mut self.bus, firmware.as_bytes(), MemoryCursor::START, true)?;

        self.bus
            .write_bytes(registers::DMP_CFG_1, &DMP_START_ADDRESS.to_be_bytes())?;
        self.bus
            .write_byte(registers::GYRO_CONFIG, config.gyro_range.config_byte())?;
        self.bus.write_byte(
            registers::USER_CTRL,
            (1 << user_ctrl::FIFO_EN_BIT) | (1 << user_ctrl::FIFO_RESET_BIT),
        )?;
        self.bus
            .write_byte(registers::INT_ENABLE, 1 << interrupt::DMP_INT_BIT)?;
        self.reset_fifo()?;
        self.set_dmp_enabled(false)?;
        self.set_rate(config.output_rate_div)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP init complete (DMP disabled)");

        Ok(())
    }

    // Auxiliary I2C

    /// Reset the auxiliary I2C master
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_i2c_master(&mut self) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::USER_CTRL, user_ctrl::I2C_MST_RESET_BIT, true)
    }

    /// Enable/disable the auxiliary I2C master
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_i2c_master_mode_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::USER_CTRL, user_ctrl::I2C_MST_EN_BIT, enabled)
    }

    /// Set the address of auxiliary slave `num` (0-3)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for `num > 3`, or an error if
    /// communication with the device fails.
    pub fn set_slave_address(&mut self, num: u8, address: u8) -> Result<(), Error<I::Error>> {
        if num >= SLAVE_COUNT {
            return Err(Error::InvalidConfig);
        }
        self.bus
            .write_byte(registers::I2C_SLV0_ADDR + num * SLAVE_STRIDE, address)
    }

    // OTP

    /// Read the OTP bank valid flag
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn otp_bank_valid(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus
            .read_bit(registers::XG_OFFS_TC, registers::TC_OTP_BNK_VLD_BIT)
    }

    /// Set the OTP bank valid flag
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_otp_bank_valid(&mut self, valid: bool) -> Result<(), Error<I::Error>> {
        self.bus
            .write_bit(registers::XG_OFFS_TC, registers::TC_OTP_BNK_VLD_BIT, valid)
    }
}

const fn gyro_offset_register(axis: Axis) -> u8 {
    match axis {
        Axis::X => registers::XG_OFFS_USRH,
        Axis::Y => registers::YG_OFFS_USRH,
        Axis::Z => registers::ZG_OFFS_USRH,
    }
}
