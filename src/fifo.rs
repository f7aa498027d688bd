//! FIFO packet draining
//!
//! The DMP writes fixed-size packets into the device FIFO with no framing, so
//! packet boundaries exist only at multiples of the packet size. The drain
//! below always returns one whole packet, and when several are queued it
//! throws away the older ones so the caller sees the freshest sample.
//!
//! ## Behaviour per observed FIFO count `c` (packet size `P`)
//!
//! - `c == P`: read the packet.
//! - `c > P`: discard `(c / P - 1) * P` bytes in reads of at most five
//!   packets, then read one packet. The count may have grown while
//!   discarding, so this is the freshest packet as of the last count read.
//! - `c == 0`: back off and poll again until the wait window is used up.
//! - `0 < c < P`: a packet is still arriving or the packet size does not
//!   match the firmware. Poll again without consuming; give up with
//!   [`Error::MisalignedFifo`] after too many consecutive polls, or with
//!   [`Error::Timeout`] once the wait window is used up.
//!
//! There is no clock. Elapsed time is the backoff actually slept plus
//! [`FifoDrainConfig::poll_cost_us`] for every count read.

use core::cmp::Ordering;

use device_driver::RegisterInterface;
use embedded_hal::delay::DelayNs;

use crate::Error;
use crate::bus::RegisterBus;
use crate::dmp::DMP_PACKET_SIZE;
use crate::registers;

/// Largest packet size the drain accepts
pub const MAX_PACKET_SIZE: usize = 64;

/// Upper bound on packets discarded per bus transaction
///
/// Long reads at low bus clocks can trip the host's I2C timeout.
pub const MAX_DISCARD_PACKETS: usize = 5;

/// Size of the FIFO on the device in bytes
pub const FIFO_SIZE: u16 = 1024;

/// FIFO drain configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoDrainConfig {
    /// Packet size in bytes (1..=[`MAX_PACKET_SIZE`])
    pub packet_size: usize,
    /// How long to wait for data while the FIFO is empty (ms)
    pub max_wait_ms: u32,
    /// Sleep between polls of an empty FIFO (µs, non-zero)
    pub backoff_us: u32,
    /// Consecutive partial-packet polls tolerated before failing (0 = no limit)
    pub max_partial_polls: u32,
    /// Bus time charged against the wait window for each FIFO count read (µs)
    ///
    /// A count read is a 4-byte write-read, about 100 µs at 400 kHz and
    /// 400 µs at 100 kHz. With zero, only backoff sleeps are counted and
    /// mid-packet polls never time out.
    pub poll_cost_us: u32,
}

impl Default for FifoDrainConfig {
    fn default() -> Self {
        Self::dmp()
    }
}

impl FifoDrainConfig {
    /// Settings for the 28-byte DMP quaternion packets
    pub const fn dmp() -> Self {
        Self {
            packet_size: DMP_PACKET_SIZE,
            max_wait_ms: 50,
            backoff_us: 500,
            max_partial_polls: 100,
            poll_cost_us: 100,
        }
    }

    /// Set the packet size in bytes
    pub const fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size;
        self
    }

    /// Set the wait window for an empty FIFO in milliseconds
    pub const fn with_max_wait_ms(mut self, max_wait_ms: u32) -> Self {
        self.max_wait_ms = max_wait_ms;
        self
    }

    /// Set the backoff between empty polls in microseconds
    pub const fn with_backoff_us(mut self, backoff_us: u32) -> Self {
        self.backoff_us = backoff_us;
        self
    }

    /// Set how many consecutive partial-packet polls are tolerated
    pub const fn with_max_partial_polls(mut self, max_partial_polls: u32) -> Self {
        self.max_partial_polls = max_partial_polls;
        self
    }

    /// Set the bus time charged per FIFO count read in microseconds
    pub const fn with_poll_cost_us(mut self, poll_cost_us: u32) -> Self {
        self.poll_cost_us = poll_cost_us;
        self
    }

    const fn is_valid(&self) -> bool {
        self.packet_size > 0 && self.packet_size <= MAX_PACKET_SIZE && self.backoff_us > 0
    }
}

/// Read the number of bytes currently queued in the FIFO
///
/// # Errors
///
/// Returns [`Error::Bus`] if the transaction fails.
pub fn fifo_count<I>(bus: &mut RegisterBus<I>) -> Result<u16, Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    bus.read_u16(registers::FIFO_COUNTH)
}

/// Dequeue `buffer.len()` bytes from the FIFO in one transaction
///
/// # Errors
///
/// Returns [`Error::Bus`] if the transaction fails.
pub fn read_fifo_bytes<I>(bus: &mut RegisterBus<I>, buffer: &mut [u8]) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    bus.read_bytes(registers::FIFO_R_W, buffer)
}

/// Drain exactly one packet from the FIFO into `packet`
///
/// `packet.len()` must equal `config.packet_size`. See the module
/// documentation for how backlog and partial packets are handled.
///
/// The wait window starts at the call. Each count read charges
/// `poll_cost_us` and each empty poll sleeps `backoff_us`, so a timeout is
/// reported once the charged time exceeds `max_wait_ms`, at most one backoff
/// slice and one poll later.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if the configuration or buffer size is wrong
/// - [`Error::Timeout`] if no whole packet showed up within the window
/// - [`Error::MisalignedFifo`] if the partial-packet limit was exceeded
/// - [`Error::Bus`] if any transaction fails
pub fn drain_one_packet<I, D>(
    bus: &mut RegisterBus<I>,
    delay: &mut D,
    config: &FifoDrainConfig,
    packet: &mut [u8],
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
    D: DelayNs,
{
    if !config.is_valid() || packet.len() != config.packet_size {
        return Err(Error::InvalidConfig);
    }

    #[allow(clippy::cast_possible_truncation)]
    let packet_size = config.packet_size as u16;
    let window_us = config.max_wait_ms.saturating_mul(1000);
    let mut waited_us: u32 = 0;
    let mut partial_polls: u32 = 0;

    loop {
        let count = fifo_count(bus)?;
        waited_us = waited_us.saturating_add(config.poll_cost_us);

        match count.cmp(&packet_size) {
            Ordering::Equal => {
                read_fifo_bytes(bus, packet)?;
                return Ok(());
            }
            Ordering::Greater => {
                let extra = usize::from(count / packet_size - 1) * config.packet_size;
                if extra > 0 {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("FIFO backlog {}: discarding {} bytes", count, extra);
                    discard(bus, extra, config.packet_size)?;
                }
                read_fifo_bytes(bus, packet)?;
                return Ok(());
            }
            Ordering::Less if count == 0 => {
                partial_polls = 0;
                if waited_us > window_us {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("FIFO empty for {} us, giving up", waited_us);
                    return Err(Error::Timeout);
                }
                delay.delay_us(config.backoff_us);
                waited_us = waited_us.saturating_add(config.backoff_us);
            }
            Ordering::Less => {
                partial_polls += 1;
                if config.max_partial_polls != 0 && partial_polls > config.max_partial_polls {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "FIFO count {} stuck below packet size {} for {} polls",
                        count,
                        packet_size,
                        partial_polls
                    );
                    return Err(Error::MisalignedFifo { count });
                }
                if waited_us > window_us {
                    #[cfg(feature = "defmt")]
                    defmt::debug!(
                        "FIFO stuck at {} bytes for {} us, giving up",
                        count,
                        waited_us
                    );
                    return Err(Error::Timeout);
                }
            }
        }
    }
}

/// Throw away `len` bytes of FIFO backlog, at most five packets per read
fn discard<I>(
    bus: &mut RegisterBus<I>,
    mut len: usize,
    packet_size: usize,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    let mut scratch = [0u8; MAX_PACKET_SIZE * MAX_DISCARD_PACKETS];
    let limit = packet_size * MAX_DISCARD_PACKETS;

    while len > limit {
        read_fifo_bytes(bus, &mut scratch[..limit])?;
        len -= limit;
    }
    read_fifo_bytes(bus, &mut scratch[..len])
}
