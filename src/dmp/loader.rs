//! DMP Firmware Loader
//!
//! The DMP's memory is reached through three registers:
//! - `BANK_SEL` (0x6D): Selects the memory bank (256-byte pages)
//! - `MEM_START_ADDR` (0x6E): Sets the start address within the current bank
//! - `MEM_R_W` (0x6F): Data port; the address auto-increments per byte
//!
//! Images are written in chunks of at most [`DMP_CHUNK_SIZE`] bytes that
//! never cross a bank boundary. Bank and address are selected again before
//! every chunk and before every readback, since the previous access leaves
//! the device's internal pointer wherever it stopped.

use device_driver::RegisterInterface;

use crate::Error;
use crate::bus::RegisterBus;
use crate::dmp::{DMP_BANK_SIZE, DMP_CHUNK_SIZE, DMP_MEMORY_BANKS};
use crate::registers::{BANK_SEL, MEM_R_W, MEM_START_ADDR};

/// Bits of `BANK_SEL` that carry the bank number
const BANK_SEL_MASK: u8 = 0x1F;

/// `BANK_SEL` prefetch enable bit
const BANK_SEL_PREFETCH: u8 = 0x40;

/// `BANK_SEL` user bank bit
const BANK_SEL_USER_BANK: u8 = 0x20;

/// Flags sent along with the bank number in `BANK_SEL`
///
/// The firmware loader always selects plain banks; the flags are only useful
/// for inspecting memory with [`read_memory_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankFlags {
    /// Enable prefetch
    pub prefetch: bool,
    /// Select the user bank
    pub user_bank: bool,
}

impl BankFlags {
    /// `BANK_SEL` value selecting `bank` with these flags
    pub const fn bank_select(self, bank: u8) -> u8 {
        let mut value = bank & BANK_SEL_MASK;
        if self.prefetch {
            value |= BANK_SEL_PREFETCH;
        }
        if self.user_bank {
            value |= BANK_SEL_USER_BANK;
        }
        value
    }
}

/// Position in DMP memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryCursor {
    bank: u8,
    address: u8,
}

impl MemoryCursor {
    /// Start of DMP memory (bank 0, address 0)
    pub const START: Self = Self {
        bank: 0,
        address: 0,
    };

    /// Create a cursor, returning `None` for a bank past the last one
    pub const fn new(bank: u8, address: u8) -> Option<Self> {
        if (bank as usize) < DMP_MEMORY_BANKS {
            Some(Self { bank, address })
        } else {
            None
        }
    }

    /// Memory bank
    pub const fn bank(&self) -> u8 {
        self.bank
    }

    /// Address within the bank
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Absolute byte offset into DMP memory
    pub const fn offset(&self) -> usize {
        self.bank as usize * DMP_BANK_SIZE + self.address as usize
    }

    /// Bytes left in the current bank
    pub const fn bank_remaining(&self) -> usize {
        DMP_BANK_SIZE - self.address as usize
    }

    /// Bytes left between the cursor and the end of DMP memory
    pub const fn memory_remaining(&self) -> usize {
        DMP_MEMORY_BANKS * DMP_BANK_SIZE - self.offset()
    }

    /// Move forward by `len` bytes, wrapping into the next bank past 255
    ///
    /// `len` must not exceed [`bank_remaining`](Self::bank_remaining).
    #[must_use]
    pub const fn advance(self, len: usize) -> Self {
        let next = self.address as usize + len;
        if next >= DMP_BANK_SIZE {
            Self {
                bank: self.bank + 1,
                address: (next - DMP_BANK_SIZE) as u8,
            }
        } else {
            Self {
                bank: self.bank,
                address: next as u8,
            }
        }
    }
}

/// A firmware chunk whose readback differed from what was written
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkMismatch {
    /// Where the chunk starts
    pub cursor: MemoryCursor,
    len: u8,
    expected: [u8; DMP_CHUNK_SIZE],
    actual: [u8; DMP_CHUNK_SIZE],
}

impl ChunkMismatch {
    fn new(cursor: MemoryCursor, expected: &[u8], actual: &[u8]) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let len = expected.len() as u8;
        let mut mismatch = Self {
            cursor,
            len,
            expected: [0; DMP_CHUNK_SIZE],
            actual: [0; DMP_CHUNK_SIZE],
        };
        mismatch.expected[..expected.len()].copy_from_slice(expected);
        mismatch.actual[..actual.len()].copy_from_slice(actual);
        mismatch
    }

    /// Bytes that were written
    pub fn expected(&self) -> &[u8] {
        &self.expected[..usize::from(self.len)]
    }

    /// Bytes that were read back
    pub fn actual(&self) -> &[u8] {
        &self.actual[..usize::from(self.len)]
    }

    /// Offset of the first differing byte within the chunk
    pub fn first_difference(&self) -> Option<usize> {
        self.expected()
            .iter()
            .zip(self.actual()).position(|(expected, actual)| expected != actual)
    }
}

/// Point the DMP memory port at `cursor`
fn select<I>(
    bus: &mut RegisterBus<I>,
    cursor: MemoryCursor,
    flags: BankFlags,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    bus.write_byte(BANK_SEL, flags.bank_select(cursor.bank))?;
    bus.write_byte(MEM_START_ADDR, cursor.address)
}

/// Write `image` into DMP memory starting at `start`
///
/// Each chunk is `min(16, bytes left, bytes left in bank)` long and goes out
/// as one `MEM_R_W` transaction. With `verify`, every chunk is read back and
/// compared right after it is written; the first mismatch stops the load.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if the image does not fit between `start` and
///   the end of DMP memory (checked before any bus activity)
/// - [`Error::VerificationMismatch`] with the offending chunk's expected and
///   actual bytes; nothing after that chunk is written
/// - [`Error::Bus`] if any transaction fails
pub fn load_image<I>(
    bus: &mut RegisterBus<I>,
    image: &[u8],
    start: MemoryCursor,
    verify: bool,
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    if image.len() > start.memory_remaining() {
        return Err(Error::InvalidConfig);
    }

    let mut cursor = start;
    let mut written = 0;
    let mut readback = [0u8; DMP_CHUNK_SIZE];

    while written < image.len() {
        let chunk_size = DMP_CHUNK_SIZE
            .min(image.len() - written)
            .min(cursor.bank_remaining());
        let chunk = &image[written..written + chunk_size];

        select(bus, cursor, BankFlags::default())?;
        bus.write_bytes(MEM_R_W, chunk)?;

        if verify {
            select(bus, cursor, BankFlags::default())?;
            let readback = &mut readback[..chunk_size];
            bus.read_bytes(MEM_R_W, readback)?;

            if chunk != &readback[..] {
                let mismatch = ChunkMismatch::new(cursor, chunk, readback);
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "DMP chunk verification failed at bank {} address {}: expected {:02X}, got {:02X}",
                    cursor.bank,
                    cursor.address,
                    mismatch.expected(),
                    mismatch.actual()
                );
                return Err(Error::VerificationMismatch(mismatch));
            }
        }

        written += chunk_size;
        cursor = cursor.advance(chunk_size);
    }

    #[cfg(feature = "defmt")]
    defmt::debug!("Loaded {} bytes into DMP memory", image.len());

    Ok(())
}

/// Read DMP memory starting at `start`, one bank-bounded chunk at a time
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if the range runs past the end of DMP memory
/// - [`Error::Bus`] if any transaction fails
pub fn read_memory<I>(
    bus: &mut RegisterBus<I>,
    start: MemoryCursor,
    buffer: &mut [u8],
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    read_memory_with(bus, start, BankFlags::default(), buffer)
}

/// Like [`read_memory`], selecting every bank with `flags`
///
/// # Errors
///
/// Same as [`read_memory`].
pub fn read_memory_with<I>(
    bus: &mut RegisterBus<I>,
    start: MemoryCursor,
    flags: BankFlags,
    buffer: &mut [u8],
) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    if buffer.len() > start.memory_remaining() {
        return Err(Error::InvalidConfig);
    }

    let mut cursor = start;
    let mut done = 0;
    while done < buffer.len() {
        let chunk_size = DMP_CHUNK_SIZE
            .min(buffer.len() - done)
            .min(cursor.bank_remaining());
        select(bus, cursor, flags)?;
        bus.read_bytes(MEM_R_W, &mut buffer[done..done + chunk_size])?;
        done += chunk_size;
        cursor = cursor.advance(chunk_size);
    }

    Ok(())
}
