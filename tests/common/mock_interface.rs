//! Mock interface implementation for testing the MPU-6050 driver

use device_driver::RegisterInterface;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

const PWR_MGMT_1: u8 = 0x6B;
const USER_CTRL: u8 = 0x6A;
const BANK_SEL: u8 = 0x6D;
const MEM_START_ADDR: u8 = 0x6E;
const MEM_R_W: u8 = 0x6F;
const FIFO_COUNTH: u8 = 0x72;
const FIFO_R_W: u8 = 0x74;
const WHO_AM_I: u8 = 0x75;

/// Power-on value of `PWR_MGMT_1` (sleep bit set)
const PWR_MGMT_1_DEFAULT: u8 = 0x40;

/// DMP memory size simulated by the mock (16 banks of 256 bytes)
pub const MEMORY_SIZE: usize = 16 * 256;

/// Records operations performed on the mock interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// One read transaction
    Read {
        /// Start register address
        address: u8,
        /// Number of bytes read
        len: usize,
    },
    /// One write transaction
    Write {
        /// Start register address
        address: u8,
        /// Bytes written
        data: Vec<u8>,
    },
    /// A delay requested through [`MockDelay`](crate::common::test_utils::MockDelay)
    Delay {
        /// Duration in microseconds
        us: u32,
    },
}

/// Errors the mock can inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Simulated bus failure
    Communication,
}

/// Shared state for mock interface (uses interior mutability)
#[derive(Debug)]
struct MockState {
    registers: [u8; 256],
    fifo: VecDeque<u8>,
    /// Bytes appended to the FIFO on the n-th count read (1-based)
    arrivals: BTreeMap<usize, Vec<u8>>,
    /// Count reads (1-based) on which the FIFO is emptied first
    resets: Vec<usize>,
    count_reads: usize,
    memory: Vec<u8>,
    bank: u8,
    mem_address: u8,
    corrupt_offsets: Vec<usize>,
    operations: Vec<Operation>,
    fail_next_read: bool,
    fail_next_write: bool,
}

impl MockState {
    fn new() -> Self {
        let mut state = Self {
            registers: [0; 256],
            fifo: VecDeque::new(),
            arrivals: BTreeMap::new(),
            resets: Vec::new(),
            count_reads: 0,
            memory: vec![0; MEMORY_SIZE],
            bank: 0,
            mem_address: 0,
            corrupt_offsets: Vec::new(),
            operations: Vec::new(),
            fail_next_read: false,
            fail_next_write: false,
        };
        state.registers[usize::from(WHO_AM_I)] = 0x68;
        state.power_on_defaults();
        state
    }

    fn power_on_defaults(&mut self) {
        let who_am_i = self.registers[usize::from(WHO_AM_I)];
        self.registers = [0; 256];
        self.registers[usize::from(PWR_MGMT_1)] = PWR_MGMT_1_DEFAULT;
        self.registers[usize::from(WHO_AM_I)] = who_am_i;
    }

    fn memory_offset(&self) -> usize {
        (usize::from(self.bank) * 256 + usize::from(self.mem_address)) % MEMORY_SIZE
    }

    fn advance_memory(&mut self) {
        if self.mem_address == u8::MAX {
            self.mem_address = 0;
            self.bank = self.bank.wrapping_add(1);
        } else {
            self.mem_address += 1;
        }
    }

    fn read_fifo_count(&mut self, data: &mut [u8]) {
        self.count_reads += 1;
        if self.resets.contains(&self.count_reads) {
            self.fifo.clear();
        }
        if let Some(bytes) = self.arrivals.remove(&self.count_reads) {
            self.fifo.extend(bytes);
        }
        let count = self.fifo.len() as u16;
        let bytes = count.to_be_bytes();
        for (slot, value) in data.iter_mut().zip(bytes) {
            *slot = value;
        }
    }

    fn write_byte(&mut self, address: u8, value: u8) {
        match address {
            PWR_MGMT_1 if value & 0x80 != 0 => self.power_on_defaults(),
            USER_CTRL => {
                if value & 0x04 != 0 {
                    self.fifo.clear();
                }
                // Reset bits clear themselves
                self.registers[usize::from(address)] = value & 0xF0;
            }
            BANK_SEL => {
                self.registers[usize::from(address)] = value;
                self.bank = value & 0x1F;
            }
            MEM_START_ADDR => {
                self.registers[usize::from(address)] = value;
                self.mem_address = value;
            }
            _ => self.registers[usize::from(address)] = value,
        }
    }
}

/// Mock register interface
///
/// Simulates the register file, the FIFO byte queue and the banked DMP
/// memory behind `MEM_R_W`. Clones share state, so tests keep one clone
/// while the driver owns the other.
#[derive(Debug, Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
}

impl MockInterface {
    /// Create a mock MPU-6050 (`WHO_AM_I` = 0x68)
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
        }
    }

    /// Set a register value directly (not logged)
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers[usize::from(address)] = value;
    }

    /// Get a register value directly (not logged)
    pub fn register(&self, address: u8) -> u8 {
        self.state.borrow().registers[usize::from(address)]
    }

    /// Set the `WHO_AM_I` register
    pub fn set_who_am_i(&self, value: u8) {
        self.set_register(WHO_AM_I, value);
    }

    /// Set a big-endian 16-bit value at `address` and `address + 1`
    pub fn set_word(&self, address: u8, value: i16) {
        let [high, low] = value.to_be_bytes();
        self.set_register(address, high);
        self.set_register(address.wrapping_add(1), low);
    }

    /// Append bytes to the FIFO
    pub fn push_fifo(&self, bytes: &[u8]) {
        self.state.borrow_mut().fifo.extend(bytes.iter().copied());
    }

    /// Append bytes to the FIFO when the count is read for the `nth` time
    /// (counting from 1, including reads already made)
    pub fn schedule_fifo(&self, nth_count_read: usize, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .arrivals
            .entry(nth_count_read)
            .or_default().extend_from_slice(bytes);
    }

    /// Empty the FIFO when the count is read for the `nth` time
    pub fn schedule_fifo_reset(&self, nth_count_read: usize) {
        self.state.borrow_mut().resets.push(nth_count_read);
    }

    /// Number of bytes currently in the FIFO
    pub fn fifo_len(&self) -> usize {
        self.state.borrow().fifo.len()
    }

    /// Number of FIFO count reads so far
    pub fn count_reads(&self) -> usize {
        self.state.borrow().count_reads
    }

    /// Copy of DMP memory at `offset..offset + len`
    pub fn memory(&self, offset: usize, len: usize) -> Vec<u8> {
        self.state.borrow().memory[offset..offset + len].to_vec()
    }

    /// Flip every bit of whatever gets written to DMP memory at `offset`
    pub fn corrupt_memory_at(&self, offset: usize) {
        self.state.borrow_mut().corrupt_offsets.push(offset);
    }

    /// Make the next read fail
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Make the next write fail
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Get all logged operations
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Clear the operation log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// All write transactions as `(address, data)`
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Write { address, data } => Some((address, data)),
                _ => None,
            })
            .collect()
    }

    /// Lengths of all reads starting at `address`
    pub fn reads_of(&self, address: u8) -> Vec<usize> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Read { address: a, len } if a == address => Some(len),
                _ => None,
            })
            .collect()
    }

    /// Lengths of all writes starting at `address`
    pub fn writes_to(&self, address: u8) -> Vec<usize> {
        self.writes()
            .into_iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, data)| data.len())
            .collect()
    }

    /// All delays in microseconds
    pub fn delays(&self) -> Vec<u32> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Delay { us } => Some(us),
                _ => None,
            })
            .collect()
    }

    /// Sum of all delays in microseconds
    pub fn total_delay_us(&self) -> u64 {
        self.delays().into_iter().map(u64::from).sum()
    }

    pub(crate) fn log_delay(&self, us: u32) {
        self.state
            .borrow_mut()
            .operations.push(Operation::Delay { us });
    }
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }

        state.operations.push(Operation::Read {
            address,
            len: read_data.len(),
        });

        match address {
            FIFO_COUNTH => state.read_fifo_count(read_data),
            FIFO_R_W => {
                for byte in read_data.iter_mut() {
                    *byte = state.fifo.pop_front().unwrap_or(0);
                }
            }
            MEM_R_W => {
                for byte in read_data.iter_mut() {
                    let offset = state.memory_offset();
                    *byte = state.memory[offset];
                    state.advance_memory();
                }
            }
            _ => {
                for (i, byte) in read_data.iter_mut().enumerate() {
                    *byte = state.registers[usize::from(address.wrapping_add(i as u8))];
                }
            }
        }

        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Communication);
        }

        state.operations.push(Operation::Write {
            address,
            data: write_data.to_vec(),
        });

        match address {
            MEM_R_W => {
                for &byte in write_data {
                    let offset = state.memory_offset();
                    let value = if state.corrupt_offsets.contains(&offset) {
                        !byte
                    } else {
                        byte
                    };
                    state.memory[offset] = value;
                    state.advance_memory();
                }
            }
            FIFO_R_W => state.fifo.extend(write_data.iter().copied()),
            _ => {
                for (i, &byte) in write_data.iter().enumerate() {
                    state.write_byte(address.wrapping_add(i as u8), byte);
                }
            }
        }

        Ok(())
    }
}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}
