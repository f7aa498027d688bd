//! Unit tests for the I2C register interface

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use mpu6050_dmp::{I2cInterface, RegisterBus, registers};

/// I2C bus that records what goes over the wire
#[derive(Debug, Default)]
struct RecordingI2c {
    /// Device address of each transaction
    addresses: Vec<u8>,
    /// All bytes written during each transaction, in order
    written: Vec<Vec<u8>>,
    /// Lengths of the read operations
    read_lens: Vec<usize>,
}

impl ErrorType for RecordingI2c {
    type Error = ErrorKind;
}

impl I2c for RecordingI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.addresses.push(address);
        let mut written = Vec::new();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => written.extend_from_slice(*bytes),
                Operation::Read(buffer) => {
                    for (i, byte) in buffer.iter_mut().enumerate() {
                        *byte = i as u8;
                    }
                    self.read_lens.push(buffer.len());
                }
            }
        }
        self.written.push(written);
        Ok(())
    }
}

#[test]
fn test_long_write_sent_whole() {
    let mut bus = RegisterBus::new(I2cInterface::default(RecordingI2c::default()));
    bus.write_bytes(registers::MEM_R_W, &[0xAA; 40]).unwrap();

    let wire = bus.release().release();
    assert_eq!(wire.addresses, vec![0x68]);
    assert_eq!(wire.written.len(), 1);
    assert_eq!(wire.written[0].len(), 41);
    assert_eq!(wire.written[0][0], registers::MEM_R_W);
    assert!(wire.written[0][1..].iter().all(|&byte| byte == 0xAA));
}

#[test]
fn test_word_write_is_address_then_big_endian() {
    let mut bus = RegisterBus::new(I2cInterface::alternative(RecordingI2c::default()));
    bus.write_word(registers::XG_OFFS_USRH, -2).unwrap();

    let wire = bus.release().release();
    assert_eq!(wire.addresses, vec![0x69]);
    assert_eq!(wire.written, vec![vec![registers::XG_OFFS_USRH, 0xFF, 0xFE]]);
}

#[test]
fn test_read_is_one_write_read() {
    let mut bus = RegisterBus::new(I2cInterface::new(RecordingI2c::default(), 0x42));
    let mut buffer = [0u8; 6];
    bus.read_bytes(registers::ACCEL_XOUT_H, &mut buffer).unwrap();

    assert_eq!(buffer, [0, 1, 2, 3, 4, 5]);
    let wire = bus.release().release();
    assert_eq!(wire.addresses, vec![0x42]);
    assert_eq!(wire.written, vec![vec![registers::ACCEL_XOUT_H]]);
    assert_eq!(wire.read_lens, vec![6]);
}
