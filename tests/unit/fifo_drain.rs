//! Unit tests for the FIFO drain algorithm

use crate::common::test_utils::tagged_packet;
use crate::common::{MockDelay, create_mock_bus};
use mpu6050_dmp::fifo::{FifoDrainConfig, drain_one_packet};
use mpu6050_dmp::{Error, registers};

const P: usize = 28;

fn push_packets(interface: &crate::common::MockInterface, count: u8) {
    for tag in 1..=count {
        interface.push_fifo(&tagged_packet(tag, P));
    }
}

#[test]
fn test_exactly_one_packet() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    push_packets(&interface, 1);

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet).unwrap();

    assert_eq!(packet, [1u8; P]);
    assert_eq!(interface.reads_of(registers::FIFO_R_W), vec![P]);
    assert_eq!(interface.fifo_len(), 0);
    assert!(interface.delays().is_empty());
}

#[test]
fn test_backlog_keeps_newest_packet() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    push_packets(&interface, 3);

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet).unwrap();

    assert_eq!(packet, [3u8; P]);
    // One discard read of two packets, then the packet itself
    assert_eq!(interface.reads_of(registers::FIFO_R_W), vec![2 * P, P]);
    assert_eq!(interface.fifo_len(), 0);
}

#[test]
fn test_deep_backlog_discarded_in_bounded_reads() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    push_packets(&interface, 8);

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet).unwrap();

    assert_eq!(packet, [8u8; P]);
    let reads = interface.reads_of(registers::FIFO_R_W);
    assert_eq!(reads, vec![5 * P, 2 * P, P]);
    assert!(reads.iter().all(|&len| len <= 5 * P));
}

#[test]
fn test_trailing_partial_packet_left_alone() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    push_packets(&interface, 3);
    interface.push_fifo(&[0xEE; 10]);

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet).unwrap();

    assert_eq!(packet, [3u8; P]);
    assert_eq!(interface.reads_of(registers::FIFO_R_W), vec![2 * P, P]);
    assert_eq!(interface.fifo_len(), 10);
}

/// Time charged against the wait window: sleeps plus one poll cost per count read
fn charged_us(interface: &crate::common::MockInterface, config: &FifoDrainConfig) -> u64 {
    interface.total_delay_us() + interface.count_reads() as u64 * u64::from(config.poll_cost_us)
}

#[test]
fn test_empty_fifo_times_out_within_window() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    let config = FifoDrainConfig::dmp();

    let mut packet = [0u8; P];
    let result = drain_one_packet(&mut bus, &mut delay, &config, &mut packet);

    assert_eq!(result, Err(Error::Timeout));
    let charged = charged_us(&interface, &config);
    assert!((50_000..=50_600).contains(&charged), "charged {charged} us");
    assert_eq!(interface.total_delay_us(), 42_000);
    assert!(interface.delays().iter().all(|&us| us == 500));
    assert!(interface.reads_of(registers::FIFO_R_W).is_empty());
}

#[test]
fn test_zero_poll_cost_counts_sleep_only() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    let config = FifoDrainConfig::dmp().with_poll_cost_us(0);

    let mut packet = [0u8; P];
    let result = drain_one_packet(&mut bus, &mut delay, &config, &mut packet);

    assert_eq!(result, Err(Error::Timeout));
    let total = interface.total_delay_us();
    assert!(
        (50_000..=50_500).contains(&total),
        "waited {total} us"
    );
}

#[test]
fn test_custom_window_and_backoff() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    let config = FifoDrainConfig::dmp()
        .with_max_wait_ms(5).with_backoff_us(1000);

    let mut packet = [0u8; P];
    let result = drain_one_packet(&mut bus, &mut delay, &config, &mut packet);

    assert_eq!(result, Err(Error::Timeout));
    let charged = charged_us(&interface, &config);
    assert!((5_000..=6_100).contains(&charged), "charged {charged} us");
}

#[test]
fn test_stuck_partial_packet_times_out_without_poll_limit() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    interface.push_fifo(&[0xCD; 10]);
    let config = FifoDrainConfig::dmp()
        .with_max_partial_polls(0).with_max_wait_ms(1);

    let mut packet = [0u8; P];
    let result = drain_one_packet(&mut bus, &mut delay, &config, &mut packet);

    assert_eq!(result, Err(Error::Timeout));
    // 100 us per poll, so the eleventh poll crosses the 1 ms window
    assert_eq!(interface.count_reads(), 11);
    assert!(interface.delays().is_empty());
    assert_eq!(interface.fifo_len(), 10);
}

#[test]
fn test_packet_arrives_while_polling() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    interface.schedule_fifo(4, &tagged_packet(7, P));

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet).unwrap();

    assert_eq!(packet, [7u8; P]);
    assert_eq!(interface.delays(), vec![500, 500, 500]);
}

#[test]
fn test_partial_packet_completes() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    let expected: Vec<u8> = (0..P as u8).collect();
    interface.push_fifo(&expected[..10]);
    interface.schedule_fifo(3, &expected[10..]);

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet).unwrap();

    assert_eq!(&packet[..], &expected[..]);
    assert_eq!(interface.count_reads(), 3);
    // Mid-packet polls never consume bytes or back off
    assert_eq!(interface.reads_of(registers::FIFO_R_W), vec![P]);
    assert!(interface.delays().is_empty());
}

#[test]
fn test_stuck_partial_packet_escalates() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    interface.push_fifo(&[0xAB; 10]);
    let config = FifoDrainConfig::dmp().with_max_partial_polls(5);

    let mut packet = [0u8; P];
    let result = drain_one_packet(&mut bus, &mut delay, &config, &mut packet);

    assert_eq!(result, Err(Error::MisalignedFifo { count: 10 }));
    assert_eq!(interface.count_reads(), 6);
    assert!(interface.reads_of(registers::FIFO_R_W).is_empty());
    assert_eq!(interface.fifo_len(), 10);
}

#[test]
fn test_partial_counter_resets_on_empty_fifo() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    let config = FifoDrainConfig::dmp().with_max_partial_polls(2);
    let expected = tagged_packet(9, P);

    // Two partial polls, an empty FIFO, then two more partial polls
    interface.push_fifo(&[0x11; 4]);
    interface.schedule_fifo_reset(3);
    interface.schedule_fifo(4, &expected[..4]);
    interface.schedule_fifo(6, &expected[4..]);

    let mut packet = [0u8; P];
    drain_one_packet(&mut bus, &mut delay, &config, &mut packet).unwrap();

    assert_eq!(&packet[..], &expected[..]);
    assert_eq!(interface.count_reads(), 6);
    assert_eq!(interface.delays(), vec![500]);
}

#[test]
fn test_wrong_buffer_size_rejected() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    push_packets(&interface, 1);

    let mut packet = [0u8; P - 1];
    let result = drain_one_packet(&mut bus, &mut delay, &FifoDrainConfig::dmp(), &mut packet);

    assert_eq!(result, Err(Error::InvalidConfig));
    assert!(interface.operations().is_empty());
}

#[test]
fn test_invalid_packet_size_rejected() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);

    let config = FifoDrainConfig::dmp().with_packet_size(0);
    let result = drain_one_packet(&mut bus, &mut delay, &config, &mut []);

    assert_eq!(result, Err(Error::InvalidConfig));
    assert!(interface.operations().is_empty());
}

#[test]
fn test_other_packet_sizes() {
    let (mut bus, interface) = create_mock_bus();
    let mut delay = MockDelay::new(&interface);
    for tag in 1..=4 {
        interface.push_fifo(&tagged_packet(tag, 12));
    }

    let config = FifoDrainConfig::dmp().with_packet_size(12);
    let mut packet = [0u8; 12];
    drain_one_packet(&mut bus, &mut delay, &config, &mut packet).unwrap();

    assert_eq!(packet, [4u8; 12]);
    assert_eq!(interface.reads_of(registers::FIFO_R_W), vec![36, 12]);
}
