//! Packet framing tests for DreamScreen core

use bytes::Bytes;
use dreamscreen_core::packet::{crc8, MAX_PAYLOAD_SIZE, MIN_PACKET_SIZE};
use dreamscreen_core::{Command, Error, Packet, PacketFlags, GROUP_ALL, MAGIC_BYTE};

#[test]
fn test_packet_layout() {
    let packet = Packet::new(Command::SubscribeToSectorData, PacketFlags::RESPONSE_REQUEST)
        .with_group(2)
        .with_payload(vec![1u8]);

    let encoded = packet.encode().expect("encode failed");

    assert_eq!(encoded[0], MAGIC_BYTE);
    assert_eq!(encoded[1], 5, "length counts group, flags, command, payload, crc");
    assert_eq!(encoded[2], 2);
    assert_eq!(encoded[3], 0x10);
    assert_eq!(encoded[4], 0x0C);
    assert_eq!(encoded[5], 1);
    assert_eq!(encoded[6], crc8(&encoded[..6]));
}

#[test]
fn test_default_group_is_broadcast() {
    let packet = Packet::new(Command::Ping, PacketFlags::RESPONSE_REQUEST);
    assert_eq!(packet.group, GROUP_ALL);
}

#[test]
fn test_decode_rejects_short_buffer() {
    let err = Packet::decode(&[MAGIC_BYTE, 4, 0]).unwrap_err();
    assert_eq!(
        err,
        Error::BufferTooSmall {
            needed: MIN_PACKET_SIZE,
            have: 3
        }
    );
}

#[test]
fn test_decode_rejects_bad_magic() {
    let mut encoded = Packet::new(Command::Ping, PacketFlags::RESPONSE)
        .encode()
        .unwrap()
        .to_vec();
    encoded[0] = 0x53;

    assert_eq!(Packet::decode(&encoded), Err(Error::InvalidMagic(0x53)));
}

#[test]
fn test_decode_rejects_truncated_payload() {
    let encoded = Packet::new(Command::SectorData, PacketFlags::RESPONSE)
        .with_payload(vec![0u8; 36])
        .encode()
        .unwrap();

    let result = Packet::decode(&encoded[..20]);
    assert!(matches!(result, Err(Error::BufferTooSmall { needed: 42, .. })));
}

#[test]
fn test_decode_rejects_bad_crc() {
    let mut encoded = Packet::new(Command::Brightness, PacketFlags::WRITE_CONSTANT)
        .with_payload(vec![100u8])
        .encode()
        .unwrap()
        .to_vec();
    let last = encoded.len() - 1;
    encoded[last] ^= 0xFF;

    assert!(matches!(
        Packet::decode(&encoded),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_decode_rejects_length_below_header() {
    let mut raw = vec![MAGIC_BYTE, 2, 0xFF, 0x10];
    raw.push(crc8(&raw));
    raw.push(0);

    assert_eq!(Packet::decode(&raw), Err(Error::InvalidLength(2)));
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let packet =
        Packet::new(Command::Mode, PacketFlags::WRITE_CONSTANT).with_payload(vec![3u8]);
    let mut raw = packet.encode().unwrap().to_vec();
    raw.extend_from_slice(&[0xAA, 0xBB]);

    assert_eq!(Packet::decode(&raw).unwrap(), packet);
}

#[test]
fn test_unknown_command_survives_decode() {
    let packet = Packet::new(Command::Unknown(0x7E), PacketFlags::WRITE_CONSTANT);
    let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();

    assert_eq!(decoded.command, Command::Unknown(0x7E));
}

#[test]
fn test_unknown_flag_bits_preserved() {
    let flags = PacketFlags::from_byte(0x8A);
    let packet = Packet::new(Command::Ping, flags);
    let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();

    assert_eq!(decoded.flags.to_byte(), 0x8A);
    assert!(!decoded.flags.intersects(PacketFlags::RESPONSE | PacketFlags::BROADCAST));
}

#[test]
fn test_payload_too_large() {
    let packet = Packet::new(Command::Name, PacketFlags::WRITE_CONSTANT)
        .with_payload(Bytes::from(vec![0u8; MAX_PAYLOAD_SIZE + 1]));

    assert_eq!(
        packet.encode(),
        Err(Error::PayloadTooLarge(MAX_PAYLOAD_SIZE + 1))
    );
}

#[test]
fn test_max_payload_fits() {
    let packet = Packet::new(Command::SectorData, PacketFlags::RESPONSE)
        .with_payload(Bytes::from(vec![7u8; MAX_PAYLOAD_SIZE]));
    let encoded = packet.encode().expect("max payload should encode");

    assert_eq!(encoded[1], u8::MAX);
    assert_eq!(Packet::decode(&encoded).unwrap().payload.len(), MAX_PAYLOAD_SIZE);
}
