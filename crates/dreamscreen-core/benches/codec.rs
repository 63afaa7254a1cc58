//! Packet codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dreamscreen_core::{Command, DeviceState, FromPayload, Packet, PacketFlags, SectorData};

fn sector_packet() -> Packet {
    let payload: Vec<u8> = (0..36u8).collect();
    Packet::new(Command::SectorData, PacketFlags::RESPONSE | PacketFlags::BROADCAST)
        .with_payload(payload)
}

fn encode_benchmark(c: &mut Criterion) {
    let packet = sector_packet();

    c.bench_function("encode_sector_data", |b| {
        b.iter(|| black_box(packet.encode().unwrap()))
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let encoded = sector_packet().encode().unwrap();

    c.bench_function("decode_sector_data", |b| {
        b.iter(|| {
            let packet = Packet::decode(black_box(&encoded)).unwrap();
            black_box(SectorData::from_payload(&packet.payload).unwrap())
        })
    });
}

fn state_benchmark(c: &mut Criterion) {
    let state = DeviceState::new();

    c.bench_function("serialize_state", |b| {
        b.iter(|| black_box(state.to_state_payload()))
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark, state_benchmark);
criterion_main!(benches);
