// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bnk::soundbank::SoundBank;
use criterion::{criterion_group, criterion_main, Criterion};

fn section(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

// A bank with a few hundred streams, enough for the layout pass to matter.
fn synthetic_bank() -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(&134u32.to_le_bytes());
    header.extend_from_slice(&1u32.to_le_bytes());

    let mut index = Vec::new();
    let mut data = Vec::new();
    for id in 0..512u32 {
        let payload = vec![id as u8; 100 + (id as usize % 3)];

        if data.len() % 16 != 0 {
            let padding = 16 - data.len() % 16;
            data.extend(std::iter::repeat(0).take(padding));
        }

        index.extend_from_slice(&id.to_le_bytes());
        index.extend_from_slice(&(data.len() as u32).to_le_bytes());
        index.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&payload);
    }

    let mut bank = Vec::new();
    bank.extend_from_slice(&section(b"BKHD", &header));
    bank.extend_from_slice(&section(b"DIDX", &index));
    bank.extend_from_slice(&section(b"DATA", &data));
    bank
}

fn criterion_benchmark(c: &mut Criterion) {
    let bytes = synthetic_bank();

    c.bench_function("soundbank decode", |b| {
        b.iter(|| SoundBank::from_existing(&bytes).unwrap())
    });

    let mut bank = SoundBank::from_existing(&bytes).unwrap();
    c.bench_function("soundbank encode", |b| {
        b.iter(|| bank.write_to_buffer().unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
