use criterion::{black_box, criterion_group, criterion_main, Criterion};
use model_sonar_core::{GGUFParser, SalvageReader};
use std::io::Cursor;

fn synthetic_file(kv_count: u64) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"GGUF");
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&kv_count.to_le_bytes());

    for i in 0..kv_count {
        let key = format!("bench.key.{}", i);
        data.extend_from_slice(&(key.len() as u64).to_le_bytes());
        data.extend_from_slice(key.as_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&(i as u32).to_le_bytes());
    }

    data
}

fn bench_full_parse(c: &mut Criterion) {
    let data = synthetic_file(256);

    c.bench_function("gguf_parse_256_kv", |b| {
        b.iter(|| GGUFParser::new(Cursor::new(black_box(&data))).parse().unwrap());
    });
}

fn bench_salvage_walk(c: &mut Criterion) {
    let data = synthetic_file(256);

    c.bench_function("salvage_walk_256_kv", |b| {
        b.iter(|| {
            SalvageReader::new(Cursor::new(black_box(&data)))
                .unwrap()
                .map(|e| e.unwrap())
                .count()
        });
    });
}

criterion_group!(benches, bench_full_parse, bench_salvage_walk);
criterion_main!(benches);
