//! Benchmarks for byteprovider.
//!
//! Run with:
//!     cargo bench

use std::io::{Cursor, Write};

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use byteprovider::{
    ByteProvider, ChainBytes, ChainMember, ChunkOptions, FileBytes, FillBytes, FillSpec,
    MemoryBytes, StreamBytes,
};

fn drain(provider: &mut dyn ByteProvider, options: ChunkOptions) -> usize {
    let mut total = 0;
    for chunk in provider.iter_chunks(options).unwrap() {
        total += chunk.unwrap().len();
    }
    total
}

fn bench_backings(c: &mut Criterion) {
    let mut group = c.benchmark_group("backings");
    let size = 4 * 1024 * 1024; // 4 MB
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();
    let options = ChunkOptions::new(64 * 1024).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    group.throughput(Throughput::Bytes(size as u64));

    // Zero-copy slices of a resident buffer
    group.bench_function("memory", |b| {
        let mut provider = MemoryBytes::new(data.clone()).unwrap();
        b.iter(|| black_box(drain(&mut provider, black_box(options))));
    });

    group.bench_function("fill", |b| {
        let mut provider = FillBytes::new(FillSpec::new(size, 0xFF, 1)).unwrap();
        b.iter(|| black_box(drain(&mut provider, black_box(options))));
    });

    group.bench_function("file_mmap", |b| {
        let mut provider = FileBytes::open(file.path()).unwrap();
        b.iter(|| black_box(drain(&mut provider, black_box(options))));
    });

    // Every chunk is a fresh buffer filled from the reader
    group.bench_function("stream", |b| {
        b.iter(|| {
            let mut provider = StreamBytes::new(Cursor::new(black_box(&data))).unwrap();
            black_box(drain(&mut provider, options))
        });
    });

    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_sizes");
    let size = 1024 * 1024; // 1 MB
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();
    let mut provider = MemoryBytes::new(data).unwrap();

    group.throughput(Throughput::Bytes(size as u64));
    for chunk_size in [512, 8000, 64 * 1024] {
        let options = ChunkOptions::new(chunk_size).unwrap();
        group.bench_function(format!("memory_{}", chunk_size), |b| {
            b.iter(|| black_box(drain(&mut provider, options)));
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    let part = 256 * 1024;
    let data: Vec<u8> = (0..part).map(|i| (i * 7 + 13) as u8).collect();

    group.throughput(Throughput::Bytes(4 * part as u64));

    // Aligned members pass chunks through; misaligned ones are re-blocked
    for chunk_size in [64 * 1024, 60_000] {
        let members: Vec<ChainMember> = (0..4)
            .map(|_| Box::new(MemoryBytes::new(data.clone()).unwrap()) as ChainMember)
            .collect();
        let mut chain = ChainBytes::new(members).unwrap();
        let options = ChunkOptions::new(chunk_size).unwrap();

        group.bench_function(format!("chunks_{}", chunk_size), |b| {
            b.iter(|| black_box(drain(&mut chain, options)));
        });
    }

    group.bench_function("get_spanning", |b| {
        let members: Vec<ChainMember> = (0..4)
            .map(|_| Box::new(MemoryBytes::new(data.clone()).unwrap()) as ChainMember)
            .collect();
        let chain = ChainBytes::new(members).unwrap();
        let span = part as u64 / 2..3 * part as u64 + part as u64 / 2;
        b.iter(|| black_box(chain.get(black_box(span.clone())).unwrap().len()));
    });

    group.finish();
}

criterion_group!(benches, bench_backings, bench_chunk_sizes, bench_chain);
criterion_main!(benches);
