//! Benchmarks for quic-proxy-core message I/O.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::io::{AsyncWriteExt, duplex};

use quic_proxy_core::{FramingMode, Message, read_message, write_message};

fn bench_read_delimited(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("read_delimited");

    for size in [64, 1024, 16 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut payload = vec![b'x'; size - 1];
            payload.push(b'\n');
            b.iter(|| {
                rt.block_on(async {
                    let mut reader = payload.as_slice();
                    let msg = read_message(&mut reader, FramingMode::delimited())
                        .await
                        .unwrap();
                    black_box(msg);
                })
            })
        });
    }

    group.finish();
}

fn bench_read_fixed(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("read_fixed_4k", |b| {
        let payload = vec![0xa5u8; 4096];
        b.iter(|| {
            rt.block_on(async {
                let mut reader = payload.as_slice();
                let msg = read_message(&mut reader, FramingMode::fixed(4096))
                    .await
                    .unwrap();
                black_box(msg);
            })
        })
    });
}

fn bench_write_duplex(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("write_message_duplex_16k", |b| {
        let payload = bytes::Bytes::from(vec![b'y'; 16 * 1024]);
        b.iter(|| {
            rt.block_on(async {
                let (mut tx, mut rx) = duplex(64 * 1024);
                let n = write_message(&mut tx, Message::new(payload.clone()))
                    .await
                    .unwrap();
                tx.shutdown().await.unwrap();
                let mut sink = Vec::with_capacity(n);
                tokio::io::copy(&mut rx, &mut sink).await.unwrap();
                black_box(sink);
            })
        })
    });
}

criterion_group!(benches, bench_read_delimited, bench_read_fixed, bench_write_duplex);
criterion_main!(benches);
