//! Benchmark for RESP protocol parsing and encoding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use bytes::BytesMut;
use sack::protocol::{Frame, RespParser};

fn set_request(value_size: usize) -> Vec<u8> {
    let value = vec![b'x'; value_size];
    Frame::command([b"SET".as_slice(), b"key:000001".as_slice(), value.as_slice()]).to_vec()
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for size in [16usize, 256, 4096] {
        let request = set_request(size);
        group.throughput(Throughput::Bytes(request.len() as u64));
        group.bench_with_input(BenchmarkId::new("set_request", size), &request, |b, request| {
            b.iter(|| {
                let mut parser = RespParser::new();
                parser.extend(black_box(request));
                black_box(parser.parse().unwrap())
            });
        });
    }

    // 64 pipelined requests in one read
    let pipeline: Vec<u8> = (0..64).flat_map(|_| set_request(32)).collect();
    group.throughput(Throughput::Bytes(pipeline.len() as u64));
    group.bench_function("pipeline_64", |b| {
        b.iter(|| {
            let mut parser = RespParser::new();
            parser.extend(black_box(&pipeline));
            let mut n = 0;
            while let Ok(Some(frame)) = parser.parse() {
                black_box(frame);
                n += 1;
            }
            n
        });
    });

    // One wide request arriving in socket-sized reads
    for elements in [10_000usize, 100_000] {
        let parts: Vec<String> = std::iter::once("SET".to_string())
            .chain((0..elements).map(|i| format!("v{i}")))
            .collect();
        let request = Frame::command(&parts).to_vec();
        group.throughput(Throughput::Bytes(request.len() as u64));
        group.bench_with_input(BenchmarkId::new("wide_request_8k_reads", elements), &request, |b, request| {
            b.iter(|| {
                let mut parser = RespParser::new();
                let mut frame = None;
                for chunk in request.chunks(8 * 1024) {
                    parser.extend(black_box(chunk));
                    if let Some(f) = parser.parse().unwrap() {
                        frame = Some(f);
                    }
                }
                black_box(frame)
            });
        });
    }

    group.finish();
}

fn benchmark_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let hash: Frame = Frame::array(
        (0..32)
            .flat_map(|i| [Frame::bulk(format!("field{i}")), Frame::bulk(format!("value{i}"))])
            .collect(),
    );
    group.bench_function("hgetall_32", |b| {
        let mut buf = BytesMut::with_capacity(hash.serialized_size());
        b.iter(|| {
            buf.clear();
            black_box(&hash).serialize(&mut buf);
        });
    });

    group.bench_function("ok", |b| {
        let mut buf = BytesMut::with_capacity(16);
        b.iter(|| {
            buf.clear();
            Frame::ok().serialize(&mut buf);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_parsing, benchmark_encoding);
criterion_main!(benches);
