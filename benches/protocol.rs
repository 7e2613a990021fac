//! Benchmarks for redis_wire_rs protocol performance
//!
//! This benchmark suite measures pipeline assembly throughput and
//! incremental reply parsing under different reply sizes.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redis_wire_rs::request::Pipeline;
use redis_wire_rs::resp::{read_reply, ArraySink};
use tokio::runtime::Runtime;

fn generate_array_reply(elements: usize) -> Vec<u8> {
    let mut data = format!("*{}\r\n", elements).into_bytes();
    for i in 0..elements {
        let item = format!("value_{:06}", i);
        data.extend_from_slice(format!("${}\r\n{}\r\n", item.len(), item).as_bytes());
    }
    data
}

fn bench_pipeline_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_build");

    for &count in &[1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut pipeline = Pipeline::new();
                for i in 0..count {
                    pipeline.set(format!("key_{:04}", i), "value");
                }
                black_box(pipeline.len())
            })
        });
    }

    group.finish();
}

fn bench_reply_parse(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("reply_parse");

    for &elements in &[4usize, 64, 1024] {
        let data = generate_array_reply(elements);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(elements), &data, |b, data| {
            b.iter(|| {
                rt.block_on(async {
                    let mut reader: &[u8] = data;
                    let mut buf = BytesMut::new();
                    let mut sink: ArraySink<String> = ArraySink::new();
                    read_reply(&mut reader, &mut buf, &mut sink).await.unwrap();
                    black_box(sink.result.len())
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline_build, bench_reply_parse);
criterion_main!(benches);
