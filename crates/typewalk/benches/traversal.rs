// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Traversal Benchmark
//!
//! Measures the cost of compiled handlers against an in-memory tape:
//! - Cached handler lookup
//! - Record/create/apply of a mixed record
//! - Byte fast path versus element-wise traversal of the same payload size

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeSet;
use typewalk::{ByteArray, HandlerCache, Inspect, NdArray, Tape};

#[derive(Debug, Default, Clone, PartialEq, Inspect)]
struct Sample {
    id: u64,
    source: String,
    grid: Option<NdArray<f32, 2>>,
    readings: Vec<f64>,
    tags: BTreeSet<String>,
}

fn sample(readings: usize) -> Sample {
    Sample {
        id: 42,
        source: "bench".into(),
        grid: Some(NdArray::new([16, 16])),
        readings: (0..readings).map(|i| i as f64 * 0.5).collect(),
        tags: ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
    }
}

fn bench_handler_lookup(c: &mut Criterion) {
    let cache = HandlerCache::new();
    cache.register::<Sample>().expect("register");

    c.bench_function("handler_lookup_hit", |b| {
        b.iter(|| black_box(cache.get_or_build::<Sample>().expect("hit")));
    });
}

fn bench_record_roundtrip(c: &mut Criterion) {
    let cache = HandlerCache::new();
    let mut group = c.benchmark_group("record");

    for readings in [16usize, 256, 4096] {
        let mut value = sample(readings);
        let tape = Tape::record(&cache, &mut value, 1).expect("record");
        group.throughput(Throughput::Elements(tape.len() as u64));

        group.bench_with_input(BenchmarkId::new("record", readings), &readings, |b, _| {
            b.iter(|| black_box(Tape::record(&cache, &mut value, 1).expect("record")));
        });

        group.bench_with_input(BenchmarkId::new("create", readings), &readings, |b, _| {
            b.iter(|| black_box(tape.create::<Sample>(&cache, 1).expect("create")));
        });

        let mut target = value.clone();
        group.bench_with_input(BenchmarkId::new("apply_unchanged", readings), &readings, |b, _| {
            b.iter(|| black_box(tape.apply(&cache, &mut target, 1).expect("apply")));
        });
    }
    group.finish();
}

fn bench_byte_fast_path(c: &mut Criterion) {
    let cache = HandlerCache::new();
    let mut group = c.benchmark_group("payload");

    for size in [1024usize, 65536] {
        group.throughput(Throughput::Bytes(size as u64));

        let mut bytes: Option<ByteArray> = Some(NdArray::new([size]));
        let tape = Tape::record(&cache, &mut bytes, 1).expect("record bytes");
        group.bench_with_input(BenchmarkId::new("bytes", size), &size, |b, _| {
            b.iter(|| black_box(tape.apply(&cache, &mut bytes, 1).expect("apply")));
        });

        let mut words: Option<NdArray<u16, 1>> = Some(NdArray::new([size / 2]));
        let tape = Tape::record(&cache, &mut words, 1).expect("record words");
        group.bench_with_input(BenchmarkId::new("elements", size), &size, |b, _| {
            b.iter(|| black_box(tape.apply(&cache, &mut words, 1).expect("apply")));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_handler_lookup,
    bench_record_roundtrip,
    bench_byte_fast_path
);
criterion_main!(benches);
