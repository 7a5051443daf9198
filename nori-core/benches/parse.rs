//! Benchmarks for JSON parsing.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Build a synthetic document: an array of record objects with mixed
/// scalar payloads and a little escaping.
fn synthetic_records(count: usize) -> String {
    let mut doc = String::from("[");
    for i in 0..count {
        if i > 0 {
            doc.push(',');
        }
        doc.push_str(&format!(
            r#"{{"id": {i}, "name": "record-{i}", "ratio": {}.{:03}, "tags": ["a", "b\n{i}"], "active": {}, "parent": null}}"#,
            i % 97,
            i % 1000,
            i % 2 == 0,
        ));
    }
    doc.push(']');
    doc
}

/// Deeply nested brackets stress the recursion path.
fn nested_arrays(depth: usize) -> String {
    let mut doc = String::with_capacity(depth * 2 + 1);
    for _ in 0..depth {
        doc.push('[');
    }
    doc.push('0');
    for _ in 0..depth {
        doc.push(']');
    }
    doc
}

fn bench_parse_records(c: &mut Criterion) {
    let input = synthetic_records(1000);

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("records_1k", |b| {
        b.iter(|| nori_core::parse(black_box(&input)).unwrap())
    });

    group.finish();
}

fn bench_parse_nested(c: &mut Criterion) {
    let input = nested_arrays(512);

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("nested_512", |b| {
        b.iter(|| nori_core::parse(black_box(&input)).unwrap())
    });

    group.finish();
}

/// Same documents through serde_json for a baseline comparison.
fn bench_compare_serde(c: &mut Criterion) {
    let input = synthetic_records(1000);

    let mut group = c.benchmark_group("compare");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("nori/records_1k", |b| {
        b.iter(|| nori_core::parse(black_box(&input)).unwrap())
    });
    group.bench_function("serde_json/records_1k", |b| {
        b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(&input)).unwrap())
    });

    group.finish();
}

/// Object member lookup after parsing (table probe path).
fn bench_lookup(c: &mut Criterion) {
    let mut doc = String::from("{");
    for i in 0..500 {
        if i > 0 {
            doc.push(',');
        }
        doc.push_str(&format!("\"member{i}\": {i}"));
    }
    doc.push('}');
    let value = nori_core::parse(&doc).unwrap();

    c.bench_function("lookup/object_500", |b| {
        b.iter(|| {
            let mut found = 0;
            for i in 0..500 {
                if value.get(black_box(&format!("member{i}"))).is_some() {
                    found += 1;
                }
            }
            found
        })
    });
}

criterion_group!(
    benches,
    bench_parse_records,
    bench_parse_nested,
    bench_compare_serde,
    bench_lookup
);
criterion_main!(benches);
