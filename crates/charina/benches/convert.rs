//! Conversion throughput benchmarks.
//!
//! Run with `cargo bench -p charina`.

use std::hint::black_box;

use charina::{Bridge, ObjectFromEntries, PyDict, PyList, PyValue};
use criterion::{Criterion, criterion_group, criterion_main};

fn flat_list(len: usize) -> PyValue {
    PyValue::List((0..len as i64).map(PyValue::from).collect::<PyList>())
}

fn wide_dict(len: usize) -> PyValue {
    let dict = PyDict::new();
    for i in 0..len as i64 {
        dict.insert(PyValue::from(format!("key_{i}")), PyValue::from(i));
    }
    PyValue::Dict(dict)
}

fn nested_dict(depth: usize) -> PyValue {
    let mut value = PyValue::from("leaf");
    for i in 0..depth {
        let dict = PyDict::new();
        dict.insert(PyValue::from(format!("level_{i}")), value);
        value = PyValue::Dict(dict);
    }
    value
}

fn bench_convert(c: &mut Criterion) {
    let bridge = Bridge::builder().build();
    let object_bridge = Bridge::builder()
        .with_dict_converter(ObjectFromEntries)
        .build();

    let list = flat_list(1_000);
    c.bench_function("flat_list_1k", |b| {
        b.iter(|| bridge.convert(black_box(&list)))
    });

    let dict = wide_dict(100);
    c.bench_function("wide_dict_100", |b| {
        b.iter(|| bridge.convert(black_box(&dict)))
    });

    c.bench_function("wide_dict_100_object_from_entries", |b| {
        b.iter(|| object_bridge.convert(black_box(&dict)))
    });

    let nested = nested_dict(100);
    c.bench_function("nested_dict_100", |b| {
        b.iter(|| bridge.convert(black_box(&nested)))
    });
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
