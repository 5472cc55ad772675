use std::hint::black_box;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use respincr::Reader;

fn set_command(key_len: usize, value_len: usize) -> Bytes {
    let key = "k".repeat(key_len);
    let value = "v".repeat(value_len);
    Bytes::from(format!(
        "*3\r\n$3\r\nSET\r\n${}\r\n{}\r\n${}\r\n{}\r\n",
        key.len(),
        key,
        value.len(),
        value
    ))
}

fn array_of_bulk_strings(elements: usize) -> Bytes {
    let mut out = format!("*{elements}\r\n");
    for i in 0..elements {
        let item = format!("item{i}");
        out.push_str(&format!("${}\r\n{}\r\n", item.len(), item));
    }
    Bytes::from(out)
}

fn decode_one(message: &Bytes) {
    let mut reader = Reader::default();
    reader.feed(message.clone());
    reader.parse().expect("valid RESP message");
    black_box(reader.take().expect("message completed"));
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_set_command");
    for &value_len in &[8usize, 256, 4096] {
        let message = set_command(16, value_len);
        group.bench_with_input(
            BenchmarkId::new("value_len", value_len),
            &message,
            |b, message| b.iter(|| decode_one(black_box(message))),
        );
    }
    group.finish();

    let mut group = c.benchmark_group("decode_array");
    for &elements in &[4usize, 64, 1024] {
        let message = array_of_bulk_strings(elements);
        group.bench_with_input(
            BenchmarkId::new("elements", elements),
            &message,
            |b, message| b.iter(|| decode_one(black_box(message))),
        );
    }
    group.finish();

    // Mirrors the byte-split-invariance property: decoding the same message
    // fed one byte at a time, to measure the overhead of repeated `parse()`
    // calls against a buffer that never has more than one byte available.
    let mut group = c.benchmark_group("decode_byte_at_a_time");
    let message = set_command(16, 256);
    group.bench_function("set_command", |b| {
        b.iter(|| {
            let mut reader = Reader::default();
            for &byte in message.iter() {
                reader.feed(Bytes::copy_from_slice(&[byte]));
                if reader.parse().expect("valid RESP message")
                    == respincr::ParseOutcome::Ready
                {
                    break;
                }
            }
            black_box(reader.take().expect("message completed"));
        });
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
