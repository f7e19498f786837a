//! Benchmarks for the data path: circular buffer, schema serialization and
//! tag parsing
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tagflow::{
    data::{RecordSchema, Schema},
    tag::parse_str,
    CircularBuffer, Data,
};

fn bench_circular_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("circular_buffer");

    for size in [64usize, 1024, 16 * 1024].iter() {
        let chunk = vec![0xA5u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("write_read", size), &chunk, |b, chunk| {
            let mut buffer = CircularBuffer::with_capacity(4096);
            let mut out = vec![0u8; chunk.len()];
            b.iter(|| {
                buffer.write(black_box(chunk));
                buffer.read(&mut out).unwrap();
                black_box(&out);
            })
        });
    }

    group.bench_function("wrapping_small_writes", |b| {
        let mut buffer = CircularBuffer::with_capacity(256);
        let mut out = [0u8; 24];
        b.iter(|| {
            for _ in 0..8 {
                buffer.write(black_box(&[1u8; 24]));
            }
            for _ in 0..8 {
                buffer.read(&mut out).unwrap();
            }
        })
    });

    group.finish();
}

fn sample_record() -> (Schema, Data) {
    let schema = RecordSchema::new()
        .with_field("id", Schema::long().shared())
        .with_field("value", Schema::double().shared())
        .with_field(
            "tags",
            Schema::tuple([Schema::string().shared(), Schema::int().shared()]).shared(),
        )
        .finalized();
    let value = schema.make_record(vec![
        Data::Long(42),
        Data::Double(3.25),
        Data::tuple([Data::string("sensor"), Data::Int(7)]),
    ]);
    (Schema::Record(schema), value)
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    let (schema, value) = sample_record();

    group.bench_function("record_to_vec", |b| {
        let mut bytes = Vec::with_capacity(64);
        b.iter(|| {
            bytes.clear();
            schema.serialize(black_box(&value), &mut bytes).unwrap();
        })
    });

    group.bench_function("record_buffer_round_trip", |b| {
        let mut buffer = CircularBuffer::new();
        b.iter(|| {
            schema.serialize(black_box(&value), &mut buffer).unwrap();
            black_box(schema.try_deserialize_buffered(&mut buffer).unwrap());
        })
    });

    for count in [100usize, 1000].iter() {
        let mut bytes = Vec::new();
        for _ in 0..*count {
            schema.serialize(&value, &mut bytes).unwrap();
        }
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("decode_batch", count), &bytes, |b, bytes| {
            b.iter(|| {
                let mut buffer = CircularBuffer::with_capacity(bytes.len());
                buffer.write(bytes);
                let mut n = 0;
                while let Some(v) = schema.try_deserialize_buffered(&mut buffer).unwrap() {
                    black_box(v);
                    n += 1;
                }
                n
            })
        });
    }

    group.finish();
}

fn bench_tag_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag_parsing");

    for operators in [10usize, 100].iter() {
        let mut text = String::from("[Operators numProperties=\"0\"]\n");
        for id in 0..*operators {
            text.push_str(&format!(
                "[|Sequence numProperties=\"2\" name0=\"start\" val0=\"{id}\" name1=\"count\" val1=\"10\"]\
                 [Operator numProperties=\"3\" name0=\"id\" val0=\"{id}\" name1=\"numInputs\" val1=\"0\" name2=\"numOutputs\" val2=\"1\"][/Operator]\n"
            ));
        }
        text.push_str("[/Operators]\n");

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("operators", operators), &text, |b, text| {
            b.iter(|| black_box(parse_str(text).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_circular_buffer,
    bench_serialization,
    bench_tag_parsing
);
criterion_main!(benches);
