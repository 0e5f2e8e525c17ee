// Encode/decode throughput benchmarks for the yxdb codec

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::io::Cursor;
use yxdb::{Field, FieldType, FieldValue, Record, RecordInfo, YxdbReader, YxdbWriter};

fn sample_schema() -> RecordInfo {
    RecordInfo::new(vec![
        Field::new("id", FieldType::Int32),
        Field::sized("name", FieldType::String, 16),
        Field::new("score", FieldType::Double),
    ])
}

fn sample_records(count: usize) -> Vec<Record> {
    use rand::Rng;
    let mut rng = rand::rng();

    (0..count)
        .map(|i| {
            Record::new(vec![
                FieldValue::Int32(Some(i as i32)),
                FieldValue::String(Some(format!("name{:08}", rng.random::<u32>() % 10_000))),
                FieldValue::Double(Some(rng.random())),
            ])
        })
        .collect()
}

fn encode_image(schema: &RecordInfo, records: &[Record]) -> Vec<u8> {
    let mut writer = YxdbWriter::new(Cursor::new(Vec::new()), schema.clone(), "bench").unwrap();
    for record in records {
        writer.write_record(record).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_records");
    let schema = sample_schema();

    for size in [1_000, 10_000, 100_000].iter() {
        let records = sample_records(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(encode_image(&schema, &records));
            });
        });
    }

    group.finish();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_records");
    let schema = sample_schema();

    for size in [1_000, 10_000, 100_000].iter() {
        let image = encode_image(&schema, &sample_records(*size));
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut reader = YxdbReader::new(Cursor::new(&image[..])).unwrap();
                let mut count = 0u64;
                while let Some(record) = reader.next_record().unwrap() {
                    black_box(&record);
                    count += 1;
                }
                black_box(count);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_write, benchmark_read);
criterion_main!(benches);
