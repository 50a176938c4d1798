use criterion::{black_box, criterion_group, criterion_main, Criterion};
use datalake_ingest::ingestion::csv::load_csv_from_bytes;
use datalake_ingest::ingestion::{normalize, write_parquet, ParquetCompression, ParquetWriteOptions};

fn sample_csv(rows: usize) -> Vec<u8> {
    let mut out = String::from("id,name,score,active,region\n");
    for i in 0..rows {
        out.push_str(&format!(
            "{i},user_{i},{}.{},{},{}\n",
            i % 100,
            i % 10,
            i % 2 == 0,
            ["north", "south", "east", "west"][i % 4]
        ));
    }
    out.into_bytes()
}

fn bench_csv_to_parquet(c: &mut Criterion) {
    let csv = sample_csv(10_000);

    c.bench_function("load_csv_10k", |b| {
        b.iter(|| load_csv_from_bytes(black_box(&csv)).unwrap())
    });

    c.bench_function("normalize_10k", |b| {
        b.iter_batched(
            || load_csv_from_bytes(&csv).unwrap(),
            |frame| normalize(black_box(frame)),
            criterion::BatchSize::SmallInput,
        )
    });

    let normalized = normalize(load_csv_from_bytes(&csv).unwrap());
    for compression in [ParquetCompression::Snappy, ParquetCompression::Uncompressed] {
        let opts = ParquetWriteOptions { compression };
        c.bench_function(&format!("write_parquet_10k_{compression}"), |b| {
            b.iter(|| write_parquet(black_box(&normalized), &opts).unwrap())
        });
    }
}

criterion_group!(benches, bench_csv_to_parquet);
criterion_main!(benches);
