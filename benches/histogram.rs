use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use mergehist::Histogram;

fn histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");

    group.throughput(Throughput::Elements(1));

    let mut histogram = Histogram::new();

    group.bench_function("increment (linear)", |b| b.iter(|| histogram.increment(1)));
    group.bench_function("increment (log)", |b| {
        b.iter(|| histogram.increment(95633239299398))
    });

    let mut histogram = Histogram::new();
    let _ = histogram.increment(u64::MAX);

    group.bench_function("percentile", |b| b.iter(|| histogram.percentile(100.0)));

    let mut histogram = Histogram::new();
    for value in 0..1_000_000u64 {
        let _ = histogram.increment(value % 100_000);
    }

    group.bench_function("rank", |b| b.iter(|| histogram.rank(50_000)));
}

fn snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    let mut histogram = Histogram::new();
    for value in 0..1_000_000u64 {
        let _ = histogram.increment(value % 100_000);
    }

    group.bench_function("encode", |b| b.iter(|| histogram.snapshot()));

    let snapshot = histogram.snapshot();

    group.bench_function("decode", |b| b.iter(|| Histogram::from_snapshot(&snapshot)));
    group.bench_function("percentile", |b| b.iter(|| snapshot.percentile(99.0)));
}

fn merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let mut a = Histogram::new();
    let mut b = Histogram::new();
    for value in 0..100_000u64 {
        let _ = a.increment(value % 10_000);
        let _ = b.increment(value % 90_000);
    }
    let snapshot = b.snapshot();

    group.bench_function("live + live", |bench| bench.iter(|| a.merge(&b)));
    group.bench_function("live + serialized", |bench| {
        bench.iter(|| a.merge_snapshot(&snapshot))
    });
    group.bench_function("serialized + serialized", |bench| {
        let other = a.snapshot();
        bench.iter(|| other.merge(&snapshot))
    });
}

criterion_group!(benches, histogram, snapshot, merge);
criterion_main!(benches);
