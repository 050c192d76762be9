use mergehist::Histogram;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn recorded(values: impl IntoIterator<Item = u64>) -> Histogram {
    let mut histogram = Histogram::new();
    for value in values {
        histogram.increment(value).unwrap();
    }
    histogram
}

#[test]
fn merging_disjoint_ranges() {
    let a = recorded(1..=50);
    let b = recorded(51..=100);

    let merged = a.merge(&b).unwrap();
    assert_eq!(merged.count(), 100);
    assert_eq!(merged.min(), 1);
    assert_eq!(merged.max(), 100);

    let p50 = merged.percentile(50.0).unwrap();
    assert!((p50 - 50.0).abs() <= 1.0, "p50 was {p50}");
}

#[test]
fn every_merge_variant_agrees() {
    let mut rng = StdRng::seed_from_u64(0xda7a);
    let mut a = Histogram::new();
    let mut b = Histogram::new();
    for _ in 0..50_000 {
        a.increment(rng.gen_range(1..100_000)).unwrap();
        b.increment(rng.gen_range(500..5_000_000)).unwrap();
    }

    let live = a.merge(&b).unwrap();
    let live_and_bytes = a.merge_snapshot(&b.snapshot()).unwrap();
    let bytes_and_bytes = a.snapshot().merge(&b.snapshot()).unwrap();

    let mut in_place = a.clone();
    in_place.merge_from(&b).unwrap();

    let mut in_place_from_bytes = a.clone();
    in_place_from_bytes.merge_from_snapshot(&b.snapshot()).unwrap();

    let variants = [
        &live_and_bytes,
        &bytes_and_bytes,
        &in_place,
        &in_place_from_bytes,
    ];

    for merged in variants {
        assert_eq!(merged.count(), live.count());
        assert_eq!(merged.min(), live.min());
        assert_eq!(merged.max(), live.max());

        for p in [10.0, 50.0, 90.0, 99.0, 99.9] {
            let expected = live.percentile(p).unwrap();
            let actual = merged.percentile(p).unwrap();
            assert!(
                (actual - expected).abs() <= expected * 0.02,
                "p{p}: {expected} vs {actual}"
            );
        }
    }
}

#[test]
fn merge_accumulates_overlapping_buckets() {
    let a = recorded([100, 100, 100]);
    let b = recorded([100, 100]);

    let merged = a.merge(&b).unwrap();
    assert_eq!(merged.count(), 5);
    assert_eq!(merged.min(), 100);
    assert_eq!(merged.max(), 100);

    // all five observations share one bucket
    let counts: Vec<u64> = merged.buckets().map(|bucket| bucket.count()).collect();
    assert_eq!(counts, vec![5]);
}

#[test]
fn repeated_in_place_merging_converges() {
    let mut combined = Histogram::new();
    let mut reference = Histogram::new();

    for shard in 0..10u64 {
        let mut rng = StdRng::seed_from_u64(shard);
        let mut worker = Histogram::new();
        for _ in 0..10_000 {
            let value = rng.gen_range(1..1_000_000);
            worker.increment(value).unwrap();
            reference.increment(value).unwrap();
        }
        combined.merge_from_snapshot(&worker.snapshot()).unwrap();
    }

    assert_eq!(combined.count(), reference.count());
    assert_eq!(combined.min(), reference.min());
    assert_eq!(combined.max(), reference.max());
    assert_eq!(
        combined.percentiles(&[50.0, 99.0]).unwrap(),
        reference.percentiles(&[50.0, 99.0]).unwrap()
    );
}
