use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cosmic_atlas::algorithms::matching::{CatalogEntry, CatalogIndex, MatchCriteria, SpatialMatcher};
use cosmic_atlas::core::domain::{Measurement, SkyPosition};
use qtty::Degrees;
use rayon::prelude::*;
use std::hint::black_box;

// Low-discrepancy sky positions, uniform in area
fn sky(i: usize, n: usize) -> SkyPosition {
    let golden = 0.618_033_988_749_895;
    let u = (i as f64 * golden).fract();
    let v = (i as f64 + 0.5) / n as f64;
    let ra = 360.0 * u;
    let dec = (1.0 - 2.0 * v).clamp(-1.0, 1.0).asin().to_degrees();
    SkyPosition::new(Degrees::new(ra), Degrees::new(dec)).unwrap()
}

fn entries(n: usize) -> Vec<CatalogEntry> {
    (0..n)
        .map(|i| CatalogEntry {
            native_id: format!("{}", 1_000_000 + i),
            numeric_id: Some(1_000_000 + i as u64),
            sky: sky(i, n),
            magnitude: Measurement::Known(10.0 + (i % 7) as f64),
            quality: Measurement::Known(1.0),
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_index");

    for n in [1_000usize, 10_000, 100_000] {
        let rows = entries(n);
        group.bench_with_input(BenchmarkId::new("build", n), &rows, |b, rows| {
            b.iter(|| CatalogIndex::build("gaia", black_box(rows.clone()), Some(1)));
        });
    }

    group.finish();
}

fn bench_match_anchor(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_anchor");

    let index = CatalogIndex::build("gaia", entries(100_000), Some(1));
    let matcher = SpatialMatcher::new(&index, MatchCriteria::new(2.0, Some(1.4)));
    let anchors: Vec<SkyPosition> = index.entries().iter().take(5_000).map(|e| e.sky).collect();

    group.bench_function("by_position_5000", |b| {
        b.iter(|| {
            for anchor in &anchors {
                black_box(matcher.match_anchor(black_box(anchor), None, 1));
            }
        });
    });

    group.bench_function("by_position_5000_parallel", |b| {
        b.iter(|| {
            let matched: Vec<_> = anchors
                .par_iter()
                .map(|anchor| matcher.match_anchor(anchor, None, 1))
                .collect();
            black_box(matched)
        });
    });

    group.bench_function("by_identifier_5000", |b| {
        b.iter(|| {
            for (i, anchor) in anchors.iter().enumerate() {
                black_box(matcher.match_anchor(anchor, Some(1_000_000 + i as u64), 1));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_match_anchor);
criterion_main!(benches);
