//! Benchmarks for fundpanel-growth scoring.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fundpanel_growth::{CompositeGrowthBuilder, StableGrowthEstimator};
use fundpanel_primitives::{EntityId, Period, WidePanel};
use fundpanel_traits::GrowthEstimator;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Quarterly levels compounding at a random annual rate with noise and gaps.
fn random_series(rng: &mut impl Rng, n_periods: usize) -> Vec<f64> {
    let annual = Normal::new(0.08, 0.12).unwrap().sample(rng);
    let noise = Normal::new(0.0, 0.05).unwrap();
    (0..n_periods)
        .map(|q| {
            if rng.r#gen::<f64>() < 0.05 {
                f64::NAN
            } else {
                100.0 * (1.0 + annual).powf(q as f64 / 4.0) * (1.0 + noise.sample(rng))
            }
        })
        .collect()
}

fn random_panel(n_entities: usize, n_periods: usize) -> WidePanel {
    let mut rng = rand::thread_rng();
    let entities = (0..n_entities).map(|i| EntityId::new(format!("{i:06}.SZ"))).collect();
    let start = Period::from_ymd_opt(2010, 3, 31).unwrap_or_default();
    let periods = (0..n_periods).map(|j| start + chrono::Duration::days(91 * j as i64)).collect();
    let mut values = Array2::from_elem((n_entities, n_periods), f64::NAN);
    for mut row in values.rows_mut() {
        row.assign(&Array1::from_vec(random_series(&mut rng, n_periods)));
    }
    WidePanel::new(entities, periods, values).unwrap()
}

fn bench_stable_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("stable_estimate");
    let estimator = StableGrowthEstimator::new();

    for n_periods in [24, 40, 80] {
        group.bench_with_input(BenchmarkId::new("periods", n_periods), &n_periods, |b, &n| {
            let series = Array1::from_vec(random_series(&mut rand::thread_rng(), n));
            b.iter(|| estimator.estimate(black_box(series.view()), black_box(5)));
        });
    }

    group.finish();
}

fn bench_composite_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_build");
    group.sample_size(30);

    for n_entities in [500, 2000, 5000] {
        group.throughput(Throughput::Elements(n_entities as u64));
        group.bench_with_input(
            BenchmarkId::new("entities_x40", n_entities),
            &n_entities,
            |b, &n_entities| {
                let panel = random_panel(n_entities, 40);
                let builder = CompositeGrowthBuilder::new();
                b.iter(|| builder.build(black_box(&panel), "fcfe").unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_stable_estimate, bench_composite_build);

criterion_main!(benches);
