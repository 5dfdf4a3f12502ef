use criterion::{black_box, criterion_group, criterion_main, Criterion};
use yara_core::{DistanceMatrix, OrdinationConfig, OrdinationMethod, RarefactionCurve};
use yara_stats::beta::ordinate;
use yara_stats::rarefaction::recommend_depth;

fn random_points(n: usize, dims: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            (0..dims)
                .map(|_| {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                    (state >> 11) as f64 / (1u64 << 53) as f64
                })
                .collect()
        })
        .collect()
}

fn euclidean_matrix(n: usize, seed: u64) -> DistanceMatrix {
    let points = random_points(n, 5, seed);
    let rows: Vec<Vec<f64>> = points
        .iter()
        .map(|a| {
            points
                .iter()
                .map(|b| {
                    a.iter()
                        .zip(b)
                        .map(|(x, y)| (x - y) * (x - y))
                        .sum::<f64>()
                        .sqrt()
                })
                .collect()
        })
        .collect();
    let ids = (0..n).map(|i| format!("S{}", i)).collect();
    DistanceMatrix::new(ids, rows).expect("euclidean distances form a valid matrix")
}

fn bench_ordinate(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordinate");
    group.sample_size(10);

    let matrix = euclidean_matrix(100, 42);
    let smacof = OrdinationConfig::default();
    group.bench_function("smacof_100_samples", |b| {
        b.iter(|| ordinate(black_box(&matrix), 2, &smacof))
    });

    let pcoa = OrdinationConfig {
        method: OrdinationMethod::Pcoa,
        ..Default::default()
    };
    group.bench_function("pcoa_100_samples", |b| {
        b.iter(|| ordinate(black_box(&matrix), 2, &pcoa))
    });

    group.finish();
}

fn bench_recommend_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend_depth");

    // 200 samples × up to 50 depths, deeper samples drop out progressively
    let curves: Vec<RarefactionCurve> = (0..200u64)
        .map(|s| {
            let max_step = 10 + s % 40;
            let points = (1..=max_step).map(|k| {
                let depth = k * 1000;
                (depth, 500.0 * (1.0 - (-(k as f64) / 8.0).exp()))
            });
            RarefactionCurve::new(format!("S{}", s), points).expect("valid curve")
        })
        .collect();

    group.bench_function("200_samples", |b| {
        b.iter(|| recommend_depth(black_box(&curves), 0.8))
    });

    group.finish();
}

criterion_group!(benches, bench_ordinate, bench_recommend_depth);
criterion_main!(benches);
