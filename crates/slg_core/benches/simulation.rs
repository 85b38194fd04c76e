//! Benchmarks for the hot paths of slg_core.
//!
//! Run with: `cargo bench -p slg_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slg_core::economy::settle_at;
use slg_core::model::Player;
use slg_core::tables::Balance;
use slg_test_utils::fixtures::{sample_map, START};

/// Settlement after an hour and after a month offline.
pub fn settlement_benchmark(c: &mut Criterion) {
    let balance = Balance::default();
    let player = Player::new("bench", "bench", START);

    c.bench_function("settle_one_hour", |b| {
        b.iter(|| {
            let mut p = player.clone();
            black_box(settle_at(&balance, &mut p, black_box(START + 3_600)))
        })
    });
    c.bench_function("settle_thirty_days", |b| {
        b.iter(|| {
            let mut p = player.clone();
            black_box(settle_at(&balance, &mut p, black_box(START + 30 * 86_400)))
        })
    });
}

/// Longest and unreachable routes on the sample map.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let map = sample_map();

    c.bench_function("shortest_path_cross_map", |b| {
        b.iter(|| black_box(map.shortest_path(black_box("成都"), black_box("建业"))))
    });
    c.bench_function("shortest_path_unreachable", |b| {
        b.iter(|| black_box(map.shortest_path(black_box("成都"), black_box("夷州"))))
    });
}

/// Pricing a full ramp of draws.
pub fn draw_cost_benchmark(c: &mut Criterion) {
    let balance = Balance::default();

    c.bench_function("draw_cost_ramp", |b| {
        b.iter(|| {
            (1..=20)
                .map(|n| balance.draw_cost(black_box(n)))
                .fold(0u64, |acc, cost| acc + cost.grain)
        })
    });
}

criterion_group!(
    benches,
    settlement_benchmark,
    pathfinding_benchmark,
    draw_cost_benchmark
);
criterion_main!(benches);
