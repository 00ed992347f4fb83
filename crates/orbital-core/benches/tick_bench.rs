use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orbital_core::prelude::*;

fn populated(players: usize) -> Simulation {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    for i in 0..players {
        let id = PlayerId::new(format!("player-{i}"));
        sim.create_player(&id, "bench").unwrap();
    }
    sim
}

fn bench_tick_small(c: &mut Criterion) {
    let mut sim = populated(10);
    c.bench_function("tick_10_players", |b| {
        b.iter(|| sim.tick(black_box(1.0)).unwrap())
    });
}

fn bench_tick_large(c: &mut Criterion) {
    // Production is the per-planet hot path
    let mut sim = populated(500);
    c.bench_function("tick_500_players", |b| {
        b.iter(|| sim.tick(black_box(1.0)).unwrap())
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let sim = populated(100);
    c.bench_function("snapshot_100_players", |b| {
        b.iter(|| black_box(sim.snapshot().unwrap()))
    });
}

criterion_group!(benches, bench_tick_small, bench_tick_large, bench_snapshot);
criterion_main!(benches);
