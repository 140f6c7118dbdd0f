/*
 * Flocking Benchmark
 *
 * Measures the pieces of a tick separately (spatial hash build, neighbor
 * queries) and the full parallel step, for several population sizes.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flocking::{FlockSimulation, QueryBuffer, SimulationParams, SpatialHash};
use glam::Vec3;
use std::time::Duration;

const POPULATIONS: [usize; 4] = [1000, 5000, 10000, 20000];

fn params(num_boids: usize) -> SimulationParams {
    SimulationParams {
        num_boids,
        max_agents: num_boids,
        ..SimulationParams::default()
    }
}

fn positions(num_boids: usize) -> Vec<Vec3> {
    let sim = FlockSimulation::new(params(num_boids)).unwrap();
    sim.initialize(num_boids).unwrap().iter().map(|b| b.position).collect()
}

// Benchmark the counting-sort build
fn bench_spatial_hash_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_hash_build");

    for &n in POPULATIONS.iter() {
        let points = positions(n);
        let mut hash = SpatialHash::new(50.0, n).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| hash.build(black_box(points)).unwrap());
        });
    }

    group.finish();
}

// Benchmark one radius query per boid against a built hash
fn bench_neighbor_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_queries");

    for &n in POPULATIONS.iter() {
        let points = positions(n);
        let mut hash = SpatialHash::new(50.0, n).unwrap();
        hash.build(&points).unwrap();
        let mut buffer = QueryBuffer::with_capacity(64);

        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| {
                let mut total = 0;
                for &p in points {
                    total += hash.query_with(points, p, 50.0, &mut buffer).len();
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

// Benchmark the full step: build, parallel steering and integration
fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for &n in POPULATIONS.iter() {
        let mut sim = FlockSimulation::new(params(n)).unwrap();
        let current = sim.initialize(n).unwrap();
        let mut next = Vec::with_capacity(n);

        group.bench_with_input(BenchmarkId::from_parameter(n), &current, |b, current| {
            b.iter(|| sim.step_into(black_box(current), &mut next).unwrap());
        });
    }

    group.finish();
}

// Configure the benchmarks
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_spatial_hash_build, bench_neighbor_queries, bench_step
}

criterion_main!(benches);
