//! Round engine benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fieldwave_coordination::{hop_diameter, stable_diameter};
use fieldwave_core::{DeviceId, LogicalTime};
use fieldwave_runtime::{Context, RuntimeConfig};
use fieldwave_sim::{Network, Topology};

fn program(ctx: &mut Context<'_>) -> (f64, f64) {
    let source = ctx.uid() == DeviceId::new(0);
    let hop = hop_diameter(ctx, 30.0);
    let stable = stable_diameter(ctx, source);
    (hop.diameter, stable.diameter)
}

/// Grid network after `rounds` synchronous rounds
fn warmed_grid(side: usize, rounds: usize) -> Network {
    let config = RuntimeConfig::new(3.0).unwrap();
    let mut network = Network::new(Topology::grid(side, side, 1.0), config).unwrap();
    for round in 0..rounds {
        network
            .step(LogicalTime::from_secs(round as f64), &program)
            .unwrap();
    }
    network
}

fn bench_network_step(c: &mut Criterion) {
    let mut network = warmed_grid(10, 30);
    let mut time = 30.0;
    c.bench_function("grid_10x10_step", |b| {
        b.iter(|| {
            time += 1.0;
            black_box(network.step(LogicalTime::from_secs(time), &program).unwrap())
        })
    });

    let mut network = warmed_grid(10, 30);
    let mut time = 30.0;
    c.bench_function("grid_10x10_step_parallel_4", |b| {
        b.iter(|| {
            time += 1.0;
            black_box(
                network
                    .step_parallel(LogicalTime::from_secs(time), &program, 4)
                    .unwrap(),
            )
        })
    });
}

fn bench_single_round(c: &mut Criterion) {
    let mut network = warmed_grid(5, 20);
    let inner = DeviceId::new(12);
    let mut time = 20.0;
    c.bench_function("device_round_inner", |b| {
        b.iter(|| {
            time += 1.0;
            black_box(
                network
                    .run_device_round(inner, LogicalTime::from_secs(time), &program)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_network_step, bench_single_round);
criterion_main!(benches);
