//! Sampling order x table consistency on a synthetic FrozenLake-sized trace
//!
//! Compares wall-clock cost of the three visit orders under each shared-table
//! consistency mode and under replicated tables.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qrace::builders::SchedulerBuilder;
use qrace::experience::{ExperienceBuffer, Transition};
use qrace::sampling::SamplingKind;
use qrace::table::{Consistency, MergeStrategy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution};

const STATES: usize = 16;
const ACTIONS: usize = 4;
const SAMPLES: usize = 64_000;
const EPISODES: usize = 10;

/// Random walk on a 4x4 grid with a rewarding goal in the corner
fn synthetic_trace() -> ExperienceBuffer {
    let mut rng = StdRng::seed_from_u64(2024);
    let slip = Bernoulli::new(0.1).unwrap();
    let mut state = 0usize;
    (0..SAMPLES)
        .map(|_| {
            let action = rng.gen_range(0..ACTIONS);
            let moved = if slip.sample(&mut rng) { rng.gen_range(0..ACTIONS) } else { action };
            let next_state = match moved {
                0 if state % 4 > 0 => state - 1,
                1 if state < 12 => state + 4,
                2 if state % 4 < 3 => state + 1,
                3 if state >= 4 => state - 4,
                _ => state,
            };
            let reward = if next_state == STATES - 1 { 1.0 } else { 0.0 };
            let transition = Transition::new(state, action, reward, next_state);
            state = if next_state == STATES - 1 { 0 } else { next_state };
            transition
        })
        .collect()
}

fn workers() -> usize {
    num_cpus::get().clamp(1, 16)
}

fn bench_shared(c: &mut Criterion) {
    let buffer = synthetic_trace();
    let mut group = c.benchmark_group("shared");
    group.sample_size(10);

    for consistency in [Consistency::Racy, Consistency::Locked, Consistency::Atomic] {
        for sampling in [SamplingKind::Sequential, SamplingKind::Random, SamplingKind::Stride] {
            let scheduler = SchedulerBuilder::new()
                .dimensions(STATES, ACTIONS)
                .workers(workers())
                .episodes(EPISODES)
                .sampling(sampling)
                .shared(consistency)
                .build()
                .unwrap();
            group.bench_with_input(
                BenchmarkId::new(consistency.to_string(), sampling),
                &scheduler,
                |b, scheduler| b.iter(|| scheduler.run(&buffer).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_replicated(c: &mut Criterion) {
    let buffer = synthetic_trace();
    let mut group = c.benchmark_group("replicated");
    group.sample_size(10);

    for merge in [MergeStrategy::None, MergeStrategy::Average] {
        for sampling in [SamplingKind::Sequential, SamplingKind::Random, SamplingKind::Stride] {
            let scheduler = SchedulerBuilder::new()
                .dimensions(STATES, ACTIONS)
                .workers(workers())
                .episodes(EPISODES)
                .sampling(sampling)
                .replicated(merge)
                .build()
                .unwrap();
            group.bench_with_input(
                BenchmarkId::new(merge.to_string(), sampling),
                &scheduler,
                |b, scheduler| b.iter(|| scheduler.run(&buffer).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_shared, bench_replicated);
criterion_main!(benches);
