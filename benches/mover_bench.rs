//! Benchmarks for per-frame field-line motion.

#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fieldlines::motion::{blend_key_frame, fade_alpha};
use fieldlines::state::NO_NEXT_KEY_FRAME;
use fieldlines::{Fieldline, FieldlinesState, LineMover, Topology};
use glam::Vec3;
use std::hint::black_box;

const POINTS: usize = 100;

fn key_frames(x0: f32, topologies: &[Topology]) -> Vec<Fieldline> {
    let last = topologies.len() - 1;
    topologies
        .iter()
        .enumerate()
        .map(|(j, &topology)| {
            let vertices = (0..POINTS)
                .map(|v| Vec3::new(x0 + j as f32, v as f32 * 0.1, (v as f32 * 0.3).sin()))
                .collect();
            let dt = if j == last { NO_NEXT_KEY_FRAME } else { 30.0 };
            Fieldline::new(vertices, topology, dt)
        })
        .collect()
}

/// `pairs` matched pairs that change from closed to open halfway.
fn matched_state(pairs: usize) -> FieldlinesState {
    let topologies: Vec<Topology> = (0..40)
        .map(|j| if j < 20 { Topology::Closed } else { Topology::Open })
        .collect();
    let mut state = FieldlinesState::new();
    for i in 0..pairs {
        let first = key_frames(i as f32, &topologies);
        let second = key_frames(-(i as f32), &topologies);
        state.add_matching_path_lines(
            first.iter().map(|k| k.vertices[0]).collect(),
            20,
            second.iter().map(|k| k.vertices[0]).collect(),
            20,
            0.0,
        );
        for (k1, k2) in first.into_iter().zip(second) {
            state.add_matching_key_frames(k1, k2, i).unwrap();
        }
        state.set_death_times(1170.0, 1170.0, i).unwrap();
    }
    state.initialize_rendered_matching_fieldlines().unwrap();
    state
}

fn fade_benchmark(c: &mut Criterion) {
    let _ = c.bench_function("fade_alpha", |b| {
        b.iter(|| black_box(fade_alpha(black_box(42.0), 0.0, 100.0, 5.0)))
    });
}

fn blend_benchmark(c: &mut Criterion) {
    let first: Vec<Vec3> = (0..POINTS / 2).map(|v| Vec3::new(0.0, v as f32, 0.0)).collect();
    let second: Vec<Vec3> = (0..POINTS / 2).map(|v| Vec3::new(v as f32, 50.0, 0.0)).collect();
    let _ = c.bench_function("blend_key_frame", |b| {
        b.iter(|| black_box(blend_key_frame(black_box(&first), black_box(&second), POINTS)))
    });
}

fn mover_update_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mover_update");

    for pairs in [10, 50, 200] {
        let state = matched_state(pairs);
        let _ = group.bench_with_input(BenchmarkId::from_parameter(pairs), &state, |b, state| {
            let mut mover = LineMover::new(state, 5.0).unwrap();
            let mut time = 0.0;
            b.iter(|| {
                // Sweep back and forth so the lines never park at an end.
                let next = if time >= 1000.0 { 0.0 } else { time + 1.0 };
                mover.update(state, next, time);
                time = next;
                black_box(mover.alpha().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, fade_benchmark, blend_benchmark, mover_update_benchmark);
criterion_main!(benches);
