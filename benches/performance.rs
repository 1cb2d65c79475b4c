// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;
use sdfkit::{cube, cylinder, orient, sphere, MeshConfig, Sdf, X, Y, Z};

fn csg_part() -> Sdf {
    let f = &sphere(1.0).unwrap() & &cube(0.75).unwrap();
    let c = cylinder(0.5).unwrap();
    let holes = &(&orient(&c, X).unwrap() | &orient(&c, Y).unwrap()) | &orient(&c, Z).unwrap();
    &f - &holes
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let source = r#"
        let c = cylinder(0.5);
        sphere(1) & box(0.75) - (orient(c, X) | orient(c, Y) | orient(c, Z))
    "#;
    group.bench_with_input(BenchmarkId::new("csg_part", ""), &source, |b, source| {
        b.iter(|| sdfkit::parse_scene(black_box(source)).unwrap());
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let field = csg_part();
    let points: Vec<Point3<f64>> = (0..4096)
        .map(|i| {
            let t = i as f64 / 4096.0;
            Point3::new(2.0 * t - 1.0, (t * 37.0).sin(), (t * 91.0).cos())
        })
        .collect();

    group.bench_function("scalar", |b| {
        b.iter(|| {
            points
                .iter()
                .map(|p| field.evaluate(black_box(p)))
                .sum::<f64>()
        });
    });

    group.bench_function("batch", |b| {
        b.iter(|| field.evaluate_batch(black_box(&points)));
    });

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(10);

    let part = csg_part();
    for step in [0.05, 0.025] {
        group.bench_with_input(BenchmarkId::new("csg_part", step), &step, |b, &step| {
            b.iter(|| part.generate(&MeshConfig::with_step(step)).unwrap());
        });
    }

    let ball = sphere(1.0).unwrap();
    group.bench_function("sphere_dense", |b| {
        b.iter(|| {
            ball.generate(&MeshConfig::with_step(0.05).sparse(false))
                .unwrap()
        });
    });
    group.bench_function("sphere_sparse", |b| {
        b.iter(|| ball.generate(&MeshConfig::with_step(0.05)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_generate);
criterion_main!(benches);
