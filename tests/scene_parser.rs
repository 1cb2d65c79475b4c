// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene descriptions evaluate to the same fields as the builder API

use anyhow::Result;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdfkit::{
    capped_cylinder, circular_array, cube, cylinder, dilate, import_scene_file, orient,
    parse_scene, radians, rotate, shell, sphere, translate, twist, union, Sdf, X, Y, Z,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn assert_same_field(a: &Sdf, b: &Sdf) {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let p = Point3::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
        );
        assert_eq!(a.evaluate(&p), b.evaluate(&p), "at {:?}", p);
    }
}

#[test]
fn test_csg_example() -> Result<()> {
    let parsed = parse_scene(
        "# sphere clipped by a cube, drilled on three axes
         let f = sphere(1.0) & box(0.75);
         let c = cylinder(0.5);
         f - (orient(c, X) | orient(c, Y) | orient(c, Z))",
    )?;

    let f = &sphere(1.0)? & &cube(0.75)?;
    let c = cylinder(0.5)?;
    let holes = &(&orient(&c, X)? | &orient(&c, Y)?) | &orient(&c, Z)?;
    let built = &f - &holes;

    assert_same_field(&parsed, &built);
    Ok(())
}

#[test]
fn test_transforms_and_modifiers() -> Result<()> {
    let parsed = parse_scene(
        "let post = capped_cylinder(r=0.2, h=1.5);
         let ring = circular_array(translate(post, [0, 0, 0.75]), 6, offset=1);
         union(shell(sphere(0.6), 0.05), twist(rotate(ring, radians(30)), 0.5), k=0.1)",
    )?;

    let post = capped_cylinder(0.2, 1.5)?;
    let ring = circular_array(&translate(&post, Vector3::new(0.0, 0.0, 0.75))?, 6, 1.0)?;
    let built = union(
        &shell(&sphere(0.6)?, 0.05)?,
        &twist(&rotate(&ring, radians(30.0), Z)?, 0.5)?,
        0.1,
    )?;

    assert_same_field(&parsed, &built);
    Ok(())
}

#[test]
fn test_vector_arithmetic() -> Result<()> {
    let parsed = parse_scene("dilate(translate(sphere(0.5), (X + Y) / 2 - Z * 0.25), 0.1)")?;
    let built = dilate(
        &translate(&sphere(0.5)?, Vector3::new(0.5, 0.5, -0.25))?,
        0.1,
    )?;
    assert_same_field(&parsed, &built);
    Ok(())
}

#[test]
fn test_import_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "let r = 0.8;")?;
    writeln!(file, "let body = sphere(r);")?;
    writeln!(file, "body - translate(sphere(r), [r, 0, 0]);")?;

    let sdf = import_scene_file(file.path())?;
    assert!(sdf.evaluate(&Point3::new(-0.5, 0.0, 0.0)) < 0.0);
    assert!(sdf.evaluate(&Point3::new(0.5, 0.0, 0.0)) > 0.0);
    Ok(())
}

#[test]
fn test_errors_carry_location() {
    let err = parse_scene("let a = sphere(1);\nlet b = cube(-1);\na | b").unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("binding `b`"), "{}", message);
    assert!(message.contains("line 2"), "{}", message);
    assert!(message.contains("must be positive"), "{}", message);

    let syntax = parse_scene("sphere(1) |").unwrap_err();
    assert!(format!("{:#}", syntax).contains("Failed to parse scene"));
}
