// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Chunked parallel meshing must match a single-threaded run exactly

use anyhow::Result;
use nalgebra::Vector3;
use sdfkit::geometry::analytics::{is_consistently_oriented, is_watertight};
use sdfkit::{
    bend, cube, cuboid, cylinder, orient, repeat, sphere, torus, translate, twist, union,
    BoundingBox, Mesh, MeshConfig, Sdf, X, Y, Z,
};

fn csg_part() -> Result<Sdf> {
    let f = &sphere(1.0)? & &cube(0.75)?;
    let c = cylinder(0.5)?;
    let holes = &(&orient(&c, X)? | &orient(&c, Y)?) | &orient(&c, Z)?;
    Ok(&f - &holes)
}

fn assert_identical(a: &Mesh, b: &Mesh) {
    assert_eq!(a.vertex_count(), b.vertex_count());
    assert_eq!(a.triangle_count(), b.triangle_count());
    assert_eq!(a.triangles, b.triangles);
    for (va, vb) in a.vertices.iter().zip(&b.vertices) {
        assert_eq!(va.position, vb.position);
        assert_eq!(va.normal, vb.normal);
    }
}

fn compare(field: &Sdf, base: MeshConfig) -> Result<Mesh> {
    let serial = field.generate(&base.clone().workers(1).chunk_size(64))?;
    let chunked = field.generate(&base.clone().workers(4).chunk_size(8))?;
    let odd = field.generate(&base.workers(3).chunk_size(5))?;
    assert_identical(&serial, &chunked);
    assert_identical(&serial, &odd);
    Ok(serial)
}

#[test]
fn test_chunked_matches_serial() -> Result<()> {
    let bounds = BoundingBox::symmetric(Vector3::repeat(1.25));
    let mesh = compare(&csg_part()?, MeshConfig::with_step(0.05).bounds(bounds))?;
    assert!(mesh.triangle_count() > 1000);
    assert!(is_watertight(&mesh));
    assert!(is_consistently_oriented(&mesh));
    Ok(())
}

#[test]
fn test_dense_and_sparse_agree() -> Result<()> {
    let field = union(
        &torus(1.0, 0.3)?,
        &translate(&sphere(0.5)?, Vector3::new(0.0, 0.0, 0.8))?,
        0.2,
    )?;
    let config = MeshConfig::with_step(0.04);
    let sparse = compare(&field, config.clone())?;
    let dense = compare(&field, config.sparse(false))?;
    assert_identical(&sparse, &dense);
    Ok(())
}

#[test]
fn test_dense_and_sparse_agree_on_warped_fields() -> Result<()> {
    let bar = cuboid(Vector3::new(1.0, 0.2, 1.0))?;
    let bounds = BoundingBox::symmetric(Vector3::repeat(1.5));
    let fields = [
        twist(&bar, 1.5)?,
        bend(&bar, 0.8)?,
        repeat(&sphere(0.3)?, Vector3::new(0.8, 0.0, 0.0), Some([1, 0, 0]))?,
    ];
    for field in &fields {
        assert!(!field.is_distance_bound());
        let config = MeshConfig::with_step(0.05).bounds(bounds).chunk_size(8);
        let (sparse, stats) = field.generate_with_stats(&config)?;
        let dense = field.generate(&config.sparse(false))?;
        assert_eq!(stats.sampling.skipped_blocks, 0);
        assert!(sparse.triangle_count() > 0);
        assert_identical(&sparse, &dense);
    }
    Ok(())
}

#[test]
fn test_single_chunk_grid() -> Result<()> {
    // The whole grid fits in one chunk
    let mesh = compare(&sphere(0.3)?, MeshConfig::with_step(0.1))?;
    assert!(is_watertight(&mesh));
    Ok(())
}
