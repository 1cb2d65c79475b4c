// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics on extracted meshes

use anyhow::Result;
use nalgebra::Vector3;
use sdfkit::{analyze, cuboid, sphere, torus, MeshConfig, PI};

#[test]
fn test_sphere_volume_and_surface_area() -> Result<()> {
    let radius: f64 = 1.0;
    let mesh = sphere(radius)?.generate(&MeshConfig::with_step(0.04))?;
    let stats = analyze(&mesh);

    let volume = 4.0 / 3.0 * PI * radius.powi(3);
    let area = 4.0 * PI * radius.powi(2);
    assert!(
        ((stats.volume - volume) / volume).abs() < 0.01,
        "volume {} not close to {}",
        stats.volume,
        volume
    );
    assert!(
        ((stats.surface_area - area) / area).abs() < 0.03,
        "surface area {} not close to {}",
        stats.surface_area,
        area
    );
    assert!(stats.centroid.iter().all(|c| c.abs() < 1e-3));
    assert!(stats.is_watertight);
    assert!(stats.is_consistently_oriented);
    Ok(())
}

#[test]
fn test_box_volume() -> Result<()> {
    let half = Vector3::new(1.0, 0.5, 0.25);
    let mesh = cuboid(half)?.generate(&MeshConfig::with_step(0.025))?;
    let stats = analyze(&mesh);

    // Edges and corners are chamfered by at most one cell
    let exact = 8.0 * half.x * half.y * half.z;
    assert!(stats.volume < exact + 1e-9);
    assert!(stats.volume > 0.9 * exact, "volume {}", stats.volume);
    assert!(stats.bbox[3] <= 1.0 + 1e-9 && stats.bbox[3] > 0.95);
    Ok(())
}

#[test]
fn test_torus_volume() -> Result<()> {
    let (major, minor) = (1.0, 0.3);
    let mesh = torus(major, minor)?.generate(&MeshConfig::with_step(0.03))?;
    let stats = analyze(&mesh);

    let volume = 2.0 * PI * PI * major * minor * minor;
    assert!(((stats.volume - volume) / volume).abs() < 0.02, "volume {}", stats.volume);
    assert!(stats.is_watertight);
    Ok(())
}
