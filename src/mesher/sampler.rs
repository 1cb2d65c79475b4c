// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parallel field sampling
//!
//! The grid is cut into z-slabs of `chunk_size` point layers, each slab into
//! `chunk_size`² blocks. One rayon task owns one slab, evaluates all of its
//! blocks with a single batched call and writes only its own slice of the
//! value buffer.

use super::config::MeshConfig;
use super::grid::{GridSpec, SampleGrid};
use crate::field::Sdf;
use nalgebra::Point3;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Counters collected while sampling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleStats {
    pub blocks: usize,
    pub skipped_blocks: usize,
    pub evaluated_points: usize,
}

impl SampleStats {
    fn merge(self, other: SampleStats) -> SampleStats {
        SampleStats {
            blocks: self.blocks + other.blocks,
            skipped_blocks: self.skipped_blocks + other.skipped_blocks,
            evaluated_points: self.evaluated_points + other.evaluated_points,
        }
    }
}

/// Evaluate `field` at every point of `spec`
pub fn sample(field: &Sdf, spec: GridSpec, config: &MeshConfig) -> (SampleGrid, SampleStats) {
    let [nx, ny, _] = spec.dims;
    let chunk = config.chunk_size.max(1);
    let mut values = vec![0.0; spec.point_count()];

    let sparse = config.sparse && field.is_distance_bound();
    if config.sparse && !sparse {
        debug!("Field may overestimate distance, sampling every block");
    }

    let stats = values
        .par_chunks_mut(nx * ny * chunk)
        .enumerate()
        .map(|(slab_index, slab)| {
            sample_slab(field, &spec, config, sparse, slab_index * chunk, slab)
        })
        .reduce(SampleStats::default, SampleStats::merge);

    (SampleGrid::new(spec, values), stats)
}

fn sample_slab(
    field: &Sdf,
    spec: &GridSpec,
    config: &MeshConfig,
    sparse: bool,
    z0: usize,
    slab: &mut [f64],
) -> SampleStats {
    let [nx, ny, _] = spec.dims;
    let chunk = config.chunk_size.max(1);
    let z1 = z0 + slab.len() / (nx * ny);
    let local = |x: usize, y: usize, z: usize| x + nx * (y + ny * (z - z0));

    let mut stats = SampleStats::default();
    let mut points = Vec::new();
    let mut targets = Vec::new();

    for y0 in (0..ny).step_by(chunk) {
        let y1 = (y0 + chunk).min(ny);
        for x0 in (0..nx).step_by(chunk) {
            let x1 = (x0 + chunk).min(nx);
            stats.blocks += 1;

            let lo = spec.point(x0, y0, z0);
            let hi = spec.point(x1 - 1, y1 - 1, z1 - 1);
            let skip = if sparse {
                far_from_surface(field, &lo, &hi, spec.step, config.iso_level)
            } else {
                None
            };

            for z in z0..z1 {
                for y in y0..y1 {
                    for x in x0..x1 {
                        match &skip {
                            Some(estimate) => slab[local(x, y, z)] = estimate.at(&spec.point(x, y, z)),
                            None => {
                                points.push(spec.point(x, y, z));
                                targets.push(local(x, y, z));
                            }
                        }
                    }
                }
            }
            if skip.is_some() {
                stats.skipped_blocks += 1;
            }
        }
    }

    stats.evaluated_points = points.len();
    for (target, value) in targets.into_iter().zip(field.evaluate_batch(&points)) {
        slab[target] = value;
    }
    stats
}

/// Stand-in values for a block proven to hold no surface
struct FarEstimate {
    center: Point3<f64>,
    /// Signed distance at the center, relative to the iso level
    distance: f64,
    iso_level: f64,
}

impl FarEstimate {
    /// Distance lower bound shrunk by the offset from the center, sign kept
    fn at(&self, p: &Point3<f64>) -> f64 {
        let magnitude = self.distance.abs() - (p - self.center).norm();
        self.iso_level + magnitude.copysign(self.distance)
    }
}

/// A block can be skipped when the surface is further from its center than
/// its half diagonal plus one cell diagonal, and all eight corners agree in
/// sign with the center. Neighbouring points one cell outside the block then
/// share that sign too, so no cell edge touching the block crosses the surface.
fn far_from_surface(
    field: &Sdf,
    lo: &Point3<f64>,
    hi: &Point3<f64>,
    step: f64,
    iso_level: f64,
) -> Option<FarEstimate> {
    let center = nalgebra::center(lo, hi);
    let radius = (hi - lo).norm() / 2.0;
    let margin = step * 3f64.sqrt();

    let distance = field.evaluate(&center) - iso_level;
    if !(distance.abs() > radius + margin) {
        return None;
    }

    let corners = [
        Point3::new(lo.x, lo.y, lo.z),
        Point3::new(hi.x, lo.y, lo.z),
        Point3::new(lo.x, hi.y, lo.z),
        Point3::new(hi.x, hi.y, lo.z),
        Point3::new(lo.x, lo.y, hi.z),
        Point3::new(hi.x, lo.y, hi.z),
        Point3::new(lo.x, hi.y, hi.z),
        Point3::new(hi.x, hi.y, hi.z),
    ];
    let agree = field
        .evaluate_batch(&corners)
        .into_iter()
        .all(|v| (v - iso_level) * distance > 0.0);

    agree.then_some(FarEstimate {
        center,
        distance,
        iso_level,
    })
}
