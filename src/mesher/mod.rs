// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Field to mesh pipeline: plan a grid, sample it, extract the surface

pub mod bounds;
pub mod config;
pub mod extract;
pub mod grid;
pub mod sampler;
pub mod tables;

pub use bounds::{estimate_bounds, plan_grid};
pub use config::MeshConfig;
pub use grid::{GridSpec, SampleGrid};
pub use sampler::SampleStats;

use crate::error::SdfResult;
use crate::field::Sdf;
use crate::geometry::Mesh;
use crate::io::stl;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Finite-difference step for normals, as a fraction of the grid step
const NORMAL_STEP_FACTOR: f64 = 1e-2;

/// What a generation run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationStats {
    pub dims: [usize; 3],
    pub step: f64,
    pub grid_points: usize,
    pub sampling: SampleStats,
    pub vertices: usize,
    pub triangles: usize,
    pub sample_time: Duration,
    pub extract_time: Duration,
}

/// Sample `field` and extract its surface
pub fn generate(field: &Sdf, config: &MeshConfig) -> SdfResult<(Mesh, GenerationStats)> {
    let Some(spec) = plan_grid(field, config)? else {
        return Ok((Mesh::new(), GenerationStats::default()));
    };

    if config.verbose {
        info!(dims = ?spec.dims, step = spec.step, origin = ?spec.origin, "Sampling grid");
    } else {
        debug!(dims = ?spec.dims, step = spec.step, origin = ?spec.origin, "Sampling grid");
    }

    let (mesh, stats) = in_pool(config.workers, || {
        let start = Instant::now();
        let (grid, sampling) = sampler::sample(field, spec, config);
        let sample_time = start.elapsed();

        let start = Instant::now();
        let mut mesh = extract::extract(&grid, config.iso_level, config.chunk_size);
        let h = spec.step * NORMAL_STEP_FACTOR;
        mesh.vertices
            .par_iter_mut()
            .for_each(|v| v.normal = field.normal(&v.position, h));
        let extract_time = start.elapsed();

        let stats = GenerationStats {
            dims: spec.dims,
            step: spec.step,
            grid_points: spec.point_count(),
            sampling,
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
            sample_time,
            extract_time,
        };
        (mesh, stats)
    });

    if config.verbose {
        info!(
            triangles = stats.triangles,
            blocks = stats.sampling.blocks,
            skipped = stats.sampling.skipped_blocks,
            elapsed = ?(stats.sample_time + stats.extract_time),
            "Generated mesh"
        );
    } else {
        debug!(
            triangles = stats.triangles,
            blocks = stats.sampling.blocks,
            skipped = stats.sampling.skipped_blocks,
            "Generated mesh"
        );
    }

    Ok((mesh, stats))
}

/// Run `f` on a dedicated pool of `workers` threads, or the global pool for 0
fn in_pool<R: Send>(workers: usize, f: impl FnOnce() -> R + Send) -> R {
    if workers == 0 {
        return f();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(f),
        Err(err) => {
            warn!(%err, workers, "Failed to build worker pool, using the global pool");
            f()
        }
    }
}

impl Sdf {
    /// Extract the surface as a mesh
    pub fn generate(&self, config: &MeshConfig) -> SdfResult<Mesh> {
        generate(self, config).map(|(mesh, _)| mesh)
    }

    pub fn generate_with_stats(&self, config: &MeshConfig) -> SdfResult<(Mesh, GenerationStats)> {
        generate(self, config)
    }

    /// Extract the surface and write it as binary STL
    pub fn save(&self, path: impl AsRef<Path>, config: &MeshConfig) -> SdfResult<()> {
        let mesh = self.generate(config)?;
        stl::export_stl(&mesh, path)
    }
}
