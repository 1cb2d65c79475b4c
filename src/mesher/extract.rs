// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface extraction from a sample grid
//!
//! Cells are processed in z-slabs in parallel. Each slab numbers its vertices
//! locally by first appearance; a single-threaded merge then walks the slabs
//! in order and assigns global indices by grid edge. Because vertex positions
//! depend only on the edge, the output is the same for any slab size or
//! worker count.

use super::grid::SampleGrid;
use super::tables::{case_table, TETRAHEDRA};
use crate::geometry::{Mesh, Triangle, Vertex};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// Grid edge as the linear indices of its endpoints, lower first
pub type EdgeKey = (usize, usize);

/// Triangles of one slab over slab-local vertex numbers
struct SlabMesh {
    keys: Vec<EdgeKey>,
    positions: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
}

/// Extract the `iso_level` surface as a triangle mesh with zero normals.
///
/// `slab_layers` is the number of cell layers handled by one task.
pub fn extract(grid: &SampleGrid, iso_level: f64, slab_layers: usize) -> Mesh {
    let [nx, ny, nz] = grid.dims();
    if nx < 2 || ny < 2 || nz < 2 {
        return Mesh::new();
    }
    let layers = slab_layers.max(1);
    let cell_layers = nz - 1;
    let slab_count = cell_layers.div_ceil(layers);

    let slabs: Vec<SlabMesh> = (0..slab_count)
        .into_par_iter()
        .map(|s| {
            let z0 = s * layers;
            extract_slab(grid, iso_level, z0, (z0 + layers).min(cell_layers))
        })
        .collect();

    merge(slabs)
}

fn extract_slab(grid: &SampleGrid, iso_level: f64, z0: usize, z1: usize) -> SlabMesh {
    let spec = &grid.spec;
    let [nx, ny, _] = spec.dims;
    let table = case_table();

    let mut local: AHashMap<EdgeKey, usize> = AHashMap::new();
    let mut slab = SlabMesh {
        keys: Vec::new(),
        positions: Vec::new(),
        triangles: Vec::new(),
    };

    for z in z0..z1 {
        for y in 0..ny - 1 {
            for x in 0..nx - 1 {
                let mut corner = [0usize; 8];
                let mut inside = [false; 8];
                for c in 0..8 {
                    corner[c] = spec.index(x + (c & 1), y + ((c >> 1) & 1), z + ((c >> 2) & 1));
                    inside[c] = grid.values[corner[c]] < iso_level;
                }
                if inside.iter().all(|&i| i) || inside.iter().all(|&i| !i) {
                    continue;
                }

                for (t, tet) in TETRAHEDRA.iter().enumerate() {
                    let mut mask = 0usize;
                    for (i, &c) in tet.iter().enumerate() {
                        if inside[c as usize] {
                            mask |= 1 << i;
                        }
                    }

                    for tri in table[t][mask].triangles() {
                        let mut ids = [0usize; 3];
                        for (slot, edge) in tri.iter().enumerate() {
                            let a = corner[edge[0] as usize];
                            let b = corner[edge[1] as usize];
                            let key = if a < b { (a, b) } else { (b, a) };
                            ids[slot] = *local.entry(key).or_insert_with(|| {
                                slab.keys.push(key);
                                slab.positions.push(edge_point(grid, key, iso_level));
                                slab.keys.len() - 1
                            });
                        }
                        slab.triangles.push(ids);
                    }
                }
            }
        }
    }

    slab
}

/// Linear interpolation along a grid edge, always from the lower index
fn edge_point(grid: &SampleGrid, (a, b): EdgeKey, iso_level: f64) -> Point3<f64> {
    let pa = grid.spec.point_at(a);
    let pb = grid.spec.point_at(b);
    let va = grid.values[a] - iso_level;
    let vb = grid.values[b] - iso_level;
    let t = va / (va - vb);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    pa + (pb - pa) * t
}

fn merge(slabs: Vec<SlabMesh>) -> Mesh {
    let vertex_hint: usize = slabs.iter().map(|s| s.keys.len()).sum();
    let triangle_hint: usize = slabs.iter().map(|s| s.triangles.len()).sum();
    let mut mesh = Mesh::with_capacity(vertex_hint, triangle_hint);
    let mut global: AHashMap<EdgeKey, usize> = AHashMap::with_capacity(vertex_hint);

    for slab in slabs {
        let remap: Vec<usize> = slab
            .keys
            .iter()
            .zip(&slab.positions)
            .map(|(key, position)| {
                *global
                    .entry(*key)
                    .or_insert_with(|| mesh.add_vertex(Vertex::new(*position, Vector3::zeros())))
            })
            .collect();

        for tri in &slab.triangles {
            mesh.add_triangle(Triangle::new(tri.map(|i| remap[i])));
        }
    }

    mesh
}
