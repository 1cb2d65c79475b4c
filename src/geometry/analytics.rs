// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::Mesh;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume (signed; positive for outward-facing winding)
    pub volume: f64,
    /// Total surface area
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Mean vertex position [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Every edge is shared by exactly two triangles
    pub is_watertight: bool,
    /// Every directed edge appears once, so neighbouring windings agree
    pub is_consistently_oriented: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
            is_consistently_oriented: false,
        }
    }

    /// Pretty print statistics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              MESH ANALYTICS                              ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Volume:          {:>12.6}                            ║", self.volume);
        println!("║ Surface Area:    {:>12.6}                            ║", self.surface_area);
        println!(
            "║ Centroid:        ({:>7.3}, {:>7.3}, {:>7.3})            ║",
            self.centroid[0], self.centroid[1], self.centroid[2]
        );
        println!("║                                                          ║");
        println!("║ Bounding Box:                                            ║");
        println!(
            "║   Min: ({:>7.3}, {:>7.3}, {:>7.3})                      ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║   Max: ({:>7.3}, {:>7.3}, {:>7.3})                      ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!("║                                                          ║");
        println!("║ Vertices:        {:>10}                              ║", self.vertex_count);
        println!("║ Triangles:       {:>10}                              ║", self.triangle_count);
        println!(
            "║ Watertight:      {:>10}                              ║",
            if self.is_watertight { "Yes" } else { "No" }
        );
        println!(
            "║ Oriented:        {:>10}                              ║",
            if self.is_consistently_oriented { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    let vertex_count = mesh.vertices.len();
    let triangle_count = mesh.triangles.len();

    if vertex_count == 0 || triangle_count == 0 {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();

    GeometryStats {
        volume: signed_volume(mesh),
        surface_area: surface_area(mesh),
        bbox: [
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z,
        ],
        centroid: calculate_centroid(mesh),
        vertex_count,
        triangle_count,
        is_watertight: is_watertight(mesh),
        is_consistently_oriented: is_consistently_oriented(mesh),
    }
}

/// Sum of signed tetrahedron volumes against the origin
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let [v0, v1, v2] = triangle.positions(mesh);
            v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0
        })
        .sum()
}

/// Total surface area
pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles.iter().map(|t| t.area(mesh)).sum()
}

fn calculate_centroid(mesh: &Mesh) -> [f64; 3] {
    let sum = mesh
        .vertices
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.position.coords);
    let mean = sum / mesh.vertices.len() as f64;
    [mean.x, mean.y, mean.z]
}

/// Number of triangles using each undirected edge
pub fn edge_use_counts(mesh: &Mesh) -> AHashMap<(usize, usize), usize> {
    let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();

    for triangle in &mesh.triangles {
        let indices = &triangle.indices;
        for i in 0..3 {
            let v1 = indices[i];
            let v2 = indices[(i + 1) % 3];
            let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    edge_count
}

/// A mesh is watertight if every edge is shared by exactly 2 triangles
pub fn is_watertight(mesh: &Mesh) -> bool {
    !mesh.triangles.is_empty() && edge_use_counts(mesh).values().all(|&count| count == 2)
}

/// Each directed edge appears at most once
pub fn is_consistently_oriented(mesh: &Mesh) -> bool {
    let mut directed: AHashMap<(usize, usize), usize> = AHashMap::new();
    for triangle in &mesh.triangles {
        let indices = &triangle.indices;
        for i in 0..3 {
            *directed
                .entry((indices[i], indices[(i + 1) % 3]))
                .or_insert(0) += 1;
        }
    }
    directed.values().all(|&count| count == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Triangle, Vertex};
    use nalgebra::{Point3, Vector3};

    /// Unit cube as 12 outward-facing triangles over 8 shared vertices
    fn unit_cube() -> Mesh {
        let mut mesh = Mesh::new();
        for i in 0..8 {
            let p = Point3::new(
                (i & 1) as f64,
                ((i >> 1) & 1) as f64,
                ((i >> 2) & 1) as f64,
            );
            mesh.add_vertex(Vertex::new(p, Vector3::zeros()));
        }
        let faces = [
            [0, 2, 3, 1], // z-
            [4, 5, 7, 6], // z+
            [0, 1, 5, 4], // y-
            [2, 6, 7, 3], // y+
            [0, 4, 6, 2], // x-
            [1, 3, 7, 5], // x+
        ];
        for [a, b, c, d] in faces {
            mesh.add_triangle(Triangle::new([a, b, c]));
            mesh.add_triangle(Triangle::new([a, c, d]));
        }
        mesh
    }

    #[test]
    fn test_analyze_cube() {
        let stats = analyze(&unit_cube());

        assert!((stats.volume - 1.0).abs() < 1e-12);
        assert!((stats.surface_area - 6.0).abs() < 1e-12);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.triangle_count, 12);
        assert!(stats.is_watertight);
        assert!(stats.is_consistently_oriented);
        assert_eq!(stats.centroid, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_open_mesh_detected() {
        let mut mesh = unit_cube();
        mesh.triangles.pop();
        let stats = analyze(&mesh);
        assert!(!stats.is_watertight);
    }

    #[test]
    fn test_flipped_triangle_detected() {
        let mut mesh = unit_cube();
        mesh.triangles[0].indices.swap(1, 2);
        assert!(is_watertight(&mesh));
        assert!(!is_consistently_oriented(&mesh));
    }

    #[test]
    fn test_empty_mesh() {
        let stats = analyze(&Mesh::new());
        assert_eq!(stats.triangle_count, 0);
        assert!(!stats.is_watertight);
    }
}
