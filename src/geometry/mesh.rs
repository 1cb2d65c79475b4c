// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }
}

/// Triangle defined by three vertex indices, counter-clockwise seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// Unit facet normal from the winding; zero for degenerate triangles
    pub fn face_normal(&self, mesh: &Mesh) -> Vector3<f64> {
        let [a, b, c] = self.positions(mesh);
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    pub fn area(&self, mesh: &Mesh) -> f64 {
        let [a, b, c] = self.positions(mesh);
        (b - a).cross(&(c - a)).norm() * 0.5
    }

    pub fn positions(&self, mesh: &Mesh) -> [Point3<f64>; 3] {
        self.indices.map(|i| mesh.vertices[i].position)
    }

    /// True when two corners share an index
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Indices of triangles referencing a vertex that does not exist
    pub fn invalid_triangles(&self) -> Vec<usize> {
        let n = self.vertices.len();
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.indices.iter().any(|&i| i >= n))
            .map(|(i, _)| i)
            .collect()
    }

    /// Every triangle index lies within the vertex list
    pub fn validate(&self) -> bool {
        self.invalid_triangles().is_empty()
    }

    /// Recompute vertex normals from area-weighted face normals
    pub fn recompute_normals(&mut self) {
        let mut sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let [a, b, c] = triangle.positions(self);
            // Length is twice the area
            let n = (b - a).cross(&(c - a));
            for &idx in &triangle.indices {
                sums[idx] += n;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = sum.try_normalize(1e-300).unwrap_or_else(Vector3::zeros);
        }
    }
}
