// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding box utilities

use super::Vertex;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Box spanning `-half..half` around the origin
    pub fn symmetric(half: Vector3<f64>) -> Self {
        Self::new(Point3::from(-half), Point3::from(half))
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let mut bbox = Self::empty();
        for vertex in vertices {
            bbox.expand_to_include(&vertex.position);
        }
        bbox
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(point);
        }
        bbox
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// True when min exceeds max on any axis
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|c| c.is_finite())
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Overlap of two boxes; may be empty
    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.sup(&other.min), self.max.inf(&other.max))
    }

    /// Grow every face outward by `margin`
    pub fn expanded(&self, margin: f64) -> BoundingBox {
        let m = Vector3::repeat(margin);
        BoundingBox::new(self.min - m, self.max + m)
    }

    pub fn translated(&self, offset: &Vector3<f64>) -> BoundingBox {
        BoundingBox::new(self.min + offset, self.max + offset)
    }

    /// The eight corners, bit 0 selecting max.x, bit 1 max.y, bit 2 max.z
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let mut corners = [self.min; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Point3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            );
        }
        corners
    }

    /// Axis-aligned box enclosing this box after mapping each corner through `f`
    pub fn map_corners(&self, f: impl Fn(&Point3<f64>) -> Point3<f64>) -> BoundingBox {
        let mapped: Vec<Point3<f64>> = self.corners().iter().map(f).collect();
        BoundingBox::from_points(&mapped)
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.min - other.min).amax() < tolerance && (self.max - other.max).amax() < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        bbox.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
        bbox.expand_to_include(&Point3::new(-1.0, -2.0, -3.0));

        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.volume(), 48.0);
    }

    #[test]
    fn test_union_and_intersection() {
        let a = BoundingBox::symmetric(Vector3::repeat(1.0));
        let b = a.translated(&Vector3::new(1.5, 0.0, 0.0));

        let u = a.union(&b);
        assert_eq!(u.min.x, -1.0);
        assert_eq!(u.max.x, 2.5);

        let i = a.intersection(&b);
        assert!(!i.is_empty());
        assert_eq!(i.min.x, 0.5);
        assert_eq!(i.max.x, 1.0);

        let far = a.translated(&Vector3::new(5.0, 0.0, 0.0));
        assert!(a.intersection(&far).is_empty());
        assert_eq!(a.intersection(&far).volume(), 0.0);
    }

    #[test]
    fn test_map_corners_rotation() {
        let a = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        // Quarter turn about Z swaps the x and y extents
        let rotated = a.map_corners(|p| Point3::new(-p.y, p.x, p.z));
        assert!(rotated.approx_eq(
            &BoundingBox::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(0.0, 2.0, 1.0)),
            1e-12
        ));
    }
}
