// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Regular grid of field samples

use crate::geometry::BoundingBox;
use nalgebra::Point3;

/// Placement of a sample grid: origin, spacing and point counts per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub origin: Point3<f64>,
    pub step: f64,
    pub dims: [usize; 3],
}

impl GridSpec {
    /// Grid covering `bounds` at `step`; the far corner may overshoot by under one step
    pub fn covering(bounds: &BoundingBox, step: f64) -> Self {
        let size = bounds.size();
        let n = |extent: f64| axis_points(extent, step) as usize;
        Self {
            origin: bounds.min,
            step,
            dims: [n(size.x), n(size.y), n(size.z)],
        }
    }

    /// Point count of [`GridSpec::covering`], in floating point so that
    /// oversized grids can be rejected before their dims are built
    pub fn covering_count(bounds: &BoundingBox, step: f64) -> f64 {
        bounds.size().iter().map(|e| axis_points(*e, step)).product()
    }

    pub fn point_count(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn cell_count(&self) -> usize {
        self.dims.iter().map(|d| d.saturating_sub(1)).product()
    }

    /// Linear index, x fastest
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    /// World position of a grid point
    #[inline]
    pub fn point(&self, x: usize, y: usize, z: usize) -> Point3<f64> {
        Point3::new(
            self.origin.x + x as f64 * self.step,
            self.origin.y + y as f64 * self.step,
            self.origin.z + z as f64 * self.step,
        )
    }

    /// World position of a linear index
    pub fn point_at(&self, index: usize) -> Point3<f64> {
        let x = index % self.dims[0];
        let y = (index / self.dims[0]) % self.dims[1];
        let z = index / (self.dims[0] * self.dims[1]);
        self.point(x, y, z)
    }

    /// Region actually covered by the grid points
    pub fn bounds(&self) -> BoundingBox {
        let [nx, ny, nz] = self.dims;
        BoundingBox::new(
            self.origin,
            self.point(nx.saturating_sub(1), ny.saturating_sub(1), nz.saturating_sub(1)),
        )
    }
}

fn axis_points(extent: f64, step: f64) -> f64 {
    (extent / step).ceil().max(1.0) + 1.0
}

/// Sampled scalar values over a [`GridSpec`]
#[derive(Debug, Clone)]
pub struct SampleGrid {
    pub spec: GridSpec,
    pub values: Vec<f64>,
}

impl SampleGrid {
    pub fn new(spec: GridSpec, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), spec.point_count());
        Self { spec, values }
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f64 {
        self.values[self.spec.index(x, y, z)]
    }

    pub fn dims(&self) -> [usize; 3] {
        self.spec.dims
    }

    pub fn step(&self) -> f64 {
        self.spec.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_covering_dims() {
        let bounds = BoundingBox::symmetric(Vector3::new(1.0, 0.5, 0.25));
        let spec = GridSpec::covering(&bounds, 0.25);
        assert_eq!(spec.dims, [9, 5, 3]);
        assert_eq!(spec.point(8, 4, 2), Point3::new(1.0, 0.5, 0.25));
        assert_eq!(spec.cell_count(), 8 * 4 * 2);
        assert_eq!(GridSpec::covering_count(&bounds, 0.25), spec.point_count() as f64);
    }

    #[test]
    fn test_covering_count_does_not_overflow() {
        let bounds = BoundingBox::symmetric(Vector3::repeat(1.0));
        let count = GridSpec::covering_count(&bounds, 1e-7);
        assert!(count.is_finite());
        assert!(count > usize::MAX as f64);
    }

    #[test]
    fn test_index_roundtrip() {
        let spec = GridSpec {
            origin: Point3::new(-1.0, 0.0, 2.0),
            step: 0.5,
            dims: [4, 3, 5],
        };
        let i = spec.index(3, 2, 4);
        assert_eq!(i, spec.point_count() - 1);
        assert_eq!(spec.point_at(i), spec.point(3, 2, 4));
        assert_eq!(spec.point_at(spec.index(1, 2, 3)), Point3::new(-0.5, 1.0, 3.5));
    }
}
