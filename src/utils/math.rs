// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities and named constants

use nalgebra::{Point3, Vector3};

pub const PI: f64 = std::f64::consts::PI;
pub const TAU: f64 = std::f64::consts::TAU;

pub const ORIGIN: Point3<f64> = Point3::new(0.0, 0.0, 0.0);
pub const X: Vector3<f64> = Vector3::new(1.0, 0.0, 0.0);
pub const Y: Vector3<f64> = Vector3::new(0.0, 1.0, 0.0);
pub const Z: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);
pub const UP: Vector3<f64> = Z;

/// Convert degrees to radians
pub fn radians(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees
pub fn degrees(rad: f64) -> f64 {
    rad * 180.0 / PI
}
