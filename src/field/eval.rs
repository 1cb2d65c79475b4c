// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Field evaluation
//!
//! Single points and batches go through the same scalar helpers, so a batch
//! result is bit-identical to evaluating each point on its own.

use super::node::{BooleanOp, ModifierOp, NodeKind, Sdf, TransformOp};
use nalgebra::{Point3, Vector3};

impl Sdf {
    /// Signed distance at `p`: negative inside, zero on the surface, positive outside
    pub fn evaluate(&self, p: &Point3<f64>) -> f64 {
        match self.kind() {
            NodeKind::Primitive(prim) => prim.distance(p),
            NodeKind::Boolean { op, a, b, k } => combine(*op, a.evaluate(p), b.evaluate(p), *k),
            NodeKind::Transform { op, child } => {
                let local = op.to_local(p);
                op.finish(child.evaluate(&local))
            }
            NodeKind::Modifier { op, child } => op.apply(child.evaluate(p)),
            NodeKind::Blend { a, b, t } => mix(a.evaluate(p), b.evaluate(p), *t),
            NodeKind::CircularArray {
                child,
                count,
                offset,
            } => (0..*count).fold(f64::INFINITY, |acc, i| {
                acc.min(child.evaluate(&circular_local(p, i, *count, *offset)))
            }),
            NodeKind::Custom(field) => field.distance(p),
        }
    }

    /// Evaluate many points, recursing once per node over the whole batch
    pub fn evaluate_batch(&self, points: &[Point3<f64>]) -> Vec<f64> {
        match self.kind() {
            NodeKind::Primitive(prim) => points.iter().map(|p| prim.distance(p)).collect(),
            NodeKind::Boolean { op, a, b, k } => {
                let da = a.evaluate_batch(points);
                let db = b.evaluate_batch(points);
                da.into_iter()
                    .zip(db)
                    .map(|(x, y)| combine(*op, x, y, *k))
                    .collect()
            }
            NodeKind::Transform { op, child } => {
                let local: Vec<Point3<f64>> = points.iter().map(|p| op.to_local(p)).collect();
                child
                    .evaluate_batch(&local)
                    .into_iter()
                    .map(|d| op.finish(d))
                    .collect()
            }
            NodeKind::Modifier { op, child } => child
                .evaluate_batch(points)
                .into_iter()
                .map(|d| op.apply(d))
                .collect(),
            NodeKind::Blend { a, b, t } => {
                let da = a.evaluate_batch(points);
                let db = b.evaluate_batch(points);
                da.into_iter().zip(db).map(|(x, y)| mix(x, y, *t)).collect()
            }
            NodeKind::CircularArray {
                child,
                count,
                offset,
            } => {
                let mut out = vec![f64::INFINITY; points.len()];
                for i in 0..*count {
                    let local: Vec<Point3<f64>> = points
                        .iter()
                        .map(|p| circular_local(p, i, *count, *offset))
                        .collect();
                    for (acc, d) in out.iter_mut().zip(child.evaluate_batch(&local)) {
                        *acc = acc.min(d);
                    }
                }
                out
            }
            NodeKind::Custom(field) => points.iter().map(|p| field.distance(p)).collect(),
        }
    }

    /// Central-difference gradient with step `h`
    pub fn gradient(&self, p: &Point3<f64>, h: f64) -> Vector3<f64> {
        let dx = Vector3::new(h, 0.0, 0.0);
        let dy = Vector3::new(0.0, h, 0.0);
        let dz = Vector3::new(0.0, 0.0, h);
        Vector3::new(
            self.evaluate(&(p + dx)) - self.evaluate(&(p - dx)),
            self.evaluate(&(p + dy)) - self.evaluate(&(p - dy)),
            self.evaluate(&(p + dz)) - self.evaluate(&(p - dz)),
        ) / (2.0 * h)
    }

    /// Unit outward normal at `p`, zero where the gradient vanishes
    pub fn normal(&self, p: &Point3<f64>, h: f64) -> Vector3<f64> {
        self.gradient(p, h)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros)
    }
}

fn combine(op: BooleanOp, a: f64, b: f64, k: f64) -> f64 {
    match op {
        BooleanOp::Union if k > 0.0 => smooth_union(a, b, k),
        BooleanOp::Union => a.min(b),
        BooleanOp::Intersection if k > 0.0 => smooth_intersection(a, b, k),
        BooleanOp::Intersection => a.max(b),
        BooleanOp::Difference if k > 0.0 => smooth_difference(a, b, k),
        BooleanOp::Difference => a.max(-b),
    }
}

fn mix(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Polynomial smooth minimum
pub(crate) fn smooth_union(a: f64, b: f64, k: f64) -> f64 {
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    mix(b, a, h) - k * h * (1.0 - h)
}

pub(crate) fn smooth_intersection(a: f64, b: f64, k: f64) -> f64 {
    let h = (0.5 - 0.5 * (b - a) / k).clamp(0.0, 1.0);
    mix(b, a, h) + k * h * (1.0 - h)
}

pub(crate) fn smooth_difference(a: f64, b: f64, k: f64) -> f64 {
    let h = (0.5 - 0.5 * (a + b) / k).clamp(0.0, 1.0);
    mix(a, -b, h) + k * h * (1.0 - h)
}

/// Point in the frame of copy `i`
fn circular_local(p: &Point3<f64>, i: usize, count: usize, offset: f64) -> Point3<f64> {
    let angle = std::f64::consts::TAU * i as f64 / count as f64;
    let (s, c) = angle.sin_cos();
    // Inverse rotation about Z, then undo the radial offset
    Point3::new(c * p.x + s * p.y - offset, -s * p.x + c * p.y, p.z)
}

impl TransformOp {
    /// Map a world point into the child's frame
    pub(crate) fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        match self {
            TransformOp::Translate(v) => p - v,
            TransformOp::Scale(s) => p / *s,
            TransformOp::ScaleXyz(s) => Point3::from(p.coords.component_div(s)),
            TransformOp::Rotate(q) => q.inverse_transform_point(p),
            TransformOp::Shear { inverse, .. } => inverse * p,
            TransformOp::Twist(k) => {
                let (s, c) = (k * p.z).sin_cos();
                Point3::new(c * p.x - s * p.y, s * p.x + c * p.y, p.z)
            }
            TransformOp::Bend(k) => {
                let (s, c) = (k * p.x).sin_cos();
                Point3::new(c * p.x - s * p.y, s * p.x + c * p.y, p.z)
            }
            TransformOp::Elongate(h) => {
                let q = p.coords.abs() - h;
                Point3::new(
                    q.x.max(0.0).copysign(p.x),
                    q.y.max(0.0).copysign(p.y),
                    q.z.max(0.0).copysign(p.z),
                )
            }
            TransformOp::Repeat { spacing, count } => {
                let mut q = *p;
                for axis in 0..3 {
                    let s = spacing[axis];
                    if s > 0.0 {
                        let cell = (p[axis] / s).round().clamp(-count[axis], count[axis]);
                        q[axis] = p[axis] - cell * s;
                    }
                }
                q
            }
        }
    }

    /// Correct the child's distance for the change of metric
    pub(crate) fn finish(&self, d: f64) -> f64 {
        match self {
            TransformOp::Scale(s) => d * s,
            TransformOp::ScaleXyz(s) => d * s.abs().min(),
            TransformOp::Shear { lipschitz, .. } => d / lipschitz,
            _ => d,
        }
    }
}

impl ModifierOp {
    pub(crate) fn apply(&self, d: f64) -> f64 {
        match self {
            ModifierOp::Dilate(r) => d - r,
            ModifierOp::Shell(t) => d.abs() - t,
        }
    }
}
