// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Field tree node definitions

use crate::geometry::{BoundingBox, Primitive};
use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A distance function that is not one of the built-in node kinds.
///
/// Implementations must be pure and callable from many threads at once.
/// `|distance|` should not overestimate the true Euclidean distance, otherwise
/// sparse sampling may skip blocks that contain surface.
pub trait Field: Send + Sync + fmt::Debug {
    fn distance(&self, p: &Point3<f64>) -> f64;

    /// Region containing the negative part of the field, if known
    fn bounds(&self) -> Option<BoundingBox> {
        None
    }
}

/// Boolean combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
}

/// Point-space transforms; the child is evaluated in its own local frame
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Translate(Vector3<f64>),
    /// Uniform scale, exact
    Scale(f64),
    /// Per-axis scale, distance multiplied by the smallest factor
    ScaleXyz(Vector3<f64>),
    /// Child evaluated at the inverse-rotated point
    Rotate(UnitQuaternion<f64>),
    /// Linear shear; distance divided by the spectral norm of the inverse
    Shear {
        matrix: Matrix3<f64>,
        inverse: Matrix3<f64>,
        lipschitz: f64,
    },
    /// Rotation of the xy plane by `k * z` radians
    Twist(f64),
    /// Rotation of the xy plane by `k * x` radians
    Bend(f64),
    Elongate(Vector3<f64>),
    /// Zero spacing leaves an axis untouched; infinite count repeats forever
    Repeat {
        spacing: Vector3<f64>,
        count: Vector3<f64>,
    },
}

/// Operations on the distance value itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModifierOp {
    /// d - r; erosion uses a negative radius
    Dilate(f64),
    /// |d| - thickness
    Shell(f64),
}

/// The closed set of node kinds
#[derive(Debug)]
pub enum NodeKind {
    Primitive(Primitive),
    Boolean {
        op: BooleanOp,
        a: Sdf,
        b: Sdf,
        /// Blend radius, zero for the exact operation
        k: f64,
    },
    Transform {
        op: TransformOp,
        child: Sdf,
    },
    Modifier {
        op: ModifierOp,
        child: Sdf,
    },
    /// Linear mix a * (1 - t) + b * t
    Blend {
        a: Sdf,
        b: Sdf,
        t: f64,
    },
    /// `count` copies of the child, shifted by `offset` along X and spaced evenly about Z
    CircularArray {
        child: Sdf,
        count: usize,
        offset: f64,
    },
    Custom(Arc<dyn Field>),
}

/// An immutable signed distance field.
///
/// Cloning is cheap: composite fields share their operands.
#[derive(Clone)]
pub struct Sdf {
    node: Arc<NodeKind>,
    bounds: Option<BoundingBox>,
    distance_bound: bool,
}

impl Sdf {
    pub(crate) fn from_kind(kind: NodeKind) -> Self {
        let bounds = kind.bounds();
        let distance_bound = kind.is_distance_bound();
        Self {
            node: Arc::new(kind),
            bounds,
            distance_bound,
        }
    }

    /// Wrap a user-supplied distance function
    pub fn custom(field: impl Field + 'static) -> Self {
        Self::from_kind(NodeKind::Custom(Arc::new(field)))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.node
    }

    /// Sampling hint; `None` when the field gives no finite bound
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Replace the sampling hint
    pub fn with_bounds(&self, bounds: BoundingBox) -> Self {
        Self {
            node: Arc::clone(&self.node),
            bounds: Some(bounds),
            distance_bound: self.distance_bound,
        }
    }

    /// True when `|value|` never exceeds the distance to the surface.
    ///
    /// Twist and bend warp the metric and repeat tears it at cell borders, so
    /// their values can overshoot and sparse sampling must not trust them.
    pub fn is_distance_bound(&self) -> bool {
        self.distance_bound
    }

    /// True when both handles refer to the same node
    pub fn ptr_eq(&self, other: &Sdf) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Number of nodes in the tree, shared operands counted once per use
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.depth())
            .max()
            .unwrap_or(0)
    }

    pub fn children(&self) -> Vec<&Sdf> {
        match self.kind() {
            NodeKind::Boolean { a, b, .. } | NodeKind::Blend { a, b, .. } => vec![a, b],
            NodeKind::Transform { child, .. }
            | NodeKind::Modifier { child, .. }
            | NodeKind::CircularArray { child, .. } => vec![child],
            NodeKind::Primitive(_) | NodeKind::Custom(_) => Vec::new(),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.kind().label(), indent = depth * 2)?;
        for child in self.children() {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.node, f)
    }
}

/// Indented tree, one node per line
impl fmt::Display for Sdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl NodeKind {
    /// Short one-line description
    pub fn label(&self) -> String {
        match self {
            NodeKind::Primitive(p) => format!("{:?}", p),
            NodeKind::Boolean { op, k, .. } => {
                let name = match op {
                    BooleanOp::Union => "union",
                    BooleanOp::Intersection => "intersection",
                    BooleanOp::Difference => "difference",
                };
                if *k > 0.0 {
                    format!("smooth {} k={}", name, k)
                } else {
                    name.to_string()
                }
            }
            NodeKind::Transform { op, .. } => match op {
                TransformOp::Translate(v) => format!("translate [{}, {}, {}]", v.x, v.y, v.z),
                TransformOp::Scale(s) => format!("scale {}", s),
                TransformOp::ScaleXyz(s) => format!("scale [{}, {}, {}]", s.x, s.y, s.z),
                TransformOp::Rotate(q) => match q.axis_angle() {
                    Some((axis, angle)) => {
                        format!("rotate {} about [{}, {}, {}]", angle, axis.x, axis.y, axis.z)
                    }
                    None => "rotate 0".to_string(),
                },
                TransformOp::Shear { matrix, .. } => format!(
                    "shear xy={} xz={} yz={}",
                    matrix[(0, 1)],
                    matrix[(0, 2)],
                    matrix[(1, 2)]
                ),
                TransformOp::Twist(k) => format!("twist {}", k),
                TransformOp::Bend(k) => format!("bend {}", k),
                TransformOp::Elongate(h) => format!("elongate [{}, {}, {}]", h.x, h.y, h.z),
                TransformOp::Repeat { spacing, count } => format!(
                    "repeat [{}, {}, {}] x [{}, {}, {}]",
                    spacing.x, spacing.y, spacing.z, count.x, count.y, count.z
                ),
            },
            NodeKind::Modifier { op, .. } => match op {
                ModifierOp::Dilate(r) if *r < 0.0 => format!("erode {}", -r),
                ModifierOp::Dilate(r) => format!("dilate {}", r),
                ModifierOp::Shell(t) => format!("shell {}", t),
            },
            NodeKind::Blend { t, .. } => format!("blend t={}", t),
            NodeKind::CircularArray { count, offset, .. } => {
                format!("circular_array count={} offset={}", count, offset)
            }
            NodeKind::Custom(field) => format!("custom {:?}", field),
        }
    }

    fn is_distance_bound(&self) -> bool {
        match self {
            NodeKind::Primitive(_) | NodeKind::Custom(_) => true,
            NodeKind::Boolean { a, b, .. } | NodeKind::Blend { a, b, .. } => {
                a.is_distance_bound() && b.is_distance_bound()
            }
            NodeKind::Transform { op, child } => match op {
                TransformOp::Twist(_) | TransformOp::Bend(_) | TransformOp::Repeat { .. } => false,
                _ => child.is_distance_bound(),
            },
            NodeKind::Modifier { child, .. } | NodeKind::CircularArray { child, .. } => {
                child.is_distance_bound()
            }
        }
    }

    /// Conservative box around the negative region, computed once at construction
    pub(crate) fn bounds(&self) -> Option<BoundingBox> {
        match self {
            NodeKind::Primitive(p) => p.bounds(),
            NodeKind::Boolean { op, a, b, k } => {
                let bbox = match op {
                    BooleanOp::Union => Some(a.bounds()?.union(&b.bounds()?)),
                    BooleanOp::Intersection => match (a.bounds(), b.bounds()) {
                        (Some(x), Some(y)) => Some(x.intersection(&y)),
                        (x, y) => x.or(y),
                    },
                    BooleanOp::Difference => a.bounds(),
                }?;
                if *k > 0.0 && !bbox.is_empty() {
                    Some(bbox.expanded(*k))
                } else {
                    Some(bbox)
                }
            }
            NodeKind::Transform { op, child } => transform_bounds(op, child.bounds()?),
            NodeKind::Modifier { op, child } => {
                let bbox = child.bounds()?;
                match op {
                    ModifierOp::Dilate(r) if *r > 0.0 => Some(bbox.expanded(*r)),
                    ModifierOp::Dilate(_) => Some(bbox),
                    ModifierOp::Shell(t) => Some(bbox.expanded(*t)),
                }
            }
            NodeKind::Blend { a, b, .. } => Some(a.bounds()?.union(&b.bounds()?)),
            NodeKind::CircularArray { child, offset, .. } => {
                let bbox = child.bounds()?;
                let r = radial_extent(&bbox.translated(&Vector3::new(*offset, 0.0, 0.0)));
                Some(BoundingBox::new(
                    Point3::new(-r, -r, bbox.min.z),
                    Point3::new(r, r, bbox.max.z),
                ))
            }
            NodeKind::Custom(field) => field.bounds(),
        }
    }
}

/// Largest distance from the Z axis over the box
fn radial_extent(bbox: &BoundingBox) -> f64 {
    let x = bbox.min.x.abs().max(bbox.max.x.abs());
    let y = bbox.min.y.abs().max(bbox.max.y.abs());
    x.hypot(y)
}

fn transform_bounds(op: &TransformOp, bbox: BoundingBox) -> Option<BoundingBox> {
    match op {
        TransformOp::Translate(v) => Some(bbox.translated(v)),
        TransformOp::Scale(s) => Some(bbox.map_corners(|p| p * *s)),
        TransformOp::ScaleXyz(s) => {
            Some(bbox.map_corners(|p| Point3::from(p.coords.component_mul(s))))
        }
        TransformOp::Rotate(q) => Some(bbox.map_corners(|p| q * p)),
        TransformOp::Shear { matrix, .. } => Some(bbox.map_corners(|p| matrix * p)),
        TransformOp::Twist(_) => {
            let r = radial_extent(&bbox);
            Some(BoundingBox::new(
                Point3::new(-r, -r, bbox.min.z),
                Point3::new(r, r, bbox.max.z),
            ))
        }
        TransformOp::Bend(_) => None,
        TransformOp::Elongate(h) => Some(BoundingBox::new(
            bbox.min.inf(&Point3::origin()) - h,
            bbox.max.sup(&Point3::origin()) + h,
        )),
        TransformOp::Repeat { spacing, count } => {
            let mut reach = Vector3::zeros();
            for axis in 0..3 {
                if spacing[axis] > 0.0 {
                    if !count[axis].is_finite() {
                        return None;
                    }
                    reach[axis] = spacing[axis] * count[axis];
                }
            }
            Some(BoundingBox::new(bbox.min - reach, bbox.max + reach))
        }
    }
}
