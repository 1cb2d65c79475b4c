// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Primitive distance functions
//!
//! Every primitive is centred on the origin unless it takes explicit points.
//! Sphere, box, rounded box, torus, capsule, cylinders, plane, slab and the
//! capped cones return exact Euclidean distances; the ellipsoid is a bound.

use super::BoundingBox;
use crate::error::{require_finite, require_non_negative, require_positive, SdfError, SdfResult};
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Geometric primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Sphere {
        radius: f64,
        center: Point3<f64>,
    },
    Cuboid {
        half_extents: Vector3<f64>,
    },
    RoundedBox {
        half_extents: Vector3<f64>,
        radius: f64,
    },
    Torus {
        major: f64,
        minor: f64,
    },
    Capsule {
        a: Point3<f64>,
        b: Point3<f64>,
        radius: f64,
    },
    /// Infinite cylinder along Z
    Cylinder {
        radius: f64,
    },
    /// Cylinder along Z spanning `-half_height..half_height`
    CappedCylinder {
        radius: f64,
        half_height: f64,
    },
    /// Cylinder between two end points
    SegmentCylinder {
        a: Point3<f64>,
        b: Point3<f64>,
        radius: f64,
    },
    Ellipsoid {
        radii: Vector3<f64>,
    },
    Plane {
        normal: Vector3<f64>,
        point: Point3<f64>,
    },
    /// Axis-aligned region; unbounded sides hold infinities
    Slab {
        min: Vector3<f64>,
        max: Vector3<f64>,
    },
    /// Cone with its base disc on z = 0 and apex at z = height
    Cone {
        angle: f64,
        height: f64,
    },
    RoundedCone {
        r1: f64,
        r2: f64,
        height: f64,
    },
    CappedCone {
        a: Point3<f64>,
        b: Point3<f64>,
        ra: f64,
        rb: f64,
    },
}

impl Primitive {
    pub fn sphere(radius: f64) -> SdfResult<Self> {
        Self::sphere_at(radius, Point3::origin())
    }

    pub fn sphere_at(radius: f64, center: Point3<f64>) -> SdfResult<Self> {
        require_positive("radius", radius)?;
        require_point("center", &center)?;
        Ok(Self::Sphere { radius, center })
    }

    pub fn cuboid(half_extents: Vector3<f64>) -> SdfResult<Self> {
        require_extents("half_extents", &half_extents)?;
        Ok(Self::Cuboid { half_extents })
    }

    pub fn rounded_box(half_extents: Vector3<f64>, radius: f64) -> SdfResult<Self> {
        require_extents("half_extents", &half_extents)?;
        require_non_negative("radius", radius)?;
        if radius > half_extents.min() {
            return Err(SdfError::InvalidParameter {
                name: "radius",
                value: radius,
                reason: "must not exceed the smallest half extent",
            });
        }
        Ok(Self::RoundedBox {
            half_extents,
            radius,
        })
    }

    pub fn torus(major: f64, minor: f64) -> SdfResult<Self> {
        require_positive("major", major)?;
        require_positive("minor", minor)?;
        Ok(Self::Torus { major, minor })
    }

    pub fn capsule(a: Point3<f64>, b: Point3<f64>, radius: f64) -> SdfResult<Self> {
        require_point("a", &a)?;
        require_point("b", &b)?;
        require_positive("radius", radius)?;
        Ok(Self::Capsule { a, b, radius })
    }

    pub fn cylinder(radius: f64) -> SdfResult<Self> {
        require_positive("radius", radius)?;
        Ok(Self::Cylinder { radius })
    }

    pub fn capped_cylinder(radius: f64, height: f64) -> SdfResult<Self> {
        require_positive("radius", radius)?;
        require_positive("height", height)?;
        Ok(Self::CappedCylinder {
            radius,
            half_height: height * 0.5,
        })
    }

    pub fn segment_cylinder(a: Point3<f64>, b: Point3<f64>, radius: f64) -> SdfResult<Self> {
        require_point("a", &a)?;
        require_point("b", &b)?;
        require_positive("radius", radius)?;
        if (b - a).norm_squared() == 0.0 {
            return Err(SdfError::DegenerateTransform(
                "cylinder end points coincide",
            ));
        }
        Ok(Self::SegmentCylinder { a, b, radius })
    }

    pub fn ellipsoid(radii: Vector3<f64>) -> SdfResult<Self> {
        require_extents("radii", &radii)?;
        Ok(Self::Ellipsoid { radii })
    }

    pub fn plane(normal: Vector3<f64>, point: Point3<f64>) -> SdfResult<Self> {
        require_point("point", &point)?;
        let normal = unit_direction(&normal, "plane normal has zero length")?;
        Ok(Self::Plane { normal, point })
    }

    /// Bounds per axis as `(low, high)`; `None` leaves that side open
    pub fn slab(bounds: [(Option<f64>, Option<f64>); 3]) -> SdfResult<Self> {
        let mut min = Vector3::repeat(f64::NEG_INFINITY);
        let mut max = Vector3::repeat(f64::INFINITY);
        let mut any = false;
        for (axis, (lo, hi)) in bounds.iter().enumerate() {
            if let Some(lo) = lo {
                min[axis] = require_finite("slab bound", *lo)?;
                any = true;
            }
            if let Some(hi) = hi {
                max[axis] = require_finite("slab bound", *hi)?;
                any = true;
            }
            if min[axis] > max[axis] {
                return Err(SdfError::InvalidParameter {
                    name: "slab bound",
                    value: min[axis],
                    reason: "low bound exceeds high bound",
                });
            }
        }
        if !any {
            return Err(SdfError::DegenerateTransform("slab needs at least one bound"));
        }
        Ok(Self::Slab { min, max })
    }

    pub fn cone(angle: f64, height: f64) -> SdfResult<Self> {
        require_positive("angle", angle)?;
        if angle >= std::f64::consts::FRAC_PI_2 {
            return Err(SdfError::InvalidParameter {
                name: "angle",
                value: angle,
                reason: "must be below a right angle",
            });
        }
        require_positive("height", height)?;
        Ok(Self::Cone { angle, height })
    }

    pub fn rounded_cone(r1: f64, r2: f64, height: f64) -> SdfResult<Self> {
        require_positive("r1", r1)?;
        require_positive("r2", r2)?;
        require_positive("height", height)?;
        if (r1 - r2).abs() >= height {
            return Err(SdfError::InvalidParameter {
                name: "height",
                value: height,
                reason: "must exceed the radius difference",
            });
        }
        Ok(Self::RoundedCone { r1, r2, height })
    }

    pub fn capped_cone(a: Point3<f64>, b: Point3<f64>, ra: f64, rb: f64) -> SdfResult<Self> {
        require_point("a", &a)?;
        require_point("b", &b)?;
        require_non_negative("ra", ra)?;
        require_non_negative("rb", rb)?;
        if ra == 0.0 && rb == 0.0 {
            return Err(SdfError::DegenerateTransform("capped cone has no radius"));
        }
        if (b - a).norm_squared() == 0.0 {
            return Err(SdfError::DegenerateTransform("cone end points coincide"));
        }
        Ok(Self::CappedCone { a, b, ra, rb })
    }

    /// Signed distance from `p` to the surface
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        match self {
            Self::Sphere { radius, center } => (p - center).norm() - radius,
            Self::Cuboid { half_extents } => box_distance(&p.coords, half_extents),
            Self::RoundedBox {
                half_extents,
                radius,
            } => box_distance(&p.coords, &(half_extents - Vector3::repeat(*radius))) - radius,
            Self::Torus { major, minor } => {
                let q = Vector2::new(p.xy().coords.norm() - major, p.z);
                q.norm() - minor
            }
            Self::Capsule { a, b, radius } => {
                let pa = p - a;
                let ba = b - a;
                let denom = ba.norm_squared();
                let h = if denom > 0.0 {
                    (pa.dot(&ba) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (pa - ba * h).norm() - radius
            }
            Self::Cylinder { radius } => p.xy().coords.norm() - radius,
            Self::CappedCylinder {
                radius,
                half_height,
            } => {
                let d = Vector2::new(p.xy().coords.norm() - radius, p.z.abs() - half_height);
                d.x.max(d.y).min(0.0) + d.sup(&Vector2::zeros()).norm()
            }
            Self::SegmentCylinder { a, b, radius } => segment_cylinder_distance(p, a, b, *radius),
            Self::Ellipsoid { radii } => {
                let k0 = p.coords.component_div(radii).norm();
                let k1 = p.coords.component_div(&radii.component_mul(radii)).norm();
                if k1 == 0.0 {
                    -radii.min()
                } else {
                    k0 * (k0 - 1.0) / k1
                }
            }
            Self::Plane { normal, point } => (p - point).dot(normal),
            Self::Slab { min, max } => {
                let q = Vector3::new(
                    (min.x - p.x).max(p.x - max.x),
                    (min.y - p.y).max(p.y - max.y),
                    (min.z - p.z).max(p.z - max.z),
                );
                q.sup(&Vector3::zeros()).norm() + q.max().min(0.0)
            }
            Self::Cone { angle, height } => cone_distance(p, *angle, *height),
            Self::RoundedCone { r1, r2, height } => {
                let q = Vector2::new(p.xy().coords.norm(), p.z);
                let b = (r1 - r2) / height;
                let a = (1.0 - b * b).sqrt();
                let k = q.dot(&Vector2::new(-b, a));
                if k < 0.0 {
                    q.norm() - r1
                } else if k > a * height {
                    (q - Vector2::new(0.0, *height)).norm() - r2
                } else {
                    q.dot(&Vector2::new(a, b)) - r1
                }
            }
            Self::CappedCone { a, b, ra, rb } => capped_cone_distance(p, a, b, *ra, *rb),
        }
    }

    /// Conservative bounding box, `None` for unbounded shapes
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Self::Sphere { radius, center } => {
                Some(BoundingBox::symmetric(Vector3::repeat(*radius)).translated(&center.coords))
            }
            Self::Cuboid { half_extents } | Self::RoundedBox { half_extents, .. } => {
                Some(BoundingBox::symmetric(*half_extents))
            }
            Self::Torus { major, minor } => {
                let r = major + minor;
                Some(BoundingBox::symmetric(Vector3::new(r, r, *minor)))
            }
            Self::Capsule { a, b, radius } | Self::SegmentCylinder { a, b, radius } => {
                Some(BoundingBox::from_points([a, b]).expanded(*radius))
            }
            Self::Cylinder { .. } | Self::Plane { .. } => None,
            Self::CappedCylinder {
                radius,
                half_height,
            } => Some(BoundingBox::symmetric(Vector3::new(
                *radius,
                *radius,
                *half_height,
            ))),
            Self::Ellipsoid { radii } => Some(BoundingBox::symmetric(*radii)),
            Self::Slab { min, max } => {
                let bbox = BoundingBox::new(Point3::from(*min), Point3::from(*max));
                bbox.is_finite().then_some(bbox)
            }
            Self::Cone { angle, height } => {
                let r = height * angle.tan();
                Some(BoundingBox::new(
                    Point3::new(-r, -r, 0.0),
                    Point3::new(r, r, *height),
                ))
            }
            Self::RoundedCone { r1, r2, height } => {
                let r = r1.max(*r2);
                Some(BoundingBox::new(
                    Point3::new(-r, -r, -r1),
                    Point3::new(r, r, height + r2),
                ))
            }
            Self::CappedCone { a, b, ra, rb } => {
                Some(BoundingBox::from_points([a, b]).expanded(ra.max(*rb)))
            }
        }
    }
}

/// Exact box distance for half extents `h`
fn box_distance(p: &Vector3<f64>, h: &Vector3<f64>) -> f64 {
    let q = p.abs() - h;
    q.sup(&Vector3::zeros()).norm() + q.max().min(0.0)
}

fn segment_cylinder_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, radius: f64) -> f64 {
    let ba = b - a;
    let pa = p - a;
    let baba = ba.dot(&ba);
    let paba = pa.dot(&ba);
    let x = (pa * baba - ba * paba).norm() - radius * baba;
    let y = (paba - baba * 0.5).abs() - baba * 0.5;
    let x2 = x * x;
    let y2 = y * y * baba;
    let d = if x.max(y) < 0.0 {
        -x2.min(y2)
    } else {
        (if x > 0.0 { x2 } else { 0.0 }) + (if y > 0.0 { y2 } else { 0.0 })
    };
    (d.abs().sqrt() / baba).copysign(d)
}

fn cone_distance(p: &Point3<f64>, angle: f64, height: f64) -> f64 {
    // Profile in (radial, axial) with the apex at the origin, opening downward
    let q = Vector2::new(height * angle.tan(), -height);
    let w = Vector2::new(p.xy().coords.norm(), p.z - height);
    let a = w - q * (w.dot(&q) / q.dot(&q)).clamp(0.0, 1.0);
    let b = w - q.component_mul(&Vector2::new((w.x / q.x).clamp(0.0, 1.0), 1.0));
    let k = q.y.signum();
    let d = a.dot(&a).min(b.dot(&b));
    let s = (k * (w.x * q.y - w.y * q.x)).max(k * (w.y - q.y));
    d.sqrt() * s.signum()
}

fn capped_cone_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, ra: f64, rb: f64) -> f64 {
    let rba = rb - ra;
    let baba = (b - a).dot(&(b - a));
    let papa = (p - a).dot(&(p - a));
    let paba = (p - a).dot(&(b - a)) / baba;

    let x = (papa - paba * paba * baba).max(0.0).sqrt();

    let cax = (x - if paba < 0.5 { ra } else { rb }).max(0.0);
    let cay = (paba - 0.5).abs() - 0.5;

    let k = rba * rba + baba;
    let f = ((rba * (x - ra) + paba * baba) / k).clamp(0.0, 1.0);

    let cbx = x - ra - f * rba;
    let cby = paba - f;

    let s = if cbx < 0.0 && cay < 0.0 { -1.0 } else { 1.0 };

    s * (cax * cax + cay * cay * baba)
        .min(cbx * cbx + cby * cby * baba)
        .sqrt()
}

fn require_point(name: &'static str, p: &Point3<f64>) -> SdfResult<()> {
    for c in p.iter() {
        require_finite(name, *c)?;
    }
    Ok(())
}

fn require_extents(name: &'static str, v: &Vector3<f64>) -> SdfResult<()> {
    for c in v.iter() {
        require_positive(name, *c)?;
    }
    Ok(())
}

/// Normalise a direction, rejecting zero or non-finite vectors
pub(crate) fn unit_direction(v: &Vector3<f64>, reason: &'static str) -> SdfResult<Vector3<f64>> {
    let norm = v.norm();
    if !norm.is_finite() || norm < 1e-12 {
        return Err(SdfError::DegenerateTransform(reason));
    }
    Ok(v / norm)
}
