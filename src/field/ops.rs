// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Field constructors and the operator algebra
//!
//! Every constructor validates its parameters and returns a new field that
//! shares its operands; the operands stay usable afterwards.

use super::node::{BooleanOp, ModifierOp, NodeKind, Sdf, TransformOp};
use crate::error::{require_finite, require_non_negative, require_positive, SdfError, SdfResult};
use crate::geometry::{unit_direction, Primitive};
use crate::utils::math::{X, Z};
use nalgebra::{Matrix3, Point3, Unit, UnitQuaternion, Vector3};
use std::ops::{BitAnd, BitOr, Sub};

fn primitive(p: Primitive) -> Sdf {
    Sdf::from_kind(NodeKind::Primitive(p))
}

fn transform(child: &Sdf, op: TransformOp) -> Sdf {
    Sdf::from_kind(NodeKind::Transform {
        op,
        child: child.clone(),
    })
}

fn require_vector(name: &'static str, v: &Vector3<f64>) -> SdfResult<()> {
    for c in v.iter() {
        require_finite(name, *c)?;
    }
    Ok(())
}

// Primitives

pub fn sphere(radius: f64) -> SdfResult<Sdf> {
    Primitive::sphere(radius).map(primitive)
}

pub fn sphere_at(radius: f64, center: Point3<f64>) -> SdfResult<Sdf> {
    Primitive::sphere_at(radius, center).map(primitive)
}

/// Axis-aligned box centred on the origin, given its half extents
pub fn cuboid(half_extents: Vector3<f64>) -> SdfResult<Sdf> {
    Primitive::cuboid(half_extents).map(primitive)
}

/// Cube with the given half edge length
pub fn cube(half: f64) -> SdfResult<Sdf> {
    cuboid(Vector3::repeat(half))
}

pub fn rounded_box(half_extents: Vector3<f64>, radius: f64) -> SdfResult<Sdf> {
    Primitive::rounded_box(half_extents, radius).map(primitive)
}

/// Torus in the xy plane
pub fn torus(major: f64, minor: f64) -> SdfResult<Sdf> {
    Primitive::torus(major, minor).map(primitive)
}

pub fn capsule(a: Point3<f64>, b: Point3<f64>, radius: f64) -> SdfResult<Sdf> {
    Primitive::capsule(a, b, radius).map(primitive)
}

/// Infinite cylinder along Z
pub fn cylinder(radius: f64) -> SdfResult<Sdf> {
    Primitive::cylinder(radius).map(primitive)
}

/// Cylinder along Z of total `height`, centred on the origin
pub fn capped_cylinder(radius: f64, height: f64) -> SdfResult<Sdf> {
    Primitive::capped_cylinder(radius, height).map(primitive)
}

pub fn segment_cylinder(a: Point3<f64>, b: Point3<f64>, radius: f64) -> SdfResult<Sdf> {
    Primitive::segment_cylinder(a, b, radius).map(primitive)
}

/// Approximate: the returned distance is a bound, not exact
pub fn ellipsoid(radii: Vector3<f64>) -> SdfResult<Sdf> {
    Primitive::ellipsoid(radii).map(primitive)
}

/// Half space below the plane through `point`, `normal` pointing outside
pub fn plane(normal: Vector3<f64>, point: Point3<f64>) -> SdfResult<Sdf> {
    Primitive::plane(normal, point).map(primitive)
}

/// Region between optional axis-aligned bounds
pub fn slab(
    x: (Option<f64>, Option<f64>),
    y: (Option<f64>, Option<f64>),
    z: (Option<f64>, Option<f64>),
) -> SdfResult<Sdf> {
    Primitive::slab([x, y, z]).map(primitive)
}

/// Cone with half-angle `angle`, base on z = 0 and apex at z = `height`
pub fn cone(angle: f64, height: f64) -> SdfResult<Sdf> {
    Primitive::cone(angle, height).map(primitive)
}

pub fn rounded_cone(r1: f64, r2: f64, height: f64) -> SdfResult<Sdf> {
    Primitive::rounded_cone(r1, r2, height).map(primitive)
}

pub fn capped_cone(a: Point3<f64>, b: Point3<f64>, ra: f64, rb: f64) -> SdfResult<Sdf> {
    Primitive::capped_cone(a, b, ra, rb).map(primitive)
}

// Booleans

fn boolean(op: BooleanOp, a: &Sdf, b: &Sdf, k: f64) -> SdfResult<Sdf> {
    require_non_negative("k", k)?;
    Ok(Sdf::from_kind(NodeKind::Boolean {
        op,
        a: a.clone(),
        b: b.clone(),
        k,
    }))
}

/// min(a, b), smoothed over radius `k` when `k > 0`
pub fn union(a: &Sdf, b: &Sdf, k: f64) -> SdfResult<Sdf> {
    boolean(BooleanOp::Union, a, b, k)
}

/// max(a, b), smoothed over radius `k` when `k > 0`
pub fn intersection(a: &Sdf, b: &Sdf, k: f64) -> SdfResult<Sdf> {
    boolean(BooleanOp::Intersection, a, b, k)
}

/// max(a, -b), smoothed over radius `k` when `k > 0`
pub fn difference(a: &Sdf, b: &Sdf, k: f64) -> SdfResult<Sdf> {
    boolean(BooleanOp::Difference, a, b, k)
}

fn exact(op: BooleanOp, a: &Sdf, b: &Sdf) -> Sdf {
    Sdf::from_kind(NodeKind::Boolean {
        op,
        a: a.clone(),
        b: b.clone(),
        k: 0.0,
    })
}

impl BitOr for &Sdf {
    type Output = Sdf;

    fn bitor(self, rhs: &Sdf) -> Sdf {
        exact(BooleanOp::Union, self, rhs)
    }
}

impl BitAnd for &Sdf {
    type Output = Sdf;

    fn bitand(self, rhs: &Sdf) -> Sdf {
        exact(BooleanOp::Intersection, self, rhs)
    }
}

impl Sub for &Sdf {
    type Output = Sdf;

    fn sub(self, rhs: &Sdf) -> Sdf {
        exact(BooleanOp::Difference, self, rhs)
    }
}

impl BitOr for Sdf {
    type Output = Sdf;

    fn bitor(self, rhs: Sdf) -> Sdf {
        &self | &rhs
    }
}

impl BitAnd for Sdf {
    type Output = Sdf;

    fn bitand(self, rhs: Sdf) -> Sdf {
        &self & &rhs
    }
}

impl Sub for Sdf {
    type Output = Sdf;

    fn sub(self, rhs: Sdf) -> Sdf {
        &self - &rhs
    }
}

// Transforms

pub fn translate(sdf: &Sdf, offset: Vector3<f64>) -> SdfResult<Sdf> {
    require_vector("offset", &offset)?;
    Ok(transform(sdf, TransformOp::Translate(offset)))
}

/// Uniform scale; the distance stays exact
pub fn scale(sdf: &Sdf, factor: f64) -> SdfResult<Sdf> {
    require_positive("factor", factor)?;
    Ok(transform(sdf, TransformOp::Scale(factor)))
}

/// Per-axis scale. The distance is multiplied by the smallest factor, which
/// keeps it a lower bound but no longer exact. Negative factors mirror.
pub fn scale_xyz(sdf: &Sdf, factors: Vector3<f64>) -> SdfResult<Sdf> {
    require_vector("factors", &factors)?;
    if factors.iter().any(|f| *f == 0.0) {
        return Err(SdfError::DegenerateTransform("scale factor is zero"));
    }
    Ok(transform(sdf, TransformOp::ScaleXyz(factors)))
}

/// Rotate by `angle` radians about `axis` (right-handed)
pub fn rotate(sdf: &Sdf, angle: f64, axis: Vector3<f64>) -> SdfResult<Sdf> {
    require_finite("angle", angle)?;
    let axis = unit_direction(&axis, "rotation axis has zero length")?;
    let q = UnitQuaternion::from_axis_angle(&Unit::new_unchecked(axis), angle);
    Ok(transform(sdf, TransformOp::Rotate(q)))
}

/// Rotate so the child's +Z axis points along `direction`
pub fn orient(sdf: &Sdf, direction: Vector3<f64>) -> SdfResult<Sdf> {
    let dst = unit_direction(&direction, "orient direction has zero length")?;
    if (dst - Z).norm_squared() < 1e-10 {
        return Ok(sdf.clone());
    }
    if (dst + Z).norm_squared() < 1e-10 {
        return rotate(sdf, std::f64::consts::PI, X);
    }
    let axis = Z.cross(&dst);
    let angle = Z.dot(&dst).clamp(-1.0, 1.0).acos();
    rotate(sdf, angle, axis)
}

/// Shear mapping x' = x + xy*y + xz*z, y' = y + yz*z.
/// The distance is divided by the Lipschitz constant of the inverse map, so it
/// is a bound rather than exact.
pub fn shear(sdf: &Sdf, xy: f64, xz: f64, yz: f64) -> SdfResult<Sdf> {
    for (name, v) in [("xy", xy), ("xz", xz), ("yz", yz)] {
        require_finite(name, v)?;
    }
    let matrix = Matrix3::new(1.0, xy, xz, 0.0, 1.0, yz, 0.0, 0.0, 1.0);
    // Unit upper-triangular, always invertible
    let inverse = Matrix3::new(1.0, -xy, xy * yz - xz, 0.0, 1.0, -yz, 0.0, 0.0, 1.0);
    let lipschitz = inverse.singular_values().max();
    Ok(transform(
        sdf,
        TransformOp::Shear {
            matrix,
            inverse,
            lipschitz,
        },
    ))
}

/// Twist about Z by `k` radians per unit height
pub fn twist(sdf: &Sdf, k: f64) -> SdfResult<Sdf> {
    require_finite("k", k)?;
    Ok(transform(sdf, TransformOp::Twist(k)))
}

/// Bend in the xy plane by `k` radians per unit along X
pub fn bend(sdf: &Sdf, k: f64) -> SdfResult<Sdf> {
    require_finite("k", k)?;
    Ok(transform(sdf, TransformOp::Bend(k)))
}

/// Stretch the child by inserting `h` on each side of every axis
pub fn elongate(sdf: &Sdf, h: Vector3<f64>) -> SdfResult<Sdf> {
    for c in h.iter() {
        require_non_negative("h", *c)?;
    }
    Ok(transform(sdf, TransformOp::Elongate(h)))
}

/// Repeat the child on a lattice with the given spacing.
///
/// A zero spacing leaves that axis alone. `count` limits the copies to
/// `-count..=count` per axis; `None` repeats without end.
pub fn repeat(sdf: &Sdf, spacing: Vector3<f64>, count: Option<[u32; 3]>) -> SdfResult<Sdf> {
    for c in spacing.iter() {
        require_non_negative("spacing", *c)?;
    }
    if spacing.iter().all(|s| *s == 0.0) {
        return Err(SdfError::DegenerateTransform("repeat spacing is zero on every axis"));
    }
    let count = match count {
        Some([x, y, z]) => Vector3::new(x as f64, y as f64, z as f64),
        None => Vector3::repeat(f64::INFINITY),
    };
    Ok(transform(sdf, TransformOp::Repeat { spacing, count }))
}

// Modifiers

fn modifier(sdf: &Sdf, op: ModifierOp) -> Sdf {
    Sdf::from_kind(NodeKind::Modifier {
        op,
        child: sdf.clone(),
    })
}

/// Grow the surface outward by `r`
pub fn dilate(sdf: &Sdf, r: f64) -> SdfResult<Sdf> {
    require_finite("r", r)?;
    Ok(modifier(sdf, ModifierOp::Dilate(r)))
}

/// Shrink the surface inward by `r`
pub fn erode(sdf: &Sdf, r: f64) -> SdfResult<Sdf> {
    require_finite("r", r)?;
    Ok(modifier(sdf, ModifierOp::Dilate(-r)))
}

/// Hollow shell of the given half thickness around the surface
pub fn shell(sdf: &Sdf, thickness: f64) -> SdfResult<Sdf> {
    require_positive("thickness", thickness)?;
    Ok(modifier(sdf, ModifierOp::Shell(thickness)))
}

/// Linear mix of two fields, `t = 0` gives `a`, `t = 1` gives `b`
pub fn blend(a: &Sdf, b: &Sdf, t: f64) -> SdfResult<Sdf> {
    require_finite("t", t)?;
    if !(0.0..=1.0).contains(&t) {
        return Err(SdfError::InvalidParameter {
            name: "t",
            value: t,
            reason: "must lie in [0, 1]",
        });
    }
    Ok(Sdf::from_kind(NodeKind::Blend {
        a: a.clone(),
        b: b.clone(),
        t,
    }))
}

/// `count` copies of the child moved `offset` along X and spread evenly about Z
pub fn circular_array(sdf: &Sdf, count: usize, offset: f64) -> SdfResult<Sdf> {
    if count == 0 {
        return Err(SdfError::InvalidParameter {
            name: "count",
            value: 0.0,
            reason: "must be at least 1",
        });
    }
    require_finite("offset", offset)?;
    Ok(Sdf::from_kind(NodeKind::CircularArray {
        child: sdf.clone(),
        count,
        offset,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::Y;
    use approx::assert_relative_eq;

    #[test]
    fn test_operator_overloads_match_functions() {
        let a = sphere(1.0).unwrap();
        let b = translate(&cube(0.5).unwrap(), Vector3::new(0.8, 0.0, 0.0)).unwrap();
        let by_fn = union(&a, &b, 0.0).unwrap();
        let by_op = &a | &b;
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.2, 0.3, 0.0),
            Point3::new(-2.0, 0.0, 1.0),
        ] {
            assert_eq!(by_fn.evaluate(&p), by_op.evaluate(&p));
        }
    }

    #[test]
    fn test_negative_k_rejected() {
        let a = sphere(1.0).unwrap();
        assert!(matches!(
            union(&a, &a, -0.1),
            Err(SdfError::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_orient_aligned_returns_same_node() {
        let c = capped_cylinder(0.5, 2.0).unwrap();
        let o = orient(&c, Z * 3.0).unwrap();
        assert!(o.ptr_eq(&c));
    }

    #[test]
    fn test_orient_maps_z_onto_target() {
        let c = capped_cylinder(0.25, 2.0).unwrap();
        let along_x = orient(&c, X).unwrap();
        // The cylinder now extends along X
        assert!(along_x.evaluate(&Point3::new(0.9, 0.0, 0.0)) < 0.0);
        assert!(along_x.evaluate(&Point3::new(0.0, 0.0, 0.9)) > 0.0);

        let flipped = orient(&cone(0.5, 1.0).unwrap(), -Z).unwrap();
        assert!(flipped.evaluate(&Point3::new(0.0, 0.0, -0.9)) < 0.0);
        assert!(flipped.evaluate(&Point3::new(0.0, 0.0, 0.5)) > 0.0);

        assert!(orient(&c, Vector3::zeros()).is_err());
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let b = cuboid(Vector3::new(2.0, 0.5, 0.5)).unwrap();
        let r = rotate(&b, std::f64::consts::FRAC_PI_2, Z).unwrap();
        assert_relative_eq!(r.evaluate(&Point3::new(0.0, 1.5, 0.0)), -0.5, epsilon = 1e-12);
        assert!(rotate(&b, 1.0, Vector3::zeros()).is_err());
    }

    #[test]
    fn test_uniform_scale_exact() {
        let s = scale(&sphere(1.0).unwrap(), 2.0).unwrap();
        assert_relative_eq!(s.evaluate(&Point3::new(5.0, 0.0, 0.0)), 3.0);
        assert!(scale(&s, 0.0).is_err());
        assert!(scale(&s, -1.0).is_err());
    }

    #[test]
    fn test_scale_xyz_is_conservative() {
        let s = scale_xyz(&sphere(1.0).unwrap(), Vector3::new(2.0, 1.0, 1.0)).unwrap();
        assert!(s.evaluate(&Point3::new(1.9, 0.0, 0.0)) < 0.0);
        assert!(s.evaluate(&Point3::new(2.1, 0.0, 0.0)) > 0.0);
        // True distance from (0, 3, 0) is 2; the estimate must not exceed it
        assert!(s.evaluate(&Point3::new(0.0, 3.0, 0.0)) <= 2.0 + 1e-12);
        assert!(matches!(
            scale_xyz(&s, Vector3::new(1.0, 0.0, 1.0)),
            Err(SdfError::DegenerateTransform(_))
        ));
    }

    #[test]
    fn test_shear_is_bound() {
        let s = shear(&cube(1.0).unwrap(), 0.5, 0.0, 0.0).unwrap();
        // (1.4, 0.9, 0) maps back to (0.95, 0.9, 0)
        assert!(s.evaluate(&Point3::new(1.4, 0.9, 0.0)) < 0.0);
        assert!(s.evaluate(&Point3::new(3.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn test_modifiers() {
        let s = sphere(1.0).unwrap();
        let p = Point3::new(2.0, 0.0, 0.0);
        assert_relative_eq!(dilate(&s, 0.5).unwrap().evaluate(&p), 0.5);
        assert_relative_eq!(erode(&s, 0.5).unwrap().evaluate(&p), 1.5);
        let hollow = shell(&s, 0.1).unwrap();
        assert_relative_eq!(hollow.evaluate(&Point3::origin()), 0.9);
        assert!(shell(&s, 0.0).is_err());
    }

    #[test]
    fn test_blend_endpoints() {
        let a = sphere(1.0).unwrap();
        let b = cube(1.0).unwrap();
        let p = Point3::new(0.3, 2.0, -0.4);
        assert_eq!(blend(&a, &b, 0.0).unwrap().evaluate(&p), a.evaluate(&p));
        assert_eq!(blend(&a, &b, 1.0).unwrap().evaluate(&p), b.evaluate(&p));
        assert!(blend(&a, &b, 1.5).is_err());
    }

    #[test]
    fn test_repeat_and_array() {
        let s = sphere(0.25).unwrap();
        let row = repeat(&s, Vector3::new(1.0, 0.0, 0.0), Some([2, 0, 0])).unwrap();
        assert!(row.evaluate(&Point3::new(2.0, 0.0, 0.0)) < 0.0);
        assert!(row.evaluate(&Point3::new(3.0, 0.0, 0.0)) > 0.0);
        assert!(row.bounds().is_some());
        let endless = repeat(&s, Vector3::new(1.0, 1.0, 0.0), None).unwrap();
        assert!(endless.evaluate(&Point3::new(40.0, -7.0, 0.0)) < 0.0);
        assert!(endless.bounds().is_none());

        let ring = circular_array(&s, 4, 2.0).unwrap();
        for p in [
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(-2.0, 0.0, 0.0),
            Point3::new(0.0, -2.0, 0.0),
        ] {
            assert_relative_eq!(ring.evaluate(&p), -0.25, epsilon = 1e-12);
        }
        assert!(ring.evaluate(&Point3::origin()) > 0.0);
        assert!(circular_array(&s, 0, 1.0).is_err());
    }

    #[test]
    fn test_bounds_propagation() {
        let a = sphere(1.0).unwrap();
        let b = translate(&a, Vector3::new(3.0, 0.0, 0.0)).unwrap();
        let u = union(&a, &b, 0.0).unwrap().bounds().unwrap();
        assert_eq!(u.min.x, -1.0);
        assert_eq!(u.max.x, 4.0);

        let smooth = union(&a, &b, 0.5).unwrap().bounds().unwrap();
        assert_eq!(smooth.max.x, 4.5);

        let cut = difference(&a, &cylinder(0.2).unwrap(), 0.0).unwrap();
        assert_eq!(cut.bounds(), a.bounds());
        let clipped = intersection(&cylinder(0.2).unwrap(), &a, 0.0).unwrap();
        assert_eq!(clipped.bounds(), a.bounds());
        assert!(union(&a, &cylinder(0.2).unwrap(), 0.0).unwrap().bounds().is_none());

        let turned = rotate(&cuboid(Vector3::new(2.0, 1.0, 1.0)).unwrap(), std::f64::consts::FRAC_PI_2, Y)
            .unwrap()
            .bounds()
            .unwrap();
        assert_relative_eq!(turned.max.z, 2.0, epsilon = 1e-12);
        assert!(bend(&a, 0.3).unwrap().bounds().is_none());
    }
}
