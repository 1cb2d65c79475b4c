// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sampling region and resolution
//!
//! The region comes from the config, else the field's bounds hint, else a
//! coarse iterative search for the surface.

use super::config::{MeshConfig, DEFAULT_STEP};
use super::grid::GridSpec;
use crate::error::{SdfError, SdfResult};
use crate::field::Sdf;
use crate::geometry::BoundingBox;
use nalgebra::Vector3;
use tracing::{debug, warn};

const PROBES: usize = 16;
const MAX_ROUNDS: usize = 32;
const START_HALF_EXTENT: f64 = 10.0;

/// Cells of padding added around a bounds hint
const HINT_PADDING: f64 = 2.0;

/// Locate the surface by probing a coarse grid and shrinking onto the
/// points near it. Starts from a 20-unit cube and doubles it while nothing
/// is found.
pub fn estimate_bounds(field: &Sdf) -> BoundingBox {
    let mut bounds = BoundingBox::symmetric(Vector3::repeat(START_HALF_EXTENT));
    let mut prev_threshold = -1.0;

    for round in 0..MAX_ROUNDS {
        let step = bounds.size() / (PROBES - 1) as f64;
        let threshold = step.norm() / 2.0;
        if (threshold - prev_threshold).abs() < 1e-10 {
            debug!(round, "Bounds estimate converged");
            break;
        }
        prev_threshold = threshold;

        let mut points = Vec::with_capacity(PROBES * PROBES * PROBES);
        for z in 0..PROBES {
            for y in 0..PROBES {
                for x in 0..PROBES {
                    points.push(bounds.min + step.component_mul(&Vector3::new(x as f64, y as f64, z as f64)));
                }
            }
        }
        let values = field.evaluate_batch(&points);

        let near = BoundingBox::from_points(
            points
                .iter()
                .zip(&values)
                .filter(|(_, v)| v.abs() <= threshold)
                .map(|(p, _)| p),
        );

        bounds = if near.is_empty() {
            let center = bounds.center();
            let size = bounds.size();
            BoundingBox::new(center - size, center + size)
        } else {
            let margin = step * 0.5;
            BoundingBox::new(near.min - margin, near.max + margin)
        };
    }

    bounds
}

/// Decide the grid for `field` under `config`.
///
/// Returns `None` when the field's bounds hint is empty, meaning there is
/// nothing to extract.
pub fn plan_grid(field: &Sdf, config: &MeshConfig) -> SdfResult<Option<GridSpec>> {
    config.validate()?;

    let (bounds, padded) = match (config.bounds, field.bounds()) {
        (Some(bounds), _) => (bounds, false),
        (None, Some(hint)) if hint.is_empty() => {
            debug!("Bounds hint is empty, nothing to sample");
            return Ok(None);
        }
        (None, Some(hint)) => (hint, true),
        (None, None) => {
            let estimated = estimate_bounds(field);
            debug!(min = ?estimated.min, max = ?estimated.max, "Estimated bounds");
            (estimated, false)
        }
    };

    if !bounds.is_finite() || bounds.is_empty() {
        return Err(SdfError::InvalidBounds(format!(
            "cannot sample region {:?} to {:?}",
            bounds.min, bounds.max
        )));
    }

    let mut step = resolve_step(&bounds, config);
    let bounds = if padded {
        bounds.expanded(step * HINT_PADDING)
    } else {
        bounds
    };

    // Counted in f64: a tiny step must coarsen, not overflow
    let budget = config.max_samples as f64;
    let requested = GridSpec::covering_count(&bounds, step);
    if requested > budget {
        let mut count = requested;
        while count > budget {
            step *= (count / budget).cbrt().max(1.0 + 1e-3);
            count = GridSpec::covering_count(&bounds, step);
        }
        warn!(
            requested,
            max_samples = config.max_samples,
            step,
            "Grid exceeds sample budget, coarsening step"
        );
    }

    let spec = GridSpec::covering(&bounds, step);
    Ok(Some(spec))
}

/// Explicit step, else one derived from the sample budget, else the default
fn resolve_step(bounds: &BoundingBox, config: &MeshConfig) -> f64 {
    if let Some(step) = config.step {
        return step;
    }
    let volume = bounds.volume();
    if volume > 0.0 && config.samples > 0 {
        let step = (volume / config.samples as f64).cbrt();
        if step.is_finite() && step > 0.0 {
            return step;
        }
    }
    DEFAULT_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ops::{cube, cylinder, intersection, sphere, translate};
    use nalgebra::Point3;

    #[test]
    fn test_estimate_finds_offset_sphere() {
        let s = translate(&sphere(1.0).unwrap(), Vector3::new(3.0, -2.0, 1.0)).unwrap();
        // Hide the hint so the estimator has to search
        let hidden = Sdf::custom(Probe(s));
        let bounds = estimate_bounds(&hidden);
        assert!(bounds.contains(&Point3::new(3.0, -2.0, 1.0)));
        assert!(bounds.contains(&Point3::new(3.9, -2.0, 1.0)));
        assert!(bounds.size().max() < 6.0);
    }

    #[derive(Debug)]
    struct Probe(Sdf);

    impl crate::field::Field for Probe {
        fn distance(&self, p: &Point3<f64>) -> f64 {
            self.0.evaluate(p)
        }
    }

    #[test]
    fn test_hint_is_padded() {
        let config = MeshConfig::with_step(0.1);
        let spec = plan_grid(&sphere(1.0).unwrap(), &config).unwrap().unwrap();
        assert!((spec.origin.x + 1.2).abs() < 1e-12);
        assert!((25..=26).contains(&spec.dims[0]));
    }

    #[test]
    fn test_step_from_samples() {
        let config = MeshConfig {
            samples: 1000,
            bounds: Some(BoundingBox::symmetric(Vector3::repeat(5.0))),
            ..MeshConfig::default()
        };
        let spec = plan_grid(&sphere(1.0).unwrap(), &config).unwrap().unwrap();
        assert!((spec.step - 1.0).abs() < 1e-12);
        assert_eq!(spec.dims, [11, 11, 11]);
    }

    #[test]
    fn test_budget_coarsens_step() {
        let config = MeshConfig {
            max_samples: 1000,
            ..MeshConfig::with_step(0.01)
        };
        let spec = plan_grid(&cube(1.0).unwrap(), &config).unwrap().unwrap();
        assert!(spec.point_count() <= 1000);
        assert!(spec.step > 0.01);
    }

    #[test]
    fn test_tiny_step_coarsens_instead_of_overflowing() {
        let config = MeshConfig {
            max_samples: 1 << 15,
            ..MeshConfig::with_step(1e-7).bounds(BoundingBox::symmetric(Vector3::repeat(1.0)))
        };
        let spec = plan_grid(&sphere(0.5).unwrap(), &config).unwrap().unwrap();
        assert!(spec.point_count() <= 1 << 15);
        assert!(spec.step > 1e-7);
    }

    #[test]
    fn test_empty_intersection_plans_nothing() {
        let a = sphere(1.0).unwrap();
        let b = translate(&a, Vector3::new(5.0, 0.0, 0.0)).unwrap();
        let empty = intersection(&a, &b, 0.0).unwrap();
        assert!(plan_grid(&empty, &MeshConfig::with_step(0.1)).unwrap().is_none());
    }

    #[test]
    fn test_unbounded_without_surface_region_uses_estimate() {
        // An infinite cylinder has no hint; the estimate still yields a finite region
        let spec = plan_grid(&cylinder(1.0).unwrap(), &MeshConfig::with_step(0.5))
            .unwrap()
            .unwrap();
        assert!(spec.bounds().is_finite());
    }
}
