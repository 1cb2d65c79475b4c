// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! sdfkit
//!
//! Signed distance field modeling: build implicit solids from primitives,
//! booleans, transforms and modifiers, sample them on a grid, extract a
//! triangle mesh and write it as STL.
//!
//! ```no_run
//! use sdfkit::{cube, cylinder, orient, sphere, X, Y, Z};
//!
//! # fn main() -> sdfkit::SdfResult<()> {
//! let f = &sphere(1.0)? & &cube(0.75)?;
//! let c = cylinder(0.5)?;
//! let holes = &(&orient(&c, X)? | &orient(&c, Y)?) | &orient(&c, Z)?;
//! let part = &f - &holes;
//! sdfkit::save(&part, "part.stl", Some(0.02))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod field;
pub mod geometry;
pub mod io;
pub mod mesher;
pub mod utils;

pub use error::{SdfError, SdfResult};
pub use field::ops::*;
pub use field::{Field, NodeKind, Sdf};
pub use geometry::{analyze, BoundingBox, GeometryStats, Mesh};
pub use io::{export_stl, import_scene_file, parse_scene};
pub use mesher::{GenerationStats, MeshConfig};
pub use utils::{degrees, radians, ORIGIN, PI, TAU, UP, X, Y, Z};

use std::path::Path;

/// Sample, extract and write `field` as binary STL.
///
/// Uses the default [`MeshConfig`], with `step` replacing the budget-derived
/// step when given. Use [`Sdf::save`] to pass a full configuration.
pub fn save(field: &Sdf, path: impl AsRef<Path>, step: Option<f64>) -> SdfResult<()> {
    let config = MeshConfig {
        step,
        ..MeshConfig::default()
    };
    field.save(path, &config)
}
