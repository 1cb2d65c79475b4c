// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - primitives, mesh representation and analytics

mod primitives;
mod mesh;
mod bbox;
pub mod analytics;

pub use primitives::Primitive;
pub(crate) use primitives::unit_direction;
pub use mesh::{Mesh, Vertex, Triangle};
pub use bbox::BoundingBox;
pub use analytics::{analyze, GeometryStats};
